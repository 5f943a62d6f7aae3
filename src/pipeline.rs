use std::path::Path;

use miette::Report;

use crate::{
    ast::Ast,
    config::FrontendConfig,
    diagnostics::{DlError, SourceContext},
    macros::{expand_with_trace, ExpansionStep, MacroRegistry},
    syntax::Parser,
};

// ============================================================================
// COMPILATION UNIT
// ============================================================================

/// Everything the front end produced for one source text.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// The program as parsed, before expansion.
    pub parsed: Ast,
    /// The program after macro expansion.
    pub expanded: Ast,
    pub registry: MacroRegistry,
    pub trace: Vec<ExpansionStep>,
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Parse → expand, with every error carrying its named source.
///
/// All entry points (CLI, YAML suites, tests) go through this type.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub config: FrontendConfig,
}

impl Pipeline {
    pub fn new(config: FrontendConfig) -> Self {
        Self { config }
    }

    /// Parses `source` without expanding it.
    pub fn parse_source(&self, source: &SourceContext) -> Result<(Ast, MacroRegistry), DlError> {
        let named = source.to_named_source();
        let mut parser = Parser::from_source(&source.content, &self.config);
        let program = parser
            .parse_program()
            .map_err(|err| err.with_source(&named))?;
        Ok((program, parser.into_registry()))
    }

    /// Parses and expands `source`.
    pub fn compile(&self, source: &SourceContext) -> Result<CompilationUnit, DlError> {
        let named = source.to_named_source();
        let (parsed, registry) = self.parse_source(source)?;
        let mut expanded = parsed.clone();
        let trace = expand_with_trace(&mut expanded, &registry, &self.config)
            .map_err(|err| err.with_source(&named))?;
        Ok(CompilationUnit {
            parsed,
            expanded,
            registry,
            trace,
        })
    }

    /// Convenience for in-memory text named `name`.
    pub fn compile_str(&self, name: &str, text: &str) -> Result<CompilationUnit, DlError> {
        self.compile(&SourceContext::from_file(name, text))
    }

    /// Reads a file with standardized error handling.
    pub fn read_file(path: &Path) -> Result<SourceContext, DlError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DlError::io(format!("cannot read '{}'", path.display()), e))?;
        Ok(SourceContext::from_file(path.display().to_string(), content))
    }
}

/// Prints a DlError with full miette diagnostics.
pub fn print_error(error: DlError) {
    let report = Report::new(error);
    eprintln!("{report:?}");
}
