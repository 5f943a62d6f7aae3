//! The expansion pass.
//!
//! Runs after a whole unit is parsed. [`MacroProcessor`] visits the program
//! in post-order, so the arguments of a use site are already expanded when
//! the site itself is rewritten. Each expansion is walked again to pick up
//! macro uses the template introduced, bounded by
//! [`FrontendConfig::max_expansion_depth`].

use log::debug;

use crate::{
    ast::{Ast, Kind},
    config::FrontendConfig,
    diagnostics::DlError,
    macros::MacroRegistry,
    traverse::{walk, Visitor},
};

/// A single macro expansion step, for traceability.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionStep {
    pub macro_name: String,
    /// Nesting level; 0 for sites written in the source.
    pub depth: usize,
    /// The use site before expansion.
    pub input: Ast,
    /// The tree written over the site.
    pub output: Ast,
}

/// Visitor that rewrites macro use sites in place.
pub struct MacroProcessor<'r> {
    registry: &'r MacroRegistry,
    max_depth: usize,
    strip_definitions: bool,
    /// Current nesting of expansions.
    depth: usize,
    /// Number of enclosing `macro` definitions.
    in_definition: usize,
    trace: Option<Vec<ExpansionStep>>,
}

impl<'r> MacroProcessor<'r> {
    pub fn new(registry: &'r MacroRegistry, config: &FrontendConfig) -> Self {
        Self {
            registry,
            max_depth: config.max_expansion_depth,
            strip_definitions: config.strip_definitions,
            depth: 0,
            in_definition: 0,
            trace: None,
        }
    }

    /// Records an [`ExpansionStep`] for every rewritten site.
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    pub fn into_trace(self) -> Vec<ExpansionStep> {
        self.trace.unwrap_or_default()
    }

    /// Name of the macro a site refers to, and whether it used `%`.
    fn site_name(node: &Ast) -> Option<(&str, bool)> {
        let sigil = match node.kind() {
            Kind::Apply => false,
            Kind::MacroApply => true,
            _ => return None,
        };
        let callee = node.child(0).filter(|c| c.kind() == Kind::Id)?;
        Some((callee.text()?, sigil))
    }

    fn expand_site(&mut self, node: &mut Ast) -> Result<(), DlError> {
        let Some((name, sigil)) = Self::site_name(node) else {
            return Ok(());
        };
        let registry = self.registry;
        let Some(definition) = registry.get(name) else {
            if sigil {
                return Err(DlError::unknown_macro(name, node.span())
                    .with_help("define it with `macro name (params) terminator (pattern) body end`"));
            }
            return Ok(());
        };
        if self.depth >= self.max_depth {
            return Err(DlError::recursion_limit(name, self.max_depth, node.span()));
        }

        let actuals = node
            .child(1)
            .map(|args| args.children().to_vec())
            .unwrap_or_default();
        let mut expansion = definition.apply(actuals, node.span())?;
        debug!("expanding '{}' at {} (depth {})", definition.name(), node.span(), self.depth);

        self.depth += 1;
        let nested = walk(&mut expansion, self);
        self.depth -= 1;
        nested?;

        if let Some(trace) = self.trace.as_mut() {
            trace.push(ExpansionStep {
                macro_name: definition.name().to_string(),
                depth: self.depth,
                input: node.clone(),
                output: expansion.clone(),
            });
        }
        *node = expansion;
        Ok(())
    }
}

/// Removes `macro` definitions from the statement sequence owned by `node`.
fn strip_definitions(node: &mut Ast) {
    let sequence = match node.kind() {
        Kind::Program | Kind::Block => Some(node),
        Kind::Begin => node.children_mut().get_mut(0),
        Kind::Lambda => node.children_mut().get_mut(1),
        _ => None,
    };
    if let Some(sequence) = sequence {
        sequence.children_mut().retain(|child| child.kind() != Kind::Macro);
    }
}

impl Visitor for MacroProcessor<'_> {
    type Error = DlError;

    fn before_node(&mut self, node: &mut Ast, _depth: usize) -> Result<(), DlError> {
        if node.kind() == Kind::Macro {
            self.in_definition += 1;
        }
        Ok(())
    }

    fn after_children(&mut self, node: &mut Ast, _depth: usize) -> Result<(), DlError> {
        if self.strip_definitions && self.in_definition == 0 {
            strip_definitions(node);
        }
        Ok(())
    }

    fn after_node(&mut self, node: &mut Ast, _depth: usize) -> Result<(), DlError> {
        if node.kind() == Kind::Macro {
            self.in_definition -= 1;
            return Ok(());
        }
        if self.in_definition > 0 {
            return Ok(());
        }
        self.expand_site(node)
    }
}

/// Expands every macro use site in `program` in place.
pub fn expand(
    program: &mut Ast,
    registry: &MacroRegistry,
    config: &FrontendConfig,
) -> Result<(), DlError> {
    let mut processor = MacroProcessor::new(registry, config);
    walk(program, &mut processor)
}

/// Like [`expand`], also returning every expansion that was performed.
pub fn expand_with_trace(
    program: &mut Ast,
    registry: &MacroRegistry,
    config: &FrontendConfig,
) -> Result<Vec<ExpansionStep>, DlError> {
    let mut processor = MacroProcessor::new(registry, config).with_trace();
    walk(program, &mut processor)?;
    Ok(processor.into_trace())
}
