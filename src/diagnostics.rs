//! Unified, `miette`-based diagnostics for the dl front end.
//!
//! Every stage (scanning, parsing, macro expansion, configuration and file
//! I/O) reports failure through [`DlError`]. Each variant carries an
//! [`ErrorContext`] with the span that caused it and, once the pipeline
//! attaches it, the named source so that `miette::Report` can render the
//! offending line.
//!
//! # Construction
//!
//! - Use the constructor functions (`DlError::lex`, `DlError::unexpected`,
//!   `DlError::arity`, ...) rather than building variants by hand.
//! - Stages that only know a span produce errors without a source; the
//!   [`crate::pipeline::Pipeline`] calls [`DlError::with_source`] on the way out.
//! - Attach extra guidance with [`DlError::with_help`]; it never overwrites
//!   help that an inner stage already supplied.

use std::{fmt, sync::Arc};

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::ast::Span;

pub type SourceArc = Arc<NamedSource<String>>;

/// Coarse classification of [`DlError`] variants, used by tests and the
/// YAML harness instead of matching on message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Malformed literals and unknown characters
    Lex,
    /// Token mismatches and forms with no matching alternative
    Syntax,
    /// Anything raised while defining or applying a macro
    Macro,
    /// Unreadable files and bad configuration
    Io,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Lex => "Lex",
            ErrorType::Syntax => "Syntax",
            ErrorType::Macro => "Macro",
            ErrorType::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A secondary label, e.g. the earlier definition of a duplicated macro.
#[derive(Debug, Clone)]
pub struct RelatedLabel {
    pub span: Span,
    pub label: String,
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    /// The source text the spans point into (if known yet).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
    /// Additional labeled spans in the same source.
    pub related: Vec<RelatedLabel>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_span(span: Span) -> Self {
        Self {
            span: Some(span),
            ..Self::default()
        }
    }

    /// Human-readable position of the primary span.
    pub fn location(&self) -> String {
        match self.span {
            Some(span) if span.line > 0 => span.to_string(),
            _ => "unknown location".to_string(),
        }
    }
}

/// Unified error type for every failure mode of the front end.
#[derive(Debug, Error)]
pub enum DlError {
    #[error("Lexical error at {}: {message}", .ctx.location())]
    Lex { message: String, ctx: ErrorContext },

    #[error("Syntax error at {}: expected {expected}, found {found}", .ctx.location())]
    UnexpectedToken {
        expected: String,
        found: String,
        ctx: ErrorContext,
    },

    #[error("Syntax error at {}: {message}", .ctx.location())]
    Syntax { message: String, ctx: ErrorContext },

    #[error("Syntax error at {}: expression nested too deeply (limit {limit})", .ctx.location())]
    NestingLimit { limit: usize, ctx: ErrorContext },

    #[error("Macro error at {}: unknown macro '{name}'", .ctx.location())]
    UnknownMacro { name: String, ctx: ErrorContext },

    #[error(
        "Macro error at {}: '{name}' expects {expected} argument(s) but {actual} were supplied",
        .ctx.location()
    )]
    MacroArity {
        name: String,
        expected: usize,
        actual: usize,
        ctx: ErrorContext,
    },

    #[error("Macro error at {}: '{name}' is already defined", .ctx.location())]
    DuplicateMacro { name: String, ctx: ErrorContext },

    #[error("Malformed macro definition at {}: {message}", .ctx.location())]
    MalformedMacro { message: String, ctx: ErrorContext },

    #[error(
        "Macro error at {}: expansion of '{name}' exceeded the depth limit of {limit}",
        .ctx.location()
    )]
    RecursionLimit {
        name: String,
        limit: usize,
        ctx: ErrorContext,
    },

    #[error("Invalid configuration: {message}")]
    Config { message: String, ctx: ErrorContext },

    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl DlError {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        DlError::Lex {
            message: message.into(),
            ctx: ErrorContext::with_span(span),
        }
    }

    pub fn unexpected(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        DlError::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            ctx: ErrorContext::with_span(span),
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        DlError::Syntax {
            message: message.into(),
            ctx: ErrorContext::with_span(span),
        }
    }

    pub fn nesting_limit(limit: usize, span: Span) -> Self {
        DlError::NestingLimit {
            limit,
            ctx: ErrorContext::with_span(span),
        }
    }

    pub fn unknown_macro(name: impl Into<String>, span: Span) -> Self {
        DlError::UnknownMacro {
            name: name.into(),
            ctx: ErrorContext::with_span(span),
        }
    }

    pub fn arity(name: impl Into<String>, expected: usize, actual: usize, span: Span) -> Self {
        DlError::MacroArity {
            name: name.into(),
            expected,
            actual,
            ctx: ErrorContext::with_span(span),
        }
    }

    /// `previous` is the span of the definition that is already registered.
    pub fn duplicate_macro(name: impl Into<String>, span: Span, previous: Span) -> Self {
        let mut ctx = ErrorContext::with_span(span);
        ctx.related.push(RelatedLabel {
            span: previous,
            label: "first defined here".to_string(),
        });
        DlError::DuplicateMacro {
            name: name.into(),
            ctx,
        }
    }

    pub fn malformed_macro(message: impl Into<String>, span: Span) -> Self {
        DlError::MalformedMacro {
            message: message.into(),
            ctx: ErrorContext::with_span(span),
        }
    }

    pub fn recursion_limit(name: impl Into<String>, limit: usize, span: Span) -> Self {
        DlError::RecursionLimit {
            name: name.into(),
            limit,
            ctx: ErrorContext::with_span(span),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        DlError::Config {
            message: message.into(),
            ctx: ErrorContext::none(),
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        DlError::Io {
            message: message.into(),
            ctx: ErrorContext::none(),
            source: Some(source),
        }
    }

    fn ctx(&self) -> &ErrorContext {
        match self {
            DlError::Lex { ctx, .. }
            | DlError::UnexpectedToken { ctx, .. }
            | DlError::Syntax { ctx, .. }
            | DlError::NestingLimit { ctx, .. }
            | DlError::UnknownMacro { ctx, .. }
            | DlError::MacroArity { ctx, .. }
            | DlError::DuplicateMacro { ctx, .. }
            | DlError::MalformedMacro { ctx, .. }
            | DlError::RecursionLimit { ctx, .. }
            | DlError::Config { ctx, .. }
            | DlError::Io { ctx, .. } => ctx,
        }
    }

    fn ctx_mut(&mut self) -> &mut ErrorContext {
        match self {
            DlError::Lex { ctx, .. }
            | DlError::UnexpectedToken { ctx, .. }
            | DlError::Syntax { ctx, .. }
            | DlError::NestingLimit { ctx, .. }
            | DlError::UnknownMacro { ctx, .. }
            | DlError::MacroArity { ctx, .. }
            | DlError::DuplicateMacro { ctx, .. }
            | DlError::MalformedMacro { ctx, .. }
            | DlError::RecursionLimit { ctx, .. }
            | DlError::Config { ctx, .. }
            | DlError::Io { ctx, .. } => ctx,
        }
    }

    /// Returns the type-safe error classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            DlError::Lex { .. } => ErrorType::Lex,
            DlError::UnexpectedToken { .. }
            | DlError::Syntax { .. }
            | DlError::NestingLimit { .. } => ErrorType::Syntax,
            DlError::UnknownMacro { .. }
            | DlError::MacroArity { .. }
            | DlError::DuplicateMacro { .. }
            | DlError::MalformedMacro { .. }
            | DlError::RecursionLimit { .. } => ErrorType::Macro,
            DlError::Config { .. } | DlError::Io { .. } => ErrorType::Io,
        }
    }

    /// Stable diagnostic code, also reported by `miette`.
    pub fn code_str(&self) -> &'static str {
        match self {
            DlError::Lex { .. } => "dl::lex",
            DlError::UnexpectedToken { .. }
            | DlError::Syntax { .. }
            | DlError::NestingLimit { .. } => "dl::syntax",
            DlError::UnknownMacro { .. } => "dl::macro::unknown",
            DlError::MacroArity { .. } => "dl::macro::arity",
            DlError::DuplicateMacro { .. } => "dl::macro::duplicate",
            DlError::MalformedMacro { .. } => "dl::macro::malformed",
            DlError::RecursionLimit { .. } => "dl::macro::recursion_limit",
            DlError::Config { .. } => "dl::config",
            DlError::Io { .. } => "dl::io",
        }
    }

    /// Whether a speculative parse may treat this error as "alternative
    /// did not match" and try the next one. Hitting the nesting limit is
    /// not: every alternative would hit it again.
    pub fn is_syntax(&self) -> bool {
        self.error_type() == ErrorType::Syntax && !matches!(self, DlError::NestingLimit { .. })
    }

    pub fn span(&self) -> Option<Span> {
        self.ctx().span
    }

    pub fn help_text(&self) -> Option<&str> {
        self.ctx().help.as_deref()
    }

    /// Attaches the source text, unless one is already present.
    pub fn with_source(mut self, source: &SourceArc) -> Self {
        let ctx = self.ctx_mut();
        if ctx.source.is_none() {
            ctx.source = Some(Arc::clone(source));
        }
        self
    }

    /// Attaches a help message, unless one is already present.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        let ctx = self.ctx_mut();
        if ctx.help.is_none() {
            ctx.help = Some(help.into());
        }
        self
    }

    fn label_text(&self) -> String {
        match self {
            DlError::Lex { message, .. }
            | DlError::Syntax { message, .. }
            | DlError::MalformedMacro { message, .. } => message.clone(),
            DlError::UnexpectedToken { expected, .. } => format!("expected {expected}"),
            DlError::NestingLimit { .. } => "nested too deeply".to_string(),
            DlError::UnknownMacro { .. } => "no macro with this name".to_string(),
            DlError::MacroArity { expected, .. } => format!("expects {expected} argument(s)"),
            DlError::DuplicateMacro { .. } => "redefined here".to_string(),
            DlError::RecursionLimit { .. } => "expanded from here".to_string(),
            DlError::Config { message, .. } | DlError::Io { message, .. } => message.clone(),
        }
    }
}

/// Empty spans are widened to one character, except at end of input.
fn label_len(span: Span, source_len: usize) -> usize {
    if span.end > span.start {
        span.end - span.start
    } else if span.start < source_len {
        1
    } else {
        0
    }
}

impl Diagnostic for DlError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code_str()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.ctx();
        // Spans without a source cannot be rendered.
        let source_len = ctx.source.as_ref()?.inner().len();

        let mut labels = Vec::new();
        if let Some(span) = ctx.span {
            labels.push(LabeledSpan::new(
                Some(self.label_text()),
                span.start,
                label_len(span, source_len),
            ));
        }
        for rel in &ctx.related {
            labels.push(LabeledSpan::new(
                Some(rel.label.clone()),
                rel.span.start,
                label_len(rel.span, source_len),
            ));
        }
        if labels.is_empty() {
            None
        } else {
            Some(Box::new(labels.into_iter()))
        }
    }
}

/// Named source text of one compilation unit.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Convert to a `NamedSource` for use with miette error reporting.
    pub fn to_named_source(&self) -> SourceArc {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

/// Converts a source string into a [`SourceArc`] named `name`.
pub fn to_error_source(name: &str, source: &str) -> SourceArc {
    Arc::new(NamedSource::new(name, source.to_string()))
}
