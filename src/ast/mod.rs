//! AST module for the dl language
//!
//! A single node type, [`Ast`], tagged with a [`Kind`]. Nodes own their
//! children outright; `clone()` is a deep, independent copy, which is what
//! macro expansion relies on when it instantiates a template.

// ============================================================================
// IMPORTS
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

mod kind;

pub use kind::Kind;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Represents a span in the source code.
///
/// `start`/`end` are byte offsets; `line`/`column` are 1-based and point at
/// `start`. A zero line means the span was synthesized.
///
/// # Examples
///
/// ```rust
/// use dl::ast::Span;
/// let span = Span { start: 0, end: 5, line: 1, column: 1 };
/// assert_eq!(span.len(), 5);
/// assert_eq!(span.to_string(), "line 1, column 1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A node of the syntax tree.
///
/// `text` holds the payload of literal leaves (identifier name, number
/// digits, character, string contents, symbol name without `$`) and is
/// `None` for structural nodes.
///
/// # Examples
///
/// ```rust
/// use dl::ast::{Ast, Kind, Span};
/// let one = Ast::leaf(Kind::Num, "1", Span::default());
/// let two = Ast::leaf(Kind::Num, "2", Span::default());
/// let sum = Ast::with_children(Kind::Add, vec![one, two], Span::default());
/// assert_eq!(sum.pretty(), "(add 1 2)");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ast {
    kind: Kind,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Ast>,
    span: Span,
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Ast {
    /// A childless node without text.
    pub fn new(kind: Kind, span: Span) -> Self {
        Self {
            kind,
            text: None,
            children: Vec::new(),
            span,
        }
    }

    pub fn leaf(kind: Kind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: Some(text.into()),
            children: Vec::new(),
            span,
        }
    }

    pub fn with_children(kind: Kind, children: Vec<Ast>, span: Span) -> Self {
        Self {
            kind,
            text: None,
            children,
            span,
        }
    }

    /// Appends `child` as the last child.
    pub fn add_child(&mut self, child: Ast) {
        self.children.push(child);
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Ast] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Ast> {
        &mut self.children
    }

    pub fn child(&self, index: usize) -> Option<&Ast> {
        self.children.get(index)
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    /// True for an `id` leaf named `name`.
    pub fn is_id(&self, name: &str) -> bool {
        self.kind == Kind::Id && self.text.as_deref() == Some(name)
    }

    /// Renders the tree as an s-expression.
    ///
    /// Literal leaves print as their source spelling, every other node as
    /// `(kind child ...)`.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out);
        out
    }

    fn write_pretty(&self, out: &mut String) {
        if let Some(text) = &self.text {
            match self.kind {
                Kind::Char => {
                    out.push('\'');
                    out.push_str(text);
                    out.push('\'');
                }
                Kind::Str => out.push_str(&format!("{text:?}")),
                Kind::Symbol => {
                    out.push('$');
                    out.push_str(text);
                }
                _ => out.push_str(text),
            }
            if self.children.is_empty() {
                return;
            }
        }
        out.push('(');
        out.push_str(self.kind.as_str());
        for child in &self.children {
            out.push(' ');
            child.write_pretty(out);
        }
        out.push(')');
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}
