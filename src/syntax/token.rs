//! Tokens and the interface the parser engine pulls them through.

use crate::{
    ast::{Ast, Kind, Span},
    diagnostics::DlError,
};

/// A scanned token. `text` is set for identifiers and literals.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: Kind,
    pub text: Option<String>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: Kind, span: Span) -> Self {
        Self {
            kind,
            text: None,
            span,
        }
    }

    pub fn with_text(kind: Kind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: Some(text.into()),
            span,
        }
    }

    /// Wording used as the "found" half of a syntax error.
    pub fn describe(&self) -> String {
        match (&self.text, self.kind) {
            (Some(text), Kind::Id) => format!("identifier '{text}'"),
            (Some(text), Kind::Num) => format!("number {text}"),
            (Some(text), Kind::Char) => format!("character '{text}'"),
            (Some(text), Kind::Str) => format!("string {text:?}"),
            (Some(text), Kind::Symbol) => format!("symbol ${text}"),
            _ => self.kind.describe(),
        }
    }
}

impl From<&Token> for Ast {
    fn from(token: &Token) -> Self {
        match &token.text {
            Some(text) => Ast::leaf(token.kind, text.clone(), token.span),
            None => Ast::new(token.kind, token.span),
        }
    }
}

/// Anything that can hand out tokens one at a time.
///
/// After the input is exhausted a source keeps returning [`Kind::Eof`].
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Token, DlError>;
}
