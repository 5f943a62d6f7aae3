//! dl: lexer, backtracking parser and syntactic macro expander for a small
//! Lisp-family language.
//!
//! Source text flows through [`syntax`] (lexer and parser, which also
//! registers macro definitions) into an [`Ast`], and then through
//! [`macros`], which replaces every macro use site with its substituted
//! template. [`pipeline::Pipeline`] runs both steps.

pub use crate::ast::{Ast, Kind, Span};
pub use crate::diagnostics::{DlError, ErrorContext, ErrorType};

pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod macros;
pub mod pipeline;
pub mod syntax;
pub mod test_harness;
pub mod traverse;
