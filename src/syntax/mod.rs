//! Scanning and parsing.
//!
//! - `token`: [`Token`] and the [`TokenSource`] interface
//! - `lexer`: [`Lexer`], the scanner for dl source text
//! - `engine`: [`TokenBuffer`] lookahead with mark/rewind and speculation
//! - `parser`: [`Parser`], the dl grammar on top of the engine

pub mod engine;
pub mod lexer;
pub mod parser;
pub mod token;

pub use engine::{RuleId, Speculate, TokenBuffer};
pub use lexer::Lexer;
pub use parser::{CoreForm, Parser};
pub use token::{Token, TokenSource};

use crate::{ast::Ast, config::FrontendConfig, diagnostics::DlError, macros::MacroRegistry};

/// Parses `source` with the default configuration, returning the program
/// tree and the macros it defines. No expansion is performed.
pub fn parse_program(source: &str) -> Result<(Ast, MacroRegistry), DlError> {
    parse_with_config(source, &FrontendConfig::default())
}

pub fn parse_with_config(
    source: &str,
    config: &FrontendConfig,
) -> Result<(Ast, MacroRegistry), DlError> {
    let mut parser = Parser::from_source(source, config);
    let program = parser.parse_program()?;
    Ok((program, parser.into_registry()))
}
