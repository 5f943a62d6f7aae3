//! The closed tag set shared by tokens and AST nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag of a token or tree node.
///
/// Tokens and nodes share one enum so that a leaf node can be built directly
/// from the token it came from. Punctuation kinds and [`Kind::Term`] /
/// [`Kind::Eof`] only ever appear on tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    // Data
    Id,
    Num,
    Char,
    Str,
    Symbol,
    List,
    Vector,
    Function,
    Map,

    // Punctuation
    LBrack,
    RBrack,
    LPar,
    RPar,
    LBrace,
    RBrace,
    Comma,
    Pipe,
    At,
    Quote,
    MacroSigil,

    // Operators
    And,
    Or,
    Not,
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Assign,
    Memb,
    Sep,

    // Structural
    Program,
    Block,
    Apply,
    MacroApply,
    Params,
    ExpList,
    IdList,
    Pattern,
    Define,
    Lambda,
    Begin,
    If,
    Macro,
    Transform,

    /// The `end` keyword closing every core form.
    Term,
    Eof,
}

impl Kind {
    /// Name of the kind as it appears in tree dumps and test expectations.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Id => "id",
            Kind::Num => "num",
            Kind::Char => "char",
            Kind::Str => "string",
            Kind::Symbol => "symbol",
            Kind::List => "list",
            Kind::Vector => "vector",
            Kind::Function => "function",
            Kind::Map => "map",
            Kind::LBrack => "[",
            Kind::RBrack => "]",
            Kind::LPar => "(",
            Kind::RPar => ")",
            Kind::LBrace => "{",
            Kind::RBrace => "}",
            Kind::Comma => ",",
            Kind::Pipe => "|",
            Kind::At => "@",
            Kind::Quote => "`",
            Kind::MacroSigil => "%",
            Kind::And => "and",
            Kind::Or => "or",
            Kind::Not => "not",
            Kind::Eq => "eq",
            Kind::Ne => "ne",
            Kind::Lt => "lt",
            Kind::Gt => "gt",
            Kind::Lte => "lte",
            Kind::Gte => "gte",
            Kind::Add => "add",
            Kind::Sub => "sub",
            Kind::Mul => "mul",
            Kind::Div => "div",
            Kind::Assign => "assign",
            Kind::Memb => "memb",
            Kind::Sep => "sep",
            Kind::Program => "program",
            Kind::Block => "block",
            Kind::Apply => "apply",
            Kind::MacroApply => "macro_apply",
            Kind::Params => "params",
            Kind::ExpList => "exp_list",
            Kind::IdList => "id_list",
            Kind::Pattern => "pattern",
            Kind::Define => "define",
            Kind::Lambda => "lambda",
            Kind::Begin => "begin",
            Kind::If => "if",
            Kind::Macro => "macro",
            Kind::Transform => "transform",
            Kind::Term => "end",
            Kind::Eof => "eof",
        }
    }

    /// The surface spelling of operator and punctuation tokens.
    pub fn lexeme(&self) -> Option<&'static str> {
        let lexeme = match self {
            Kind::LBrack => "[",
            Kind::RBrack => "]",
            Kind::LPar => "(",
            Kind::RPar => ")",
            Kind::LBrace => "{",
            Kind::RBrace => "}",
            Kind::Comma => ",",
            Kind::Pipe => "|",
            Kind::At => "@",
            Kind::Quote => "`",
            Kind::MacroSigil => "%",
            Kind::And => "&&",
            Kind::Or => "||",
            Kind::Not => "!",
            Kind::Eq => "==",
            Kind::Ne => "!=",
            Kind::Lt => "<",
            Kind::Gt => ">",
            Kind::Lte => "<=",
            Kind::Gte => ">=",
            Kind::Add => "+",
            Kind::Sub => "-",
            Kind::Mul => "*",
            Kind::Div => "/",
            Kind::Assign => "=",
            Kind::Memb => ".",
            Kind::Sep => ":",
            Kind::Term => "end",
            _ => return None,
        };
        Some(lexeme)
    }

    /// Wording used in "expected X, found Y" diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Kind::Id => "an identifier".to_string(),
            Kind::Num => "a number".to_string(),
            Kind::Char => "a character literal".to_string(),
            Kind::Str => "a string literal".to_string(),
            Kind::Symbol => "a symbol".to_string(),
            Kind::Eof => "end of input".to_string(),
            other => match other.lexeme() {
                Some(lexeme) => format!("'{lexeme}'"),
                None => format!("<{}>", other.as_str()),
            },
        }
    }

    /// Kinds whose nodes carry literal text.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Kind::Id | Kind::Num | Kind::Char | Kind::Str | Kind::Symbol
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
