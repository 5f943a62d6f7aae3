//! Scanner for dl source text.
//!
//! Produces [`Token`]s on demand with byte spans and 1-based line/column
//! positions. `#` starts a comment that runs to the end of the line.

use log::trace;

use crate::{
    ast::{Kind, Span},
    diagnostics::DlError,
    syntax::token::{Token, TokenSource},
};

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Scans the whole input, ending with a single `eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, DlError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == Kind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.source[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// Span from a saved start position to the current position.
    fn span_from(&self, start: (usize, usize, usize)) -> Span {
        let (offset, line, column) = start;
        Span {
            start: offset,
            end: self.pos,
            line,
            column,
        }
    }

    fn identifier(&mut self, start: (usize, usize, usize)) -> Token {
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        // `set!` is one identifier, `a!=b` is not
        if self.peek() == Some('!') && self.peek_second() != Some('=') {
            self.bump();
        }
        let span = self.span_from(start);
        let text = &self.source[span.start..span.end];
        if text == "end" {
            Token::new(Kind::Term, span)
        } else {
            Token::with_text(Kind::Id, text, span)
        }
    }

    fn number(&mut self, start: (usize, usize, usize)) -> Result<Token, DlError> {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.eat('.') {
            if !matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                return Err(DlError::lex(
                    "missing fractional portion of floating point number",
                    self.span_from(start),
                ));
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        let span = self.span_from(start);
        Ok(Token::with_text(Kind::Num, &self.source[span.start..span.end], span))
    }

    /// One character of a char or string literal body, after `\` escapes.
    fn literal_char(&mut self, start: (usize, usize, usize)) -> Result<char, DlError> {
        match self.bump() {
            Some('\\') => match self.bump() {
                Some('n') => Ok('\n'),
                Some('t') => Ok('\t'),
                Some('r') => Ok('\r'),
                Some('0') => Ok('\0'),
                Some(c @ ('\\' | '\'' | '"')) => Ok(c),
                Some(other) => Err(DlError::lex(
                    format!("unknown escape sequence '\\{other}'"),
                    self.span_from(start),
                )),
                None => Err(DlError::lex("unterminated escape sequence", self.span_from(start))),
            },
            Some(c) => Ok(c),
            None => Err(DlError::lex("unexpected end of input", self.span_from(start))),
        }
    }

    fn character(&mut self, start: (usize, usize, usize)) -> Result<Token, DlError> {
        match self.peek() {
            Some('\'') => {
                self.bump();
                return Err(DlError::lex("invalid character literal", self.span_from(start)));
            }
            Some('\n') | None => {
                return Err(DlError::lex(
                    "unterminated character literal",
                    self.span_from(start),
                ));
            }
            _ => {}
        }
        let value = self.literal_char(start)?;
        if !self.eat('\'') {
            return Err(DlError::lex(
                "unterminated character literal",
                self.span_from(start),
            ));
        }
        Ok(Token::with_text(Kind::Char, value.to_string(), self.span_from(start)))
    }

    fn string(&mut self, start: (usize, usize, usize)) -> Result<Token, DlError> {
        let mut value = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.bump();
                    return Ok(Token::with_text(Kind::Str, value, self.span_from(start)));
                }
                Some('\n') | None => {
                    return Err(DlError::lex("unterminated string literal", self.span_from(start)));
                }
                Some(_) => value.push(self.literal_char(start)?),
            }
        }
    }

    fn symbol(&mut self, start: (usize, usize, usize)) -> Result<Token, DlError> {
        let name_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        if self.pos == name_start {
            return Err(DlError::lex("expected a name after '$'", self.span_from(start)));
        }
        let name = &self.source[name_start..self.pos];
        Ok(Token::with_text(Kind::Symbol, name, self.span_from(start)))
    }

    /// Single-character token, or its two-character form when followed by
    /// `second`.
    fn one_or_two(&mut self, second: char, long: Kind, short: Kind) -> Kind {
        if self.eat(second) {
            long
        } else {
            short
        }
    }
}

impl TokenSource for Lexer<'_> {
    fn next_token(&mut self) -> Result<Token, DlError> {
        self.skip_trivia();
        let start = (self.pos, self.line, self.column);

        let Some(c) = self.bump() else {
            return Ok(Token::new(Kind::Eof, self.span_from(start)));
        };

        let kind = match c {
            c if c.is_ascii_alphabetic() => return Ok(self.identifier(start)),
            c if c.is_ascii_digit() => return self.number(start),
            '\'' => return self.character(start),
            '"' => return self.string(start),
            '$' => return self.symbol(start),
            '[' => Kind::LBrack,
            ']' => Kind::RBrack,
            '(' => Kind::LPar,
            ')' => Kind::RPar,
            '{' => Kind::LBrace,
            '}' => Kind::RBrace,
            ',' => Kind::Comma,
            '+' => Kind::Add,
            '-' => Kind::Sub,
            '*' => Kind::Mul,
            '/' => Kind::Div,
            '`' => Kind::Quote,
            '%' => Kind::MacroSigil,
            ':' => Kind::Sep,
            '.' => Kind::Memb,
            '@' => Kind::At,
            '=' => self.one_or_two('=', Kind::Eq, Kind::Assign),
            '!' => self.one_or_two('=', Kind::Ne, Kind::Not),
            '<' => self.one_or_two('=', Kind::Lte, Kind::Lt),
            '>' => self.one_or_two('=', Kind::Gte, Kind::Gt),
            '|' => self.one_or_two('|', Kind::Or, Kind::Pipe),
            '&' => {
                if !self.eat('&') {
                    return Err(DlError::lex("expected '&&'", self.span_from(start)));
                }
                Kind::And
            }
            other => {
                return Err(DlError::lex(
                    format!("unexpected character {other:?}"),
                    self.span_from(start),
                ))
            }
        };

        let token = Token::new(kind, self.span_from(start));
        trace!("token {:?} at {}", token.kind, token.span);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorType;

    fn kinds(source: &str) -> Vec<Kind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn lex_error(source: &str) -> DlError {
        let err = Lexer::new(source).tokenize().unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Lex, "{err}");
        err
    }

    #[test]
    fn scans_punctuation_and_operators() {
        use Kind::*;
        assert_eq!(
            kinds("[ ] ( ) { } , + - * / ` % : . @"),
            vec![
                LBrack, RBrack, LPar, RPar, LBrace, RBrace, Comma, Add, Sub, Mul, Div, Quote,
                MacroSigil, Sep, Memb, At, Eof
            ]
        );
        assert_eq!(
            kinds("= == ! != < <= > >= | || &&"),
            vec![Assign, Eq, Not, Ne, Lt, Lte, Gt, Gte, Pipe, Or, And, Eof]
        );
    }

    #[test]
    fn scans_literals_with_text() {
        let tokens = Lexer::new(r#"foo_1 42 3.25 'a' "hi" $sym"#).tokenize().unwrap();
        let pairs: Vec<_> = tokens
            .iter()
            .map(|t| (t.kind, t.text.clone().unwrap_or_default()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (Kind::Id, "foo_1".to_string()),
                (Kind::Num, "42".to_string()),
                (Kind::Num, "3.25".to_string()),
                (Kind::Char, "a".to_string()),
                (Kind::Str, "hi".to_string()),
                (Kind::Symbol, "sym".to_string()),
                (Kind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn bang_belongs_to_identifier_unless_not_equal() {
        assert_eq!(kinds("set!"), vec![Kind::Id, Kind::Eof]);
        assert_eq!(kinds("a!=b"), vec![Kind::Id, Kind::Ne, Kind::Id, Kind::Eof]);
    }

    #[test]
    fn end_is_the_terminator() {
        assert_eq!(kinds("end ending"), vec![Kind::Term, Kind::Id, Kind::Eof]);
    }

    #[test]
    fn skips_comments_and_tracks_lines() {
        let tokens = Lexer::new("# comment\n  x # trailing\ny").tokenize().unwrap();
        assert_eq!((tokens[0].span.line, tokens[0].span.column), (2, 3));
        assert_eq!((tokens[1].span.line, tokens[1].span.column), (3, 1));
    }

    #[test]
    fn eof_repeats() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next_token().unwrap().kind, Kind::Eof);
        assert_eq!(lexer.next_token().unwrap().kind, Kind::Eof);
    }

    #[test]
    fn string_escapes() {
        let tokens = Lexer::new(r#""a\"b\n""#).tokenize().unwrap();
        assert_eq!(tokens[0].text.as_deref(), Some("a\"b\n"));
    }

    #[test]
    fn lexical_errors() {
        assert!(lex_error("1.").to_string().contains("missing fractional portion"));
        assert!(lex_error("1.x").to_string().contains("missing fractional portion"));
        assert!(lex_error("''").to_string().contains("invalid character literal"));
        assert!(lex_error("'ab'").to_string().contains("unterminated character literal"));
        assert!(lex_error("\"abc").to_string().contains("unterminated string literal"));
        assert!(lex_error("\"a\nb\"").to_string().contains("unterminated string literal"));
        assert!(lex_error("$ x").to_string().contains("after '$'"));
        assert!(lex_error("a & b").to_string().contains("'&&'"));
        assert!(lex_error("a ; b").to_string().contains("';'"));
    }

    #[test]
    fn error_points_at_offending_line() {
        let err = lex_error("x\n  ''");
        let span = err.span().unwrap();
        assert_eq!((span.line, span.column), (2, 3));
    }
}
