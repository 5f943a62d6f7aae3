//! Recursive-descent parser for dl.
//!
//! One method per grammar rule. Core forms (`define`, `set!`, `lambda`,
//! `begin`, `if`, `macro`) are recognised by identifier text through a table
//! built when the parser is created, and each is closed by `end`.
//! Parenthesised input is ambiguous between an infix call `(a op b)`, a list
//! `(a, b)` and a grouping `(a)`; the infix reading is tried speculatively
//! first and the others are decided by the token after the first element.
//!
//! Reducing a `macro` form registers it immediately. Registrations made
//! while speculating are journaled so a rewind can undo them.

use std::collections::HashMap;

use log::{debug, trace};

use crate::{
    ast::{Ast, Kind, Span},
    config::{DuplicatePolicy, FrontendConfig},
    diagnostics::DlError,
    macros::{Macro, MacroRegistry},
    syntax::{
        engine::{Speculate, TokenBuffer},
        lexer::Lexer,
        token::TokenSource,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreForm {
    Define,
    Set,
    Lambda,
    Begin,
    If,
    Macro,
}

impl CoreForm {
    pub const ALL: [CoreForm; 6] = [
        CoreForm::Define,
        CoreForm::Set,
        CoreForm::Lambda,
        CoreForm::Begin,
        CoreForm::If,
        CoreForm::Macro,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            CoreForm::Define => "define",
            CoreForm::Set => "set!",
            CoreForm::Lambda => "lambda",
            CoreForm::Begin => "begin",
            CoreForm::If => "if",
            CoreForm::Macro => "macro",
        }
    }
}

/// Binding power of binary operators; higher binds tighter.
fn binary_precedence(kind: Kind) -> Option<u8> {
    match kind {
        Kind::Or => Some(1),
        Kind::And => Some(2),
        Kind::Eq | Kind::Ne => Some(3),
        Kind::Lt | Kind::Gt | Kind::Lte | Kind::Gte => Some(4),
        Kind::Add | Kind::Sub => Some(5),
        Kind::Mul | Kind::Div => Some(6),
        _ => None,
    }
}

pub struct Parser<S: TokenSource> {
    tokens: TokenBuffer<S>,
    core_forms: HashMap<&'static str, CoreForm>,
    registry: MacroRegistry,
    duplicates: DuplicatePolicy,
    /// Registrations made while speculating: name and the macro it replaced.
    journal: Vec<(String, Option<Macro>)>,
    /// Current expression nesting and its bound.
    nesting: usize,
    max_nesting: usize,
}

impl<'a> Parser<Lexer<'a>> {
    pub fn from_source(source: &'a str, config: &FrontendConfig) -> Self {
        Parser::new(Lexer::new(source), config)
    }
}

impl<S: TokenSource> Parser<S> {
    pub fn new(source: S, config: &FrontendConfig) -> Self {
        Self {
            tokens: TokenBuffer::new(source),
            core_forms: CoreForm::ALL.iter().map(|f| (f.keyword(), *f)).collect(),
            registry: MacroRegistry::new(),
            duplicates: config.duplicate_macros,
            journal: Vec::new(),
            nesting: 0,
            max_nesting: config.max_nesting_depth,
        }
    }

    pub fn registry(&self) -> &MacroRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> MacroRegistry {
        self.registry
    }

    /// `Program := Expression* EOF`
    pub fn parse_program(&mut self) -> Result<Ast, DlError> {
        let start = self.here()?;
        let mut program = Ast::new(Kind::Program, start);
        while self.peek(1)? != Kind::Eof {
            program.add_child(self.expression()?);
        }
        let end = self.here()?;
        program.set_span(start.to(end));
        Ok(program)
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&mut self, k: usize) -> Result<Kind, DlError> {
        self.tokens.lookahead_kind(k)
    }

    fn here(&mut self) -> Result<Span, DlError> {
        Ok(self.tokens.lookahead_token(1)?.span)
    }

    fn unexpected_here(&mut self, expected: &str) -> DlError {
        match self.tokens.lookahead_token(1) {
            Ok(token) => DlError::unexpected(expected, token.describe(), token.span),
            Err(err) => err,
        }
    }

    fn core_form_ahead(&mut self) -> Result<Option<CoreForm>, DlError> {
        let token = self.tokens.lookahead_token(1)?;
        if token.kind != Kind::Id {
            return Ok(None);
        }
        Ok(token
            .text
            .as_deref()
            .and_then(|text| self.core_forms.get(text))
            .copied())
    }

    /// Runs `rule` one nesting level deeper, failing once the configured
    /// depth is exceeded.
    fn nested<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Result<T, DlError>,
    ) -> Result<T, DlError> {
        if self.nesting >= self.max_nesting {
            let span = self.here()?;
            return Err(DlError::nesting_limit(self.max_nesting, span)
                .with_help("split the expression up with `define`"));
        }
        self.nesting += 1;
        let result = rule(self);
        self.nesting -= 1;
        result
    }

    fn identifier(&mut self) -> Result<Ast, DlError> {
        let token = self.tokens.match_kind(Kind::Id)?;
        Ok(Ast::from(&token))
    }

    // ------------------------------------------------------------------
    // Expressions and core forms
    // ------------------------------------------------------------------

    fn expression(&mut self) -> Result<Ast, DlError> {
        trace!("expression: next token = {:?}", self.tokens.lookahead_token(1)?);
        self.nested(|parser| match parser.core_form_ahead()? {
            Some(form) => parser.core_form(form),
            None => parser.assignment(),
        })
    }

    fn core_form(&mut self, form: CoreForm) -> Result<Ast, DlError> {
        let keyword = self.tokens.consume()?;
        trace!("core form `{}` at {}", form.keyword(), keyword.span);
        self.core_form_body(form, keyword.span).map_err(|err| {
            err.with_help(format!(
                "in the `{}` form opened at {}",
                form.keyword(),
                keyword.span
            ))
        })
    }

    fn core_form_body(&mut self, form: CoreForm, start: Span) -> Result<Ast, DlError> {
        let (kind, children) = match form {
            CoreForm::Define | CoreForm::Set => {
                let name = self.identifier()?;
                let value = self.expression()?;
                let kind = if form == CoreForm::Define {
                    Kind::Define
                } else {
                    Kind::Assign
                };
                (kind, vec![name, value])
            }
            CoreForm::Lambda => {
                let params = self.id_list(Kind::IdList)?;
                let body = self.exp_list(Kind::Term)?;
                (Kind::Lambda, vec![params, body])
            }
            CoreForm::Begin => (Kind::Begin, vec![self.exp_list(Kind::Term)?]),
            CoreForm::If => {
                let mut children = vec![self.expression()?, self.expression()?];
                if self.peek(1)? != Kind::Term {
                    children.push(self.expression()?);
                }
                (Kind::If, children)
            }
            CoreForm::Macro => (Kind::Macro, self.macro_parts()?),
        };
        let end = self.tokens.match_kind(Kind::Term)?;
        let node = Ast::with_children(kind, children, start.to(end.span));
        if form == CoreForm::Macro {
            self.register_macro(&node)?;
        }
        Ok(node)
    }

    /// `ID IdList ID (IdList Expression)*` after the `macro` keyword.
    fn macro_parts(&mut self) -> Result<Vec<Ast>, DlError> {
        let mut parts = vec![
            self.identifier()?,
            self.id_list(Kind::IdList)?,
            self.identifier()?,
        ];
        while self.peek(1)? != Kind::Term {
            let pattern = self.id_list(Kind::Pattern)?;
            let body = self.expression()?;
            let span = pattern.span().to(body.span());
            parts.push(Ast::with_children(Kind::Transform, vec![pattern, body], span));
        }
        Ok(parts)
    }

    fn register_macro(&mut self, node: &Ast) -> Result<(), DlError> {
        let definition = Macro::from_definition(node)?;
        let name = definition.name().to_string();
        let previous = self
            .registry
            .register_with_policy(definition, self.duplicates)?;
        if previous.is_some() {
            debug!("macro '{name}' redefined; the later definition wins");
        }
        if self.tokens.is_speculating() {
            self.journal.push((name, previous));
        }
        Ok(())
    }

    /// `Operation` with `=` as the loosest, right-associative operator.
    fn assignment(&mut self) -> Result<Ast, DlError> {
        let target = self.binary(1)?;
        if self.peek(1)? != Kind::Assign {
            return Ok(target);
        }
        self.tokens.consume()?;
        let value = self.expression()?;
        let span = target.span().to(value.span());
        Ok(Ast::with_children(Kind::Assign, vec![target, value], span))
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Ast, DlError> {
        let mut lhs = self.unary()?;
        loop {
            let kind = self.peek(1)?;
            let Some(precedence) = binary_precedence(kind) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            self.tokens.consume()?;
            let rhs = self.binary(precedence + 1)?;
            let span = lhs.span().to(rhs.span());
            lhs = Ast::with_children(kind, vec![lhs, rhs], span);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Ast, DlError> {
        let kind = self.peek(1)?;
        if !matches!(kind, Kind::Not | Kind::Sub) {
            return self.postfix();
        }
        let operator = self.tokens.consume()?;
        let operand = self.nested(Self::unary)?;
        let span = operator.span.to(operand.span());
        Ok(Ast::with_children(kind, vec![operand], span))
    }

    /// Member access: `memb(member, receiver)`, left-associative.
    fn postfix(&mut self) -> Result<Ast, DlError> {
        let mut node = self.primary()?;
        while self.peek(1)? == Kind::Memb {
            self.tokens.consume()?;
            let member = self.identifier()?;
            let span = node.span().to(member.span());
            node = Ast::with_children(Kind::Memb, vec![member, node], span);
        }
        Ok(node)
    }

    fn primary(&mut self) -> Result<Ast, DlError> {
        trace!("primary: next token = {:?}", self.tokens.lookahead_token(1)?);
        match self.peek(1)? {
            Kind::Id => {
                if let Some(form) = self.core_form_ahead()? {
                    let span = self.here()?;
                    return Err(DlError::syntax(
                        format!("`{}` form cannot be used as an operand", form.keyword()),
                        span,
                    )
                    .with_help("wrap it in parentheses"));
                }
                if self.peek(2)? == Kind::LPar {
                    self.prefix_application()
                } else {
                    self.literal()
                }
            }
            Kind::Num | Kind::Char | Kind::Str | Kind::Symbol => self.literal(),
            Kind::LPar => self.parenthesized(),
            Kind::Quote => self.quoted_list(),
            Kind::LBrack => self.vector(),
            Kind::LBrace => self.block(),
            Kind::At => self.map(),
            Kind::MacroSigil => self.macro_use(),
            _ => Err(self.unexpected_here("an expression")),
        }
    }

    fn literal(&mut self) -> Result<Ast, DlError> {
        let token = self.tokens.consume()?;
        Ok(Ast::from(&token))
    }

    // ------------------------------------------------------------------
    // Applications
    // ------------------------------------------------------------------

    /// `ID '(' ExpList ')'`
    fn prefix_application(&mut self) -> Result<Ast, DlError> {
        let callee = self.identifier()?;
        self.tokens.match_kind(Kind::LPar)?;
        let args = self.exp_list(Kind::RPar)?;
        let close = self.tokens.match_kind(Kind::RPar)?;
        let span = callee.span().to(close.span);
        Ok(Ast::with_children(Kind::Apply, vec![callee, args], span))
    }

    /// `'%' ID '(' ExpList ')'`
    fn macro_use(&mut self) -> Result<Ast, DlError> {
        let sigil = self.tokens.match_kind(Kind::MacroSigil)?;
        let name = self.identifier()?;
        self.tokens.match_kind(Kind::LPar)?;
        let args = self.exp_list(Kind::RPar)?;
        let close = self.tokens.match_kind(Kind::RPar)?;
        let span = sigil.span.to(close.span);
        Ok(Ast::with_children(Kind::MacroApply, vec![name, args], span))
    }

    fn parenthesized(&mut self) -> Result<Ast, DlError> {
        if let Some(application) = self.speculate("infix_application", Self::infix_application)? {
            return Ok(application);
        }
        self.list_or_group()
    }

    /// `'(' Expression ID Expression ')'`
    fn infix_application(&mut self) -> Result<Ast, DlError> {
        let open = self.tokens.match_kind(Kind::LPar)?;
        let lhs = self.expression()?;
        let operator = self.identifier()?;
        let rhs = self.expression()?;
        let close = self.tokens.match_kind(Kind::RPar)?;
        let span = open.span.to(close.span);
        let args = Ast::with_children(Kind::ExpList, vec![lhs, rhs], span);
        Ok(Ast::with_children(Kind::Apply, vec![operator, args], span))
    }

    /// `'(' ')'`, `'(' Expression ',' ExpList ')'` or `'(' Expression ')'`.
    fn list_or_group(&mut self) -> Result<Ast, DlError> {
        let open = self.tokens.match_kind(Kind::LPar)?;
        if self.peek(1)? == Kind::RPar {
            let close = self.tokens.consume()?;
            return Ok(Ast::new(Kind::List, open.span.to(close.span)));
        }
        let first = self.expression()?;
        match self.peek(1)? {
            Kind::RPar => {
                self.tokens.consume()?;
                Ok(first)
            }
            Kind::Comma => {
                self.tokens.consume()?;
                let mut list = Ast::with_children(Kind::List, vec![first], open.span);
                self.items_until(Kind::RPar, &mut list)?;
                let close = self.tokens.match_kind(Kind::RPar)?;
                list.set_span(open.span.to(close.span));
                Ok(list)
            }
            _ => Err(self.unexpected_here("',' or ')'")),
        }
    }

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------

    /// `` '`' '(' ExpList ')' ``
    fn quoted_list(&mut self) -> Result<Ast, DlError> {
        let quote = self.tokens.match_kind(Kind::Quote)?;
        self.tokens.match_kind(Kind::LPar)?;
        let mut list = Ast::new(Kind::List, quote.span);
        self.items_until(Kind::RPar, &mut list)?;
        let close = self.tokens.match_kind(Kind::RPar)?;
        list.set_span(quote.span.to(close.span));
        Ok(list)
    }

    fn vector(&mut self) -> Result<Ast, DlError> {
        let open = self.tokens.match_kind(Kind::LBrack)?;
        let mut vector = Ast::new(Kind::Vector, open.span);
        self.items_until(Kind::RBrack, &mut vector)?;
        let close = self.tokens.match_kind(Kind::RBrack)?;
        vector.set_span(open.span.to(close.span));
        Ok(vector)
    }

    /// `'{' Params? ExpList '}'` as `function(params, block)`.
    fn block(&mut self) -> Result<Ast, DlError> {
        let open = self.tokens.match_kind(Kind::LBrace)?;
        let params = self.block_params(open.span)?;
        let mut body = Ast::new(Kind::Block, open.span);
        self.items_until(Kind::RBrace, &mut body)?;
        let close = self.tokens.match_kind(Kind::RBrace)?;
        let span = open.span.to(close.span);
        body.set_span(span);
        Ok(Ast::with_children(Kind::Function, vec![params, body], span))
    }

    /// `'|' ID (',' ID)* ','? '|'`, `'||'`, or nothing.
    fn block_params(&mut self, at: Span) -> Result<Ast, DlError> {
        let mut params = Ast::new(Kind::Params, at);
        match self.peek(1)? {
            // `{|| ...}` lexes as one `||` token
            Kind::Or => {
                self.tokens.consume()?;
            }
            Kind::Pipe => {
                self.tokens.consume()?;
                while self.peek(1)? != Kind::Pipe {
                    params.add_child(self.identifier()?);
                    if self.peek(1)? == Kind::Comma {
                        self.tokens.consume()?;
                    } else {
                        break;
                    }
                }
                self.tokens.match_kind(Kind::Pipe)?;
            }
            _ => {}
        }
        Ok(params)
    }

    /// `'@' '{' (Expression ':' Expression ','?)* '}'`
    fn map(&mut self) -> Result<Ast, DlError> {
        let at = self.tokens.match_kind(Kind::At)?;
        self.tokens.match_kind(Kind::LBrace)?;
        let mut map = Ast::new(Kind::Map, at.span);
        loop {
            match self.peek(1)? {
                Kind::RBrace => break,
                Kind::Eof => return Err(self.unexpected_here(&Kind::RBrace.describe())),
                _ => {}
            }
            let key = self.expression()?;
            self.tokens.match_kind(Kind::Sep)?;
            let value = self.expression()?;
            let span = key.span().to(value.span());
            map.add_child(Ast::with_children(Kind::Sep, vec![key, value], span));
            if self.peek(1)? == Kind::Comma {
                self.tokens.consume()?;
            }
        }
        let close = self.tokens.match_kind(Kind::RBrace)?;
        map.set_span(at.span.to(close.span));
        Ok(map)
    }

    /// `'(' ID* ')'`, tagged `kind` (`id_list` or `pattern`).
    fn id_list(&mut self, kind: Kind) -> Result<Ast, DlError> {
        let open = self.tokens.match_kind(Kind::LPar)?;
        let mut list = Ast::new(kind, open.span);
        while self.peek(1)? == Kind::Id {
            list.add_child(self.identifier()?);
            if self.peek(1)? == Kind::Comma {
                self.tokens.consume()?;
            }
        }
        let close = self.tokens.match_kind(Kind::RPar)?;
        list.set_span(open.span.to(close.span));
        Ok(list)
    }

    /// Expressions up to (not including) `close`, as an `exp_list`.
    fn exp_list(&mut self, close: Kind) -> Result<Ast, DlError> {
        let start = self.here()?;
        let mut list = Ast::new(Kind::ExpList, start);
        self.items_until(close, &mut list)?;
        let end = self.here()?;
        list.set_span(start.to(end));
        Ok(list)
    }

    /// Appends expressions to `list` until `close` is next. A comma after
    /// an item is optional, so trailing commas are accepted.
    fn items_until(&mut self, close: Kind, list: &mut Ast) -> Result<(), DlError> {
        loop {
            let next = self.peek(1)?;
            if next == close {
                return Ok(());
            }
            if next == Kind::Eof {
                return Err(self.unexpected_here(&close.describe()));
            }
            list.add_child(self.expression()?);
            if self.peek(1)? == Kind::Comma {
                self.tokens.consume()?;
            }
        }
    }
}

impl<S: TokenSource> Speculate for Parser<S> {
    type Source = S;

    fn tokens(&mut self) -> &mut TokenBuffer<S> {
        &mut self.tokens
    }

    fn checkpoint(&self) -> usize {
        self.journal.len()
    }

    fn restore(&mut self, checkpoint: usize) {
        while self.journal.len() > checkpoint {
            if let Some((name, previous)) = self.journal.pop() {
                trace!("undoing registration of macro '{name}'");
                self.registry.restore(&name, previous);
            }
        }
    }

    fn committed(&mut self) {
        if !self.tokens.is_speculating() {
            self.journal.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{diagnostics::ErrorType, traverse::post_order_names};

    fn parse(source: &str) -> Ast {
        Parser::from_source(source, &FrontendConfig::default())
            .parse_program()
            .unwrap()
    }

    fn reject() -> FrontendConfig {
        FrontendConfig {
            duplicate_macros: DuplicatePolicy::Reject,
            ..FrontendConfig::default()
        }
    }

    #[test]
    fn infix_speculation_falls_back_to_grouping() {
        assert_eq!(parse("(a plus b)").pretty(), "(program (apply plus (exp_list a b)))");
        assert_eq!(parse("(a + b)").pretty(), "(program (add a b))");
        assert_eq!(parse("((x))").pretty(), "(program x)");
    }

    #[test]
    fn rewound_speculation_undoes_macro_registration() {
        // The infix attempt registers `m`, then fails at `)`; the grouping
        // parse registers it again, which `Reject` would refuse if the first
        // registration had survived.
        let source = "(macro m (x) stop (x) x end)";
        let mut parser = Parser::from_source(source, &reject());
        let program = parser.parse_program().unwrap();
        assert_eq!(post_order_names(&program), "id id id_list id id pattern id transform macro program");
        assert_eq!(parser.registry().names(), vec!["m"]);
        assert!(parser.journal.is_empty());
    }

    #[test]
    fn committed_speculation_keeps_registration() {
        let source = "(macro m (x) stop (x) x end and_then y)";
        let mut parser = Parser::from_source(source, &reject());
        let program = parser.parse_program().unwrap();
        assert_eq!(program.child(0).map(Ast::kind), Some(Kind::Apply));
        assert!(parser.registry().contains("m"));
        assert!(parser.journal.is_empty());
    }

    #[test]
    fn lexical_errors_escape_speculation() {
        let err = Parser::from_source("(1 '')", &FrontendConfig::default())
            .parse_program()
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Lex);
    }

    #[test]
    fn keyword_in_operand_position_is_rejected() {
        let err = Parser::from_source("1 + if a b end", &FrontendConfig::default())
            .parse_program()
            .unwrap_err();
        assert!(err.to_string().contains("`if` form cannot be used as an operand"), "{err}");
    }

    fn shallow() -> FrontendConfig {
        FrontendConfig {
            max_nesting_depth: 8,
            ..FrontendConfig::default()
        }
    }

    #[test]
    fn nesting_past_the_limit_is_an_error() {
        let within = format!("{}1{}", "[".repeat(7), "]".repeat(7));
        assert!(Parser::from_source(&within, &shallow()).parse_program().is_ok());

        for source in [
            format!("{}1{}", "[".repeat(8), "]".repeat(8)),
            format!("{}x{}", "(".repeat(8), ")".repeat(8)),
            format!("{}x", "-".repeat(8)),
        ] {
            let err = Parser::from_source(&source, &shallow())
                .parse_program()
                .unwrap_err();
            assert_eq!(err.code_str(), "dl::syntax", "{source}");
            assert!(err.to_string().contains("expression nested too deeply (limit 8)"), "{err}");
        }
    }

    #[test]
    fn nesting_counter_unwinds_after_limit_error() {
        let mut parser = Parser::from_source("(((((((((a)))))))))", &shallow());
        let err = parser.parse_program().unwrap_err();
        assert_eq!(err.code_str(), "dl::syntax");
        assert_eq!(parser.nesting, 0);
        assert!(parser.journal.is_empty());
    }

    #[test]
    fn core_form_errors_name_the_offending_token() {
        let err = Parser::from_source("define 42 x end", &FrontendConfig::default())
            .parse_program()
            .unwrap_err();
        assert!(err.to_string().contains("expected an identifier, found number 42"), "{err}");
        assert!(err.help_text().unwrap_or_default().contains("`define` form"));
    }
}
