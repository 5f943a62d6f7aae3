//! Grammar-independent backtracking machinery.
//!
//! [`TokenBuffer`] pulls tokens from a [`TokenSource`] on demand and gives
//! arbitrary lookahead. Positions can be marked and rewound, which is what
//! [`Speculate::speculate`] builds on: run a rule, and if it fails with a
//! syntax error, put everything back and let the caller try the next
//! alternative. Failed (rule, position) pairs are memoized so a rule is never
//! re-attempted at a position where it already failed.

use std::collections::HashSet;

use log::trace;

use crate::{
    ast::Kind,
    diagnostics::DlError,
    syntax::token::{Token, TokenSource},
};

/// Name of a grammar rule, used as the failure memo key.
pub type RuleId = &'static str;

pub struct TokenBuffer<S> {
    source: S,
    tokens: Vec<Token>,
    /// Index of lookahead 1 in `tokens`.
    position: usize,
    markers: Vec<usize>,
    failures: HashSet<(RuleId, usize)>,
}

impl<S: TokenSource> TokenBuffer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            position: 0,
            markers: Vec::new(),
            failures: HashSet::new(),
        }
    }

    /// Makes sure lookahead tokens `1..=k` are buffered.
    fn fill(&mut self, k: usize) -> Result<(), DlError> {
        while self.tokens.len() < self.position + k {
            let token = self.source.next_token()?;
            self.tokens.push(token);
        }
        Ok(())
    }

    /// The `k`-th token ahead (1-based).
    pub fn lookahead_token(&mut self, k: usize) -> Result<&Token, DlError> {
        let k = k.max(1);
        self.fill(k)?;
        Ok(&self.tokens[self.position + k - 1])
    }

    pub fn lookahead_kind(&mut self, k: usize) -> Result<Kind, DlError> {
        Ok(self.lookahead_token(k)?.kind)
    }

    /// Consumes and returns lookahead 1. `eof` is never consumed past.
    pub fn consume(&mut self) -> Result<Token, DlError> {
        let token = self.lookahead_token(1)?.clone();
        if token.kind != Kind::Eof {
            self.position += 1;
        }
        Ok(token)
    }

    /// Consumes lookahead 1 if it has the expected kind, otherwise reports
    /// what was found instead.
    pub fn match_kind(&mut self, kind: Kind) -> Result<Token, DlError> {
        let token = self.lookahead_token(1)?;
        if token.kind == kind {
            self.consume()
        } else {
            Err(DlError::unexpected(kind.describe(), token.describe(), token.span))
        }
    }

    /// Current position in the token stream.
    pub fn index(&self) -> usize {
        self.position
    }

    pub fn mark(&mut self) -> usize {
        self.markers.push(self.position);
        self.position
    }

    /// Drops the latest marker and seeks back to it.
    pub fn rewind(&mut self) {
        if let Some(marker) = self.markers.pop() {
            self.position = marker;
        }
    }

    /// Drops the latest marker and keeps the current position.
    pub fn commit(&mut self) {
        self.markers.pop();
    }

    pub fn is_speculating(&self) -> bool {
        !self.markers.is_empty()
    }

    pub fn has_failed(&self, rule: RuleId, index: usize) -> bool {
        self.failures.contains(&(rule, index))
    }

    pub fn record_failure(&mut self, rule: RuleId, index: usize) {
        self.failures.insert((rule, index));
    }
}

/// Speculative parsing for a parser built on a [`TokenBuffer`].
///
/// `checkpoint`/`restore` let the parser undo side effects other than the
/// token position (registrations made by the rule, for instance).
pub trait Speculate: Sized {
    type Source: TokenSource;

    fn tokens(&mut self) -> &mut TokenBuffer<Self::Source>;

    fn checkpoint(&self) -> usize {
        0
    }

    fn restore(&mut self, checkpoint: usize) {
        let _ = checkpoint;
    }

    /// Runs `rule` at the current position.
    ///
    /// Returns `Ok(Some(_))` and keeps the consumed input on success. On a
    /// syntax error the position and side effects are restored, the failure
    /// is memoized and `Ok(None)` is returned. Any other error (lexical,
    /// macro) propagates.
    fn speculate<T>(
        &mut self,
        name: RuleId,
        rule: impl FnOnce(&mut Self) -> Result<T, DlError>,
    ) -> Result<Option<T>, DlError> {
        let start = self.tokens().index();
        if self.tokens().has_failed(name, start) {
            trace!("speculate {name} at {start}: memoized failure");
            return Ok(None);
        }

        trace!("speculate {name} at {start}");
        self.tokens().mark();
        let checkpoint = self.checkpoint();
        match rule(self) {
            Ok(value) => {
                self.tokens().commit();
                self.committed();
                trace!("speculate {name} at {start}: matched");
                Ok(Some(value))
            }
            Err(err) => {
                self.tokens().rewind();
                self.restore(checkpoint);
                if err.is_syntax() {
                    trace!("speculate {name} at {start}: failed ({err})");
                    self.tokens().record_failure(name, start);
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Called after a successful speculation has been committed.
    fn committed(&mut self) {}
}
