//! Formal-to-actual substitution inside a cloned template.

use std::convert::Infallible;

use crate::{
    ast::{Ast, Kind},
    traverse::Visitor,
};

/// A formal parameter bound to the actual argument tree of one use site.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    formal: String,
    bound: Ast,
}

impl Param {
    pub fn new(formal: impl Into<String>, bound: Ast) -> Self {
        Self {
            formal: formal.into(),
            bound,
        }
    }

    pub fn formal(&self) -> &str {
        &self.formal
    }

    pub fn bound(&self) -> &Ast {
        &self.bound
    }
}

/// Replaces every `id` leaf naming a formal with a fresh copy of its
/// actual.
///
/// Substitution happens in `after_node`, so a replacement is written after
/// the walk has finished with that position and is never itself visited.
/// An actual that mentions a formal name is therefore inserted verbatim.
pub struct MacroApplication<'p> {
    params: &'p [Param],
    substitutions: usize,
}

impl<'p> MacroApplication<'p> {
    pub fn new(params: &'p [Param]) -> Self {
        Self {
            params,
            substitutions: 0,
        }
    }

    pub fn substitutions(&self) -> usize {
        self.substitutions
    }

    fn param_by_name(&self, name: &str) -> Option<&'p Param> {
        self.params.iter().find(|p| p.formal == name)
    }
}

impl Visitor for MacroApplication<'_> {
    type Error = Infallible;

    fn after_node(&mut self, node: &mut Ast, _depth: usize) -> Result<(), Infallible> {
        if node.kind() != Kind::Id {
            return Ok(());
        }
        let Some(param) = node.text().and_then(|name| self.param_by_name(name)) else {
            return Ok(());
        };
        *node = param.bound.clone();
        self.substitutions += 1;
        Ok(())
    }
}
