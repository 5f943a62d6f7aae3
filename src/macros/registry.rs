//! Macro registry for storage and lookup of macro definitions.
//!
//! One registry belongs to one compilation unit: the parser fills it while
//! it reduces `macro` forms and the expansion pass reads it afterwards.
//!
//! # Duplicates
//!
//! | Method                | Overwrites | Error on duplicate |
//! |-----------------------|------------|--------------------|
//! | `register`            | Yes        | No                 |
//! | `register_or_error`   | No         | Yes                |
//! | `register_with_policy`| per policy | per policy         |
//!
//! Names are case-sensitive.
//!
//! # Example
//! ```rust
//! use dl::syntax::parse_program;
//!
//! let (_, registry) = parse_program("macro twice (x) stop (x) [x, x] end").unwrap();
//! assert!(registry.contains("twice"));
//! assert_eq!(registry.get("twice").unwrap().arity(), 1);
//! ```

use std::collections::HashMap;

use crate::{config::DuplicatePolicy, diagnostics::DlError, macros::Macro};

#[derive(Debug, Clone, Default)]
pub struct MacroRegistry {
    macros: HashMap<String, Macro>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `definition`, returning the macro it replaced, if any.
    pub fn register(&mut self, definition: Macro) -> Option<Macro> {
        self.macros.insert(definition.name().to_string(), definition)
    }

    /// Registers `definition`, failing if the name is already taken.
    pub fn register_or_error(&mut self, definition: Macro) -> Result<(), DlError> {
        if let Some(existing) = self.macros.get(definition.name()) {
            return Err(DlError::duplicate_macro(
                definition.name(),
                definition.span(),
                existing.span(),
            ));
        }
        self.register(definition);
        Ok(())
    }

    /// Registers according to `policy`, returning the replaced macro under
    /// [`DuplicatePolicy::Overwrite`].
    pub fn register_with_policy(
        &mut self,
        definition: Macro,
        policy: DuplicatePolicy,
    ) -> Result<Option<Macro>, DlError> {
        match policy {
            DuplicatePolicy::Overwrite => Ok(self.register(definition)),
            DuplicatePolicy::Reject => self.register_or_error(definition).map(|()| None),
        }
    }

    pub fn unregister(&mut self, name: &str) -> Option<Macro> {
        self.macros.remove(name)
    }

    /// Puts `name` back to its state before a journaled registration.
    pub(crate) fn restore(&mut self, name: &str, previous: Option<Macro>) {
        match previous {
            Some(definition) => {
                self.macros.insert(name.to_string(), definition);
            }
            None => {
                self.unregister(name);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.macros.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Macro> {
        self.macros.values()
    }
}
