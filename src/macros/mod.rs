//! # Macro subsystem
//!
//! Syntactic macros for dl. A definition
//!
//! ```text
//! macro name (formals...) terminator (pattern...) body end
//! ```
//!
//! becomes a [`Macro`] whose template is `body`. At each use site
//! (`name(args...)`, `(a name b)` or `%name(args...)`) the template is cloned,
//! formals are bound to the actual argument trees by position and every
//! occurrence of a formal in the clone is replaced by a copy of its actual.
//!
//! Substitution is purely name-based: an identifier in the template that
//! happens to match a name at the use site is captured. There is no hygiene.
//!
//! ## Modules
//! - `definition`: [`Macro`] and [`Transform`], built from a parsed definition
//! - `application`: [`Param`] and the substituting [`MacroApplication`] visitor
//! - `registry`: [`MacroRegistry`], name to macro
//! - `expander`: [`MacroProcessor`] and [`expand`], the whole-program pass

pub mod application;
pub mod definition;
pub mod expander;
pub mod registry;

pub use application::{MacroApplication, Param};
pub use definition::{Macro, Transform};
pub use expander::{expand, expand_with_trace, ExpansionStep, MacroProcessor};
pub use registry::MacroRegistry;
