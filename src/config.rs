//! Front-end configuration, loadable from YAML.
//!
//! ```yaml
//! duplicate_macros: reject   # or overwrite (default)
//! max_expansion_depth: 64
//! max_nesting_depth: 256      # needs a larger stack than the default
//! strip_definitions: false
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::diagnostics::DlError;

/// Default bound on nested macro expansion.
pub const MAX_MACRO_RECURSION_DEPTH: usize = 128;

/// Default bound on how deeply expressions may nest in source text. Keeps
/// the recursive-descent parser within a 2 MB thread stack in debug builds.
pub const MAX_NESTING_DEPTH: usize = 32;

/// What happens when a macro name is defined twice in one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later definition replaces the earlier one.
    #[default]
    Overwrite,
    /// The second definition is an error.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontendConfig {
    pub duplicate_macros: DuplicatePolicy,
    pub max_expansion_depth: usize,
    /// Deepest expression nesting the parser accepts.
    pub max_nesting_depth: usize,
    /// Remove macro definitions from the expanded program.
    pub strip_definitions: bool,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            duplicate_macros: DuplicatePolicy::Overwrite,
            max_expansion_depth: MAX_MACRO_RECURSION_DEPTH,
            max_nesting_depth: MAX_NESTING_DEPTH,
            strip_definitions: true,
        }
    }
}

impl FrontendConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, DlError> {
        // An empty document means "all defaults".
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| DlError::config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DlError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| DlError::io(format!("cannot read config '{}'", path.display()), e))?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = FrontendConfig::from_yaml_str("duplicate_macros: reject\n").unwrap();
        assert_eq!(config.duplicate_macros, DuplicatePolicy::Reject);
        assert_eq!(config.max_expansion_depth, MAX_MACRO_RECURSION_DEPTH);
        assert_eq!(config.max_nesting_depth, MAX_NESTING_DEPTH);
        assert!(config.strip_definitions);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(FrontendConfig::from_yaml_str("").unwrap(), FrontendConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FrontendConfig::from_yaml_str("max_depth: 3\n").unwrap_err();
        assert_eq!(err.code_str(), "dl::config");
    }
}
