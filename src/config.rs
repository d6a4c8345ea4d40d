//! # Import Options
//!
//! Settings controlling reference resolution, validation and failure policy.
//! Options can be built in code or deserialized from JSON / YAML.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration for a single import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOptions {
    /// Retrieval URI of the entry document. Relative references resolve against it.
    pub base_uri: Option<String>,
    /// Follow cross-document references into registered documents.
    pub resolve_external: bool,
    /// Maximum schema nesting depth and non-schema `$ref` chain length.
    pub max_depth: usize,
    /// Run the semantic validator after binding.
    pub validate: bool,
    /// Fail the import when the report contains errors.
    pub strict: bool,
    /// In strict mode, fail on warnings as well.
    pub warnings_as_errors: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            base_uri: None,
            resolve_external: true,
            max_depth: DEFAULT_MAX_DEPTH,
            validate: true,
            strict: false,
            warnings_as_errors: false,
        }
    }
}

impl ImportOptions {
    /// Sets the retrieval URI of the entry document.
    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    /// Enables or disables cross-document resolution.
    pub fn with_resolve_external(mut self, enabled: bool) -> Self {
        self.resolve_external = enabled;
        self
    }

    /// Sets the depth limit.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Enables or disables semantic validation.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Enables or disables strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Treats warnings as failures in strict mode.
    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }

    /// Reads options from YAML text.
    pub fn from_yaml_str(text: &str) -> AppResult<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| AppError::General(format!("Invalid import options: {}", e)))
    }

    /// Reads options from JSON text.
    pub fn from_json_str(text: &str) -> AppResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| AppError::General(format!("Invalid import options: {}", e)))
    }
}
