//! # Version Detection
//!
//! Determines which OpenAPI 3.x revision a document targets. Swagger 2.0
//! documents are recognized and rejected.

use crate::error::{AppError, AppResult};
use derive_more::Display;
use serde::Serialize;
use serde_json::Value;

/// Supported OpenAPI revisions.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SpecVersion {
    /// OpenAPI 3.0.x
    #[display("3.0")]
    V3_0,
    /// OpenAPI 3.1.x
    #[display("3.1")]
    V3_1,
    /// OpenAPI 3.2.x
    #[display("3.2")]
    V3_2,
}

impl SpecVersion {
    /// Parses a version string such as `3.0.3` or `3.1`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split('.');
        if parts.next()? != "3" {
            return None;
        }
        let version = match parts.next()? {
            "0" => SpecVersion::V3_0,
            "1" => SpecVersion::V3_1,
            "2" => SpecVersion::V3_2,
            _ => return None,
        };
        if let Some(patch) = parts.next() {
            let numeric = patch.split('-').next().is_some_and(is_numeric);
            if !numeric || parts.next().is_some() {
                return None;
            }
        }
        Some(version)
    }

    /// JSON Schema alignment (type arrays, boolean schemas, `const`, `$ref` siblings).
    pub fn is_json_schema_aligned(self) -> bool {
        self >= SpecVersion::V3_1
    }

    /// Whether `webhooks` and `components.pathItems` exist.
    pub fn supports_webhooks(self) -> bool {
        self >= SpecVersion::V3_1
    }

    /// Whether the root `paths` object is mandatory.
    pub fn requires_paths(self) -> bool {
        self == SpecVersion::V3_0
    }

    /// Whether every Operation Object must declare `responses`.
    pub fn requires_operation_responses(self) -> bool {
        self == SpecVersion::V3_0
    }

    /// Whether Response Objects must carry a `description`.
    pub fn requires_response_description(self) -> bool {
        self < SpecVersion::V3_2
    }
}

fn is_numeric(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

/// Reads the `openapi` field of a document root.
///
/// Returns the detected version together with the declared version text.
/// Numeric values (an unquoted `openapi: 3.1` in YAML) are accepted in their
/// textual form.
pub fn detect_version(root: &Value) -> AppResult<(SpecVersion, String)> {
    if let Some(swagger) = root.get("swagger") {
        return Err(AppError::Unsupported(format!(
            "Swagger {} documents are not supported; convert to OpenAPI 3.x first",
            scalar_text(swagger).unwrap_or_else(|| "2.0".to_string())
        )));
    }

    let raw = root
        .get("openapi")
        .ok_or_else(|| AppError::Unsupported("missing required 'openapi' version field".into()))?;
    let declared = scalar_text(raw).ok_or_else(|| {
        AppError::Unsupported("'openapi' version field must be a string".into())
    })?;

    SpecVersion::parse(&declared)
        .map(|version| (version, declared.clone()))
        .ok_or_else(|| AppError::Unsupported(format!("unsupported OpenAPI version '{}'", declared)))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
