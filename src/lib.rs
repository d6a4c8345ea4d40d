#![deny(missing_docs)]

//! # OpenAPI Importer
//!
//! Loads OpenAPI 3.x documents from JSON or YAML text, binds them into a typed
//! model with `$ref` pointers resolved into a cycle-aware schema graph, and
//! validates them into an accumulated diagnostic report.

/// Shared error types.
pub mod error;

/// Import configuration.
pub mod config;

/// JSON / YAML loading.
pub mod loader;

/// OpenAPI model, binding and validation.
pub mod oas;

/// Public import entry points.
pub mod importer;

pub use config::ImportOptions;
pub use error::{AppError, AppResult, SyntaxError};
pub use importer::{
    parse_openapi_document, parse_openapi_document_with_options, ImportResult, Importer,
};
pub use loader::{load_document, LoadedDocument, SourceFormat};
pub use oas::{
    Components, Diagnostic, DiagnosticKind, Document, DocumentRegistry, Severity, SpecVersion,
    ValidationReport,
};
