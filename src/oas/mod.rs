#![deny(missing_docs)]

//! # OpenAPI Module
//!
//! - **pointer**: JSON Pointer and `$ref` parsing helpers.
//! - **version**: `openapi` version detection and per-version rules.
//! - **registry**: In-memory documents available to cross-document references.
//! - **schema**: The schema graph.
//! - **models**: The bound document model.
//! - **binder**: Generic tree to typed model, resolving references.
//! - **report**: Accumulated diagnostics.
//! - **validation**: Semantic checks over a bound document.

pub mod binder;
pub mod models;
pub mod pointer;
pub mod registry;
pub mod report;
pub mod schema;
pub mod validation;
pub mod version;

pub use binder::bind_document;
pub use models::{Components, Document, HttpMethod, Operation, Parameter, PathItem};
pub use pointer::JsonPointer;
pub use registry::DocumentRegistry;
pub use report::{Diagnostic, DiagnosticKind, Severity, ValidationReport};
pub use schema::{ResolutionState, Schema, SchemaGraph, SchemaId, SchemaKind};
pub use validation::validate_document;
pub use version::{detect_version, SpecVersion};
