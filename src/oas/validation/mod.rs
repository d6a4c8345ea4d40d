//! # Document Validation
//!
//! Semantic checks over a bound [`Document`] that the object model alone
//! cannot express. Every check appends to the report and keeps going.
//!
//! - Path keys and templates, conflicting paths and path parameters.
//! - Duplicate parameters, operation ids and tags.
//! - Response codes and empty response sets.
//! - Security requirements against declared schemes.
//! - Component keys and Server Objects.
//! - Reference cycles, discriminators and `required` lists in the schema graph.

mod components;
mod operations;
mod paths;
mod schemas;
mod security;

use crate::oas::models::{Document, Operation, PathItem};
use crate::oas::pointer::JsonPointer;
use crate::oas::report::{Diagnostic, DiagnosticKind, Severity, ValidationReport};
use log::debug;
use std::collections::HashSet;

/// Runs every semantic check against `document`, appending findings to `report`.
///
/// Identical findings (an object validated through a `$ref` and as a
/// component) are reported once.
pub fn validate_document(document: &Document, report: &mut ValidationReport) {
    let mut found = ValidationReport::new();
    paths::validate_paths(document, &mut found);
    operations::validate_operations(document, &mut found);
    security::validate_security(document, &mut found);
    components::validate_tags(document, &mut found);
    components::validate_component_keys(document, &mut found);
    components::validate_servers(document, &mut found);
    schemas::validate_schemas(document, &mut found);

    let mut added = 0;
    for diagnostic in found.iter() {
        if !report.iter().any(|existing| existing == diagnostic) {
            report.push(diagnostic.clone());
            added += 1;
        }
    }
    debug!("validation added {} diagnostics", added);
}

/// Every path item of the document, callbacks included.
fn path_items(document: &Document) -> Vec<&PathItem> {
    let mut items = Vec::new();
    for item in document
        .paths
        .values()
        .chain(document.webhooks.values())
        .chain(document.components.path_items.values())
    {
        collect_items(item, &mut items);
    }
    for callback in document.components.callbacks.values() {
        for item in callback.expressions.values() {
            collect_items(item, &mut items);
        }
    }
    items
}

fn collect_items<'d>(item: &'d PathItem, out: &mut Vec<&'d PathItem>) {
    out.push(item);
    for operation in item.operations.values() {
        for callback in operation.callbacks.values() {
            for nested in callback.expressions.values() {
                collect_items(nested, out);
            }
        }
    }
}

/// Every operation of the document, callbacks included.
///
/// Operations reached both through a `$ref` and their component are listed once.
fn all_operations(document: &Document) -> Vec<&Operation> {
    let mut seen = HashSet::new();
    path_items(document)
        .into_iter()
        .flat_map(|item| item.operations.values())
        .filter(|op| seen.insert((op.document.as_deref(), op.location.as_str())))
        .collect()
}

fn emit(
    report: &mut ValidationReport,
    severity: Severity,
    kind: DiagnosticKind,
    document: Option<&str>,
    pointer: &JsonPointer,
    message: impl Into<String>,
) {
    report.push(
        Diagnostic::new(severity, kind, pointer.clone(), message)
            .in_document(document.map(str::to_string)),
    );
}
