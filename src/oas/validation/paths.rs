//! Path keys, path templates and parameter declarations.

use super::{emit, path_items};
use crate::oas::models::{Document, Parameter, ParameterLocation, PathItem};
use crate::oas::pointer::JsonPointer;
use crate::oas::report::{DiagnosticKind, Severity, ValidationReport};
use regex::Regex;
use std::collections::HashMap;

const TEMPLATE_VARIABLE_PATTERN: &str = r"\{[^}]*\}";

pub(super) fn validate_paths(document: &Document, report: &mut ValidationReport) {
    let variable = Regex::new(TEMPLATE_VARIABLE_PATTERN).expect("Invalid regex constant");
    let paths = JsonPointer::root().push("paths");
    let mut shapes: HashMap<String, &str> = HashMap::new();

    for (path, item) in &document.paths {
        let at = paths.push(path);
        let Some(variables) = template_variables(path, &at, report) else {
            continue;
        };

        let shape = variable.replace_all(path, "{}").into_owned();
        match shapes.get(&shape) {
            Some(existing) => report.error(
                DiagnosticKind::ConflictingPaths,
                at.clone(),
                format!("path '{}' is equivalent to '{}'", path, existing),
            ),
            None => {
                shapes.insert(shape, path);
            }
        }

        validate_path_parameters(path, item, &variables, report);
    }

    for item in path_items(document) {
        duplicate_parameters(&item.parameters, item.document.as_deref(), report);
        for operation in item.operations.values() {
            duplicate_parameters(&operation.parameters, operation.document.as_deref(), report);
        }
    }
}

/// Extracts template variable names from a path key, reporting malformed keys.
fn template_variables(
    path: &str,
    at: &JsonPointer,
    report: &mut ValidationReport,
) -> Option<Vec<String>> {
    let invalid = |report: &mut ValidationReport, problem: String| {
        report.error(
            DiagnosticKind::InvalidPathTemplate,
            at.clone(),
            format!("path '{}' {}", path, problem),
        );
        None
    };

    if !path.starts_with('/') {
        return invalid(report, "must start with '/'".into());
    }

    let mut variables: Vec<String> = Vec::new();
    let mut open: Option<String> = None;
    for ch in path.chars() {
        match ch {
            '{' => {
                if open.is_some() {
                    return invalid(report, "contains a nested '{'".into());
                }
                open = Some(String::new());
            }
            '}' => {
                let Some(name) = open.take() else {
                    return invalid(report, "contains an unmatched '}'".into());
                };
                if name.is_empty() {
                    return invalid(report, "contains an empty template variable".into());
                }
                if variables.contains(&name) {
                    return invalid(
                        report,
                        format!("uses template variable '{}' more than once", name),
                    );
                }
                variables.push(name);
            }
            other => {
                if let Some(name) = open.as_mut() {
                    name.push(other);
                }
            }
        }
    }
    if open.is_some() {
        return invalid(report, "contains an unclosed '{'".into());
    }
    Some(variables)
}

fn validate_path_parameters(
    path: &str,
    item: &PathItem,
    variables: &[String],
    report: &mut ValidationReport,
) {
    for operation in item.operations.values() {
        let effective = item.effective_parameters(operation);
        for variable in variables {
            let declared = effective
                .iter()
                .any(|p| p.location == ParameterLocation::Path && &p.name == variable);
            if !declared {
                emit(
                    report,
                    Severity::Error,
                    DiagnosticKind::UndeclaredPathParameter,
                    operation.document.as_deref(),
                    &operation.location,
                    format!(
                        "{} {} does not declare path parameter '{}'",
                        operation.method, path, variable
                    ),
                );
            }
        }
    }

    let declared = item
        .parameters
        .iter()
        .map(|p| (p, item.document.as_deref()))
        .chain(item.operations.values().flat_map(|op| {
            op.parameters
                .iter()
                .map(move |p| (p, op.document.as_deref()))
        }));
    for (param, document) in declared {
        if param.location != ParameterLocation::Path {
            continue;
        }
        if !variables.contains(&param.name) {
            emit(
                report,
                Severity::Error,
                DiagnosticKind::UnusedPathParameter,
                document,
                &param.location_pointer,
                format!(
                    "path parameter '{}' does not appear in path '{}'",
                    param.name, path
                ),
            );
        }
        if !param.required {
            emit(
                report,
                Severity::Error,
                DiagnosticKind::OptionalPathParameter,
                document,
                &param.location_pointer,
                format!("path parameter '{}' must be marked 'required: true'", param.name),
            );
        }
    }
}

fn duplicate_parameters(
    parameters: &[Parameter],
    document: Option<&str>,
    report: &mut ValidationReport,
) {
    for (idx, param) in parameters.iter().enumerate() {
        if parameters[..idx].iter().any(|earlier| earlier.same_identity(param)) {
            emit(
                report,
                Severity::Error,
                DiagnosticKind::DuplicateParameter,
                document,
                &param.location_pointer,
                format!(
                    "{} parameter '{}' is declared more than once",
                    param.location, param.name
                ),
            );
        }
    }
}
