//! Tags, component keys and Server Objects.

use super::{all_operations, emit, path_items};
use crate::oas::models::{Document, Server};
use crate::oas::pointer::JsonPointer;
use crate::oas::report::{DiagnosticKind, Severity, ValidationReport};
use regex::Regex;
use std::collections::HashSet;
use url::Url;

const COMPONENT_KEY_PATTERN: &str = r"^[a-zA-Z0-9._-]+$";
const SERVER_VARIABLE_PATTERN: &str = r"\{([^}]+)}";

pub(super) fn validate_tags(document: &Document, report: &mut ValidationReport) {
    let tags = JsonPointer::root().push("tags");
    let mut seen = HashSet::new();
    for (idx, tag) in document.tags.iter().enumerate() {
        if !seen.insert(tag.name.as_str()) {
            report.error(
                DiagnosticKind::DuplicateTag,
                tags.push(idx.to_string()),
                format!("tag '{}' is declared more than once", tag.name),
            );
        }
    }
}

pub(super) fn validate_component_keys(document: &Document, report: &mut ValidationReport) {
    let key_re = Regex::new(COMPONENT_KEY_PATTERN).expect("Invalid regex constant");
    let components = JsonPointer::root().push("components");
    for (section, keys) in &document.components.raw_keys {
        for key in keys {
            if !key_re.is_match(key) {
                report.error(
                    DiagnosticKind::InvalidComponentKey,
                    components.push(section).push(key),
                    format!(
                        "component key '{}' in '{}' must match {}",
                        key, section, COMPONENT_KEY_PATTERN
                    ),
                );
            }
        }
    }
}

pub(super) fn validate_servers(document: &Document, report: &mut ValidationReport) {
    let placeholder = Regex::new(SERVER_VARIABLE_PATTERN).expect("Invalid regex constant");
    for server in &document.servers {
        validate_server(server, None, &placeholder, report);
    }
    for item in path_items(document) {
        for server in &item.servers {
            validate_server(server, item.document.as_deref(), &placeholder, report);
        }
    }
    for operation in all_operations(document) {
        for server in &operation.servers {
            validate_server(server, operation.document.as_deref(), &placeholder, report);
        }
    }
}

fn validate_server(
    server: &Server,
    origin: Option<&str>,
    placeholder: &Regex,
    report: &mut ValidationReport,
) {
    let mut invalid = |at: &JsonPointer, message: String| {
        emit(
            report,
            Severity::Error,
            DiagnosticKind::InvalidServer,
            origin,
            at,
            message,
        )
    };

    let url_at = server.location.push("url");
    let has_query = server.url.contains('?') || server.url.contains('#');
    let parsed_query = Url::parse(&server.url)
        .map(|parsed| parsed.query().is_some() || parsed.fragment().is_some())
        .unwrap_or(false);
    if has_query || parsed_query {
        invalid(
            &url_at,
            format!("server URL '{}' must not include a query or fragment", server.url),
        );
    }

    for cap in placeholder.captures_iter(&server.url) {
        let name = &cap[1];
        if !server.variables.contains_key(name) {
            invalid(
                &url_at,
                format!(
                    "server URL '{}' references undefined variable '{}'",
                    server.url, name
                ),
            );
        }
    }

    let variables = server.location.push("variables");
    for (name, variable) in &server.variables {
        let Some(values) = &variable.enum_values else {
            continue;
        };
        let at = variables.push(name);
        if values.is_empty() {
            invalid(
                &at.push("enum"),
                format!("server variable '{}' has an empty enum", name),
            );
        } else if !values.contains(&variable.default) {
            invalid(
                &at.push("default"),
                format!(
                    "default '{}' of server variable '{}' is not one of its enum values",
                    variable.default, name
                ),
            );
        }
    }
}
