//! Operation ids and Responses Objects.

use super::{all_operations, emit};
use crate::oas::models::{Document, Operation};
use crate::oas::report::{DiagnosticKind, Severity, ValidationReport};
use regex::Regex;
use std::collections::HashMap;

const RESPONSE_CODE_PATTERN: &str = r"^(default|[1-5](?:[0-9]{2}|XX))$";

pub(super) fn validate_operations(document: &Document, report: &mut ValidationReport) {
    let mut seen: HashMap<&str, &Operation> = HashMap::new();
    for (_, operation) in document.operations().chain(document.webhook_operations()) {
        let Some(id) = operation.operation_id.as_deref() else {
            continue;
        };
        match seen.get(id) {
            Some(first) => emit(
                report,
                Severity::Error,
                DiagnosticKind::DuplicateOperationId,
                operation.document.as_deref(),
                &operation.location,
                format!(
                    "operationId '{}' is already used by {} {}",
                    id, first.method, first.path
                ),
            ),
            None => {
                seen.insert(id, operation);
            }
        }
    }

    let code = Regex::new(RESPONSE_CODE_PATTERN).expect("Invalid regex constant");
    for operation in all_operations(document) {
        let Some(responses) = &operation.responses else {
            continue;
        };
        let at = operation.location.push("responses");
        let origin = operation.document.as_deref();
        if responses.is_empty() {
            emit(
                report,
                Severity::Error,
                DiagnosticKind::EmptyResponses,
                origin,
                &at,
                format!(
                    "{} {} must define at least one response",
                    operation.method, operation.path
                ),
            );
        }
        for key in responses.keys() {
            if !code.is_match(key) {
                emit(
                    report,
                    Severity::Error,
                    DiagnosticKind::InvalidResponseCode,
                    origin,
                    &at.push(key),
                    format!("'{}' is not a valid response code", key),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::validate;
    use crate::oas::report::DiagnosticKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_operation_ids_across_webhooks() {
        let report = validate(
            r#"
openapi: 3.1.0
info: {title: t, version: v}
paths:
  /a:
    get:
      operationId: fetch
      responses:
        "200": {description: ok}
  /b:
    get:
      operationId: fetch
      responses:
        "200": {description: ok}
webhooks:
  ping:
    post:
      operationId: fetch
"#,
        );
        let duplicates: Vec<String> = report
            .of_kind(DiagnosticKind::DuplicateOperationId)
            .map(|d| d.pointer.to_string())
            .collect();
        assert_eq!(duplicates, vec!["#/paths/~1b/get", "#/webhooks/ping/post"]);
        assert!(duplicates.len() == report.len());
    }

    #[test]
    fn test_response_codes() {
        let report = validate(
            r#"
openapi: 3.0.3
info: {title: t, version: v}
paths:
  /a:
    get:
      responses:
        default: {description: any}
        "200": {description: ok}
        "2XX": {description: ok}
        "600": {description: bad}
        "20": {description: bad}
        "2xx": {description: bad}
    put:
      responses: {}
"#,
        );
        let invalid: Vec<String> = report
            .of_kind(DiagnosticKind::InvalidResponseCode)
            .map(|d| d.pointer.last().unwrap_or_default())
            .collect();
        assert_eq!(invalid, vec!["600", "20", "2xx"]);
        assert_eq!(report.of_kind(DiagnosticKind::EmptyResponses).count(), 1);
    }
}
