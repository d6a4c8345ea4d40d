//! Security requirements against declared Security Schemes.

use super::{all_operations, emit};
use crate::oas::models::{Document, SecurityRequirement};
use crate::oas::report::{DiagnosticKind, Severity, ValidationReport};
use crate::oas::version::SpecVersion;

pub(super) fn validate_security(document: &Document, report: &mut ValidationReport) {
    for requirement in &document.security {
        check_requirement(document, requirement, None, report);
    }
    for operation in all_operations(document) {
        for requirement in operation.security.iter().flatten() {
            check_requirement(document, requirement, operation.document.as_deref(), report);
        }
    }
}

fn check_requirement(
    document: &Document,
    requirement: &SecurityRequirement,
    origin: Option<&str>,
    report: &mut ValidationReport,
) {
    for (name, scopes) in &requirement.schemes {
        let at = requirement.location.push(name);
        match document.components.security_schemes.get(name) {
            None if !document.components.declares("securitySchemes", name) => emit(
                report,
                Severity::Error,
                DiagnosticKind::UnknownSecurityScheme,
                origin,
                &at,
                format!("security requirement references undeclared scheme '{}'", name),
            ),
            Some(scheme)
                if document.version == SpecVersion::V3_0
                    && !scheme.kind.uses_scopes()
                    && !scopes.is_empty() =>
            {
                emit(
                    report,
                    Severity::Warning,
                    DiagnosticKind::InvalidScopes,
                    origin,
                    &at,
                    format!(
                        "scheme '{}' does not use scopes; its list must be empty in OpenAPI 3.0",
                        name
                    ),
                )
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::validate;
    use crate::importer::parse_openapi_document;
    use crate::oas::report::{DiagnosticKind, Severity};

    const SECURED: &str = r#"
info: {title: t, version: v}
security:
  - apiKey: [admin]
  - {}
paths:
  /a:
    get:
      security:
        - oauth: [read]
        - missing: []
      responses:
        "200": {description: ok}
components:
  securitySchemes:
    apiKey: {type: apiKey, name: key, in: query}
    oauth:
      type: oauth2
      flows:
        clientCredentials:
          tokenUrl: https://auth.example.com/token
          scopes: {read: Read}
"#;

    #[test]
    fn test_security_requirements_3_0() {
        let report = validate(&format!("openapi: 3.0.3{}", SECURED));
        let unknown: Vec<String> = report
            .of_kind(DiagnosticKind::UnknownSecurityScheme)
            .map(|d| d.pointer.to_string())
            .collect();
        assert_eq!(unknown, vec!["#/paths/~1a/get/security/1/missing"]);

        let scopes: Vec<_> = report.of_kind(DiagnosticKind::InvalidScopes).collect();
        assert_eq!(scopes.len(), 1);
        assert_eq!(scopes[0].severity, Severity::Warning);
        assert_eq!(scopes[0].pointer.to_string(), "#/security/0/apiKey");
    }

    #[test]
    fn test_role_lists_allowed_in_3_1() {
        let report = validate(&format!("openapi: 3.1.0{}", SECURED));
        assert_eq!(report.of_kind(DiagnosticKind::InvalidScopes).count(), 0);
        assert_eq!(report.of_kind(DiagnosticKind::UnknownSecurityScheme).count(), 1);
    }

    #[test]
    fn test_malformed_scheme_is_still_declared() {
        let result = parse_openapi_document(
            r#"
openapi: 3.0.3
info: {title: t, version: v}
security:
  - key: []
paths: {}
components:
  securitySchemes:
    key: {type: apiKey, in: header}
"#,
        )
        .unwrap();
        let report = result.report();
        assert!(result.document().components.security_schemes.is_empty());
        assert_eq!(report.of_kind(DiagnosticKind::MissingField).count(), 1, "{report}");
        assert_eq!(report.of_kind(DiagnosticKind::UnknownSecurityScheme).count(), 0);
    }
}
