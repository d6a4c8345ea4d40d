//! # Diagnostic Report
//!
//! Accumulates findings from binding and validation. Nothing in here stops
//! processing; callers decide what a failing report means.

use crate::oas::pointer::JsonPointer;
use derive_more::Display;
use serde::Serialize;
use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious, but the document is still usable.
    #[display("warning")]
    Warning,
    /// The document violates the OpenAPI specification.
    #[display("error")]
    Error,
}

/// Category of a diagnostic.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A required field is absent.
    #[display("missing-field")]
    MissingField,
    /// A field holds the wrong JSON type or an unknown keyword value.
    #[display("unexpected-type")]
    UnexpectedType,
    /// A construct not available in the declared OpenAPI version.
    #[display("unsupported-feature")]
    UnsupportedFeature,
    /// A `$ref` whose target cannot be located.
    #[display("unresolved-reference")]
    UnresolvedReference,
    /// A cross-document `$ref` left unresolved by configuration.
    #[display("external-reference")]
    ExternalReference,
    /// A `$ref` chain that never reaches a concrete object.
    #[display("cyclic-reference")]
    CyclicReference,
    /// Nesting or reference chains deeper than the configured limit.
    #[display("depth-limit-exceeded")]
    DepthLimitExceeded,
    /// Two operations share an `operationId`.
    #[display("duplicate-operation-id")]
    DuplicateOperationId,
    /// A path parameter declared but absent from the path template.
    #[display("unused-path-parameter")]
    UnusedPathParameter,
    /// A template variable without a matching path parameter.
    #[display("undeclared-path-parameter")]
    UndeclaredPathParameter,
    /// A path parameter that is not `required: true`.
    #[display("optional-path-parameter")]
    OptionalPathParameter,
    /// The same parameter name and location listed twice.
    #[display("duplicate-parameter")]
    DuplicateParameter,
    /// A malformed path key or template.
    #[display("invalid-path-template")]
    InvalidPathTemplate,
    /// Two path templates with the same shape.
    #[display("conflicting-paths")]
    ConflictingPaths,
    /// An operation without responses.
    #[display("empty-responses")]
    EmptyResponses,
    /// A response key that is not a valid status code.
    #[display("invalid-response-code")]
    InvalidResponseCode,
    /// A security requirement naming an undeclared scheme.
    #[display("unknown-security-scheme")]
    UnknownSecurityScheme,
    /// Scopes listed for a scheme that does not use them.
    #[display("invalid-scopes")]
    InvalidScopes,
    /// Two tags with the same name.
    #[display("duplicate-tag")]
    DuplicateTag,
    /// A component key outside `^[a-zA-Z0-9._-]+$`.
    #[display("invalid-component-key")]
    InvalidComponentKey,
    /// A Server Object with an invalid URL or variables.
    #[display("invalid-server")]
    InvalidServer,
    /// A discriminator that does not match its alternatives.
    #[display("invalid-discriminator")]
    InvalidDiscriminator,
    /// A `required` entry naming a property that can never be present.
    #[display("unknown-required-property")]
    UnknownRequiredProperty,
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Category.
    pub kind: DiagnosticKind,
    /// URI of the document the finding lives in; `None` for the entry document.
    pub document: Option<String>,
    /// Location of the offending node.
    pub pointer: JsonPointer,
    /// Human readable explanation.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic located in the entry document.
    pub fn new(
        severity: Severity,
        kind: DiagnosticKind,
        pointer: JsonPointer,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            document: None,
            pointer,
            message: message.into(),
        }
    }

    /// Attaches the URI of a secondary document.
    pub fn in_document(mut self, document: Option<String>) -> Self {
        self.document = document;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] ", self.severity, self.kind)?;
        if let Some(document) = &self.document {
            write!(f, "{}", document)?;
        }
        write!(f, "{}: {}", self.pointer, self.message)
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Appends an error located in the entry document.
    pub fn error(&mut self, kind: DiagnosticKind, pointer: JsonPointer, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Error, kind, pointer, message));
    }

    /// Appends a warning located in the entry document.
    pub fn warning(
        &mut self,
        kind: DiagnosticKind,
        pointer: JsonPointer,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic::new(Severity::Warning, kind, pointer, message));
    }

    /// Moves every diagnostic of `other` into this report.
    pub fn extend(&mut self, other: ValidationReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// True if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// True if any diagnostic is a warning.
    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }

    /// Error diagnostics in insertion order.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Warning diagnostics in insertion order.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Diagnostics of one category.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    /// All diagnostics.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// True when nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, diagnostic) in self.diagnostics.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accumulates() {
        let mut report = ValidationReport::new();
        assert!(report.is_empty());

        report.error(
            DiagnosticKind::DuplicateOperationId,
            JsonPointer::root().push("paths").push("/a").push("get"),
            "operationId 'list' is already used",
        );
        report.warning(
            DiagnosticKind::ExternalReference,
            JsonPointer::root().push("components"),
            "skipped",
        );

        assert_eq!(report.len(), 2);
        assert!(report.has_errors());
        assert!(report.has_warnings());
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(report.of_kind(DiagnosticKind::ExternalReference).count(), 1);
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::new(
            Severity::Error,
            DiagnosticKind::DuplicateOperationId,
            JsonPointer::root().push("paths").push("/a").push("get"),
            "operationId 'list' is already used",
        );
        assert_eq!(
            diagnostic.to_string(),
            "error[duplicate-operation-id] #/paths/~1a/get: operationId 'list' is already used"
        );

        let external = diagnostic.in_document(Some("http://example.invalid/common.yaml".into()));
        assert!(external
            .to_string()
            .contains("http://example.invalid/common.yaml#/paths"));
    }

    #[test]
    fn test_report_display_one_per_line() {
        let mut report = ValidationReport::new();
        report.error(DiagnosticKind::MissingField, JsonPointer::root(), "a");
        report.error(DiagnosticKind::MissingField, JsonPointer::root(), "b");
        assert_eq!(
            report.to_string(),
            "error[missing-field] #: a\nerror[missing-field] #: b"
        );
    }
}
