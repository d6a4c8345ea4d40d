//! # Importer
//!
//! Public entry points tying the pipeline together:
//! text → loader → version detection → binder → validator → [`ImportResult`].

use crate::config::ImportOptions;
use crate::error::{AppError, AppResult};
use crate::loader::{load_document, SourceFormat};
use crate::oas::binder::bind_document;
use crate::oas::models::{Components, Document};
use crate::oas::registry::{DocumentRegistry, DEFAULT_ENTRY_URI};
use crate::oas::report::ValidationReport;
use crate::oas::validation::validate_document;
use crate::oas::version::detect_version;
use log::{debug, info};

/// Imports OpenAPI documents with a fixed set of options and registered documents.
#[derive(Debug, Clone, Default)]
pub struct Importer {
    options: ImportOptions,
    registry: DocumentRegistry,
}

impl Importer {
    /// Creates an importer with no registered documents.
    pub fn new(options: ImportOptions) -> Self {
        Self {
            options,
            registry: DocumentRegistry::new(),
        }
    }

    /// The options every import uses.
    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Makes a document available to cross-document references.
    ///
    /// # Errors
    ///
    /// Fails if `text` cannot be loaded or `uri` is already registered.
    pub fn register_document(&mut self, uri: &str, text: &str) -> AppResult<()> {
        self.registry.register(uri, text)
    }

    /// Documents available to cross-document references.
    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    /// Imports `text` as the entry document.
    ///
    /// # Errors
    ///
    /// * `AppError::Syntax` / `AppError::Structure` - the text cannot be loaded.
    /// * `AppError::Unsupported` - the `openapi` version is missing or unsupported.
    /// * `AppError::Validation` - strict mode only, the report failed.
    pub fn import(&self, text: &str) -> AppResult<ImportResult> {
        let loaded = load_document(text)?;
        let format = loaded.format;
        let (version, declared) = detect_version(&loaded.root)?;
        let entry_uri = self.options.base_uri.as_deref().unwrap_or(DEFAULT_ENTRY_URI);
        info!("importing {} document {} (OpenAPI {})", format, entry_uri, declared);

        let mut registry = self.registry.clone();
        let entry = registry.replace(entry_uri, loaded)?;
        let (document, mut report) =
            bind_document(&registry, &entry, &self.options, version, &declared)?;

        if self.options.validate {
            validate_document(&document, &mut report);
        } else {
            debug!("semantic validation disabled");
        }

        info!(
            "imported {}: {} errors, {} warnings",
            entry_uri,
            report.errors().count(),
            report.warnings().count()
        );

        if self.options.strict
            && (report.has_errors() || (self.options.warnings_as_errors && report.has_warnings()))
        {
            return Err(AppError::Validation(report));
        }

        Ok(ImportResult {
            format,
            document,
            report,
        })
    }
}

/// Imports `text` with default options.
pub fn parse_openapi_document(text: &str) -> AppResult<ImportResult> {
    parse_openapi_document_with_options(text, &ImportOptions::default())
}

/// Imports `text` with the given options and no registered documents.
pub fn parse_openapi_document_with_options(
    text: &str,
    options: &ImportOptions,
) -> AppResult<ImportResult> {
    Importer::new(options.clone()).import(text)
}

/// A bound document together with everything found while importing it.
#[derive(Debug, Clone)]
pub struct ImportResult {
    format: SourceFormat,
    document: Document,
    report: ValidationReport,
}

impl ImportResult {
    /// The bound document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Diagnostics from binding and validation.
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// The Components Object of the document.
    pub fn components(&self) -> &Components {
        self.document.components()
    }

    /// Format the entry document was written in.
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// True when the report holds no errors.
    pub fn is_valid(&self) -> bool {
        !self.report.has_errors()
    }

    /// Splits the result into its document and report.
    pub fn into_parts(self) -> (Document, ValidationReport) {
        (self.document, self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::report::DiagnosticKind;

    const DUPLICATE_IDS: &str = r#"
openapi: 3.0.3
info: {title: t, version: v}
paths:
  /a:
    get:
      operationId: same
      responses:
        "200": {description: ok}
  /b:
    get:
      operationId: same
      responses:
        "200": {description: ok}
"#;

    #[test]
    fn test_parse_minimal() {
        let result = parse_openapi_document(
            r#"{"openapi": "3.1.0", "info": {"title": "t", "version": "1"}, "components": {}}"#,
        )
        .unwrap();
        assert_eq!(result.format(), SourceFormat::Json);
        assert!(result.is_valid(), "{}", result.report());
        assert!(result.components().is_empty());
    }

    #[test]
    fn test_non_strict_keeps_errors_in_report() {
        let result = parse_openapi_document(DUPLICATE_IDS).unwrap();
        assert!(!result.is_valid());
        assert_eq!(
            result
                .report()
                .of_kind(DiagnosticKind::DuplicateOperationId)
                .count(),
            1
        );
    }

    #[test]
    fn test_strict_mode_fails() {
        let options = ImportOptions::default().with_strict(true);
        match parse_openapi_document_with_options(DUPLICATE_IDS, &options) {
            Err(AppError::Validation(report)) => assert!(report.has_errors()),
            other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_strict_mode_with_warnings() {
        let text = r#"
openapi: 3.0.3
info: {title: t, version: v}
paths: {}
components:
  schemas:
    Closed:
      type: object
      additionalProperties: false
      required: [missing]
"#;
        let lenient = ImportOptions::default().with_strict(true);
        assert!(parse_openapi_document_with_options(text, &lenient).is_ok());

        let strict = lenient.with_warnings_as_errors(true);
        assert!(matches!(
            parse_openapi_document_with_options(text, &strict),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let options = ImportOptions::default().with_validation(false);
        let result = parse_openapi_document_with_options(DUPLICATE_IDS, &options).unwrap();
        assert!(result.report().is_empty());
    }

    #[test]
    fn test_unsupported_versions() {
        assert!(matches!(
            parse_openapi_document("swagger: '2.0'\ninfo: {title: t, version: v}\npaths: {}"),
            Err(AppError::Unsupported(_))
        ));
        assert!(matches!(
            parse_openapi_document("info: {title: t, version: v}"),
            Err(AppError::Unsupported(_))
        ));
    }

    #[test]
    fn test_registered_documents_resolve() {
        let mut importer = Importer::new(
            ImportOptions::default().with_base_uri("https://api.example.com/openapi.yaml"),
        );
        importer
            .register_document(
                "https://api.example.com/common.yaml",
                "components:\n  schemas:\n    Id: {type: string}\n",
            )
            .unwrap();
        assert_eq!(importer.registry().len(), 1);

        let result = importer
            .import(
                r#"
openapi: 3.1.0
info: {title: t, version: v}
components:
  schemas:
    Ref: {$ref: "common.yaml#/components/schemas/Id"}
"#,
            )
            .unwrap();
        assert!(result.is_valid(), "{}", result.report());
        let (document, _) = result.into_parts();
        let id = document.components.schemas["Ref"];
        let target = document.schemas.resolve(id).unwrap();
        assert_eq!(
            document.schemas[target].document.as_deref(),
            Some("https://api.example.com/common.yaml")
        );

        // The importer's own registry is untouched by the import.
        assert_eq!(importer.registry().len(), 1);
    }
}
