//! # Binder
//!
//! Turns the generic node tree of a registered document into the typed
//! [`Document`] model.
//!
//! - **schemas**: Schema Objects into the [`SchemaGraph`] arena, with `$ref` edges.
//! - **operations**: Path Items, Operations and everything hanging off them.
//! - **components**: The Components Object and Security Schemes.
//!
//! Binding never fails on document content: malformed nodes are reported to
//! the [`ValidationReport`] and skipped.

mod components;
mod operations;
mod schemas;

use crate::config::ImportOptions;
use crate::error::{AppError, AppResult};
use crate::loader::value_kind;
use crate::oas::models::{
    Components, Contact, Document, ExternalDocs, Info, License, PathItem, SecurityRequirement,
    Server, ServerVariable, Tag,
};
use crate::oas::pointer::{decode_pointer_segment, parse_reference, resolve_pointer, JsonPointer};
use crate::oas::registry::{display_uri, DocumentRegistry, RegisteredDocument};
use crate::oas::report::{Diagnostic, DiagnosticKind, Severity, ValidationReport};
use crate::oas::schema::{SchemaGraph, SchemaId};
use crate::oas::version::SpecVersion;
use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Binds the registered document `entry_uri` into a [`Document`].
///
/// `declared` is the `openapi` field text returned by version detection.
///
/// # Errors
///
/// Fails only if `entry_uri` is not registered or its root is not an object.
pub fn bind_document(
    registry: &DocumentRegistry,
    entry_uri: &str,
    options: &ImportOptions,
    version: SpecVersion,
    declared: &str,
) -> AppResult<(Document, ValidationReport)> {
    let entry = registry.get(entry_uri).ok_or_else(|| {
        AppError::General(format!("Entry document '{}' is not registered", entry_uri))
    })?;
    let root = entry.root.as_object().ok_or_else(|| {
        AppError::Structure(format!(
            "document root must be an object, found {}",
            value_kind(&entry.root)
        ))
    })?;

    let mut binder = Binder {
        registry,
        entry,
        options,
        version,
        graph: SchemaGraph::default(),
        memo: HashMap::new(),
        report: ValidationReport::new(),
        depth: 0,
        in_progress: HashSet::new(),
    };
    let document = binder.bind_root(root, declared);
    debug!(
        "bound {} (OpenAPI {}): {} paths, {} schemas, {} diagnostics",
        entry.uri,
        version,
        document.paths.len(),
        document.schemas.len(),
        binder.report.len()
    );
    Ok((document, binder.report))
}

/// The document a node is read from.
#[derive(Clone, Copy)]
struct Scope<'r> {
    doc: &'r RegisteredDocument,
}

/// A node located through a `$ref`.
struct Located<'r> {
    scope: Scope<'r>,
    pointer: JsonPointer,
    value: &'r Value,
}

/// A non-schema object after its `$ref` chain has been followed.
struct Resolved<'r> {
    scope: Scope<'r>,
    pointer: JsonPointer,
    value: &'r Value,
    reference: Option<String>,
}

#[derive(Clone, Copy)]
enum SchemaSlot {
    Binding(SchemaId),
    Bound(SchemaId),
}

impl SchemaSlot {
    fn id(self) -> SchemaId {
        match self {
            SchemaSlot::Binding(id) | SchemaSlot::Bound(id) => id,
        }
    }
}

struct Binder<'r> {
    registry: &'r DocumentRegistry,
    entry: &'r RegisteredDocument,
    options: &'r ImportOptions,
    version: SpecVersion,
    graph: SchemaGraph,
    /// Schema locations (`uri#pointer`) already allocated in the graph.
    memo: HashMap<String, SchemaSlot>,
    report: ValidationReport,
    depth: usize,
    /// Path items and callbacks (`uri#pointer`) currently being bound.
    in_progress: HashSet<String>,
}

fn slot_key(scope: Scope<'_>, pointer: &JsonPointer) -> String {
    format!("{}#{}", scope.doc.uri, pointer.as_str())
}

fn extensions(map: &Map<String, Value>) -> IndexMap<String, Value> {
    map.iter()
        .filter(|(key, _)| key.starts_with("x-"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

impl<'r> Binder<'r> {
    fn bind_root(&mut self, root: &'r Map<String, Value>, declared: &str) -> Document {
        let scope = Scope { doc: self.entry };
        let pointer = JsonPointer::root();

        if matches!(root.get("openapi"), Some(Value::Number(_))) {
            self.warning(
                scope,
                DiagnosticKind::UnsupportedFeature,
                &pointer.push("openapi"),
                format!("'openapi' should be a string; read as '{}'", declared),
            );
        }

        let info = self.bind_info(scope, root.get("info"), &pointer);
        let json_schema_dialect = if self.version.is_json_schema_aligned() {
            self.string(scope, root, "jsonSchemaDialect", &pointer)
        } else {
            self.unsupported_field(scope, root, "jsonSchemaDialect", &pointer);
            None
        };
        let servers = self.bind_servers(scope, root.get("servers"), &pointer.push("servers"));

        // Components go first so named schemas are known before paths reference them.
        let components = match root.get("components") {
            Some(value) => self.bind_components(scope, value, pointer.push("components")),
            None => Components::default(),
        };

        let paths = match root.get("paths") {
            Some(value) => self.bind_paths(scope, value, &pointer.push("paths")),
            None => {
                if self.version.requires_paths() {
                    self.error(
                        scope,
                        DiagnosticKind::MissingField,
                        &pointer,
                        "document is missing required field 'paths'",
                    );
                }
                IndexMap::new()
            }
        };

        let webhooks = match root.get("webhooks") {
            Some(value) if self.version.supports_webhooks() => {
                self.bind_paths(scope, value, &pointer.push("webhooks"))
            }
            Some(_) => {
                self.unsupported_field(scope, root, "webhooks", &pointer);
                IndexMap::new()
            }
            None => IndexMap::new(),
        };

        if !self.version.requires_paths()
            && !["paths", "components", "webhooks"]
                .iter()
                .any(|key| root.contains_key(*key))
        {
            self.error(
                scope,
                DiagnosticKind::MissingField,
                &pointer,
                "document must define at least one of 'paths', 'components' or 'webhooks'",
            );
        }

        let security = match root.get("security") {
            Some(value) => self.bind_security(scope, value, &pointer.push("security")),
            None => Vec::new(),
        };
        let tags = self.bind_tags(scope, root.get("tags"), &pointer.push("tags"));
        let external_docs = root
            .get("externalDocs")
            .and_then(|value| self.bind_external_docs(scope, value, &pointer.push("externalDocs")));

        Document {
            openapi: declared.to_string(),
            version: self.version,
            info,
            json_schema_dialect,
            servers,
            paths,
            webhooks,
            components,
            security,
            tags,
            external_docs,
            extensions: extensions(root),
            schemas: std::mem::take(&mut self.graph),
        }
    }

    fn bind_paths(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: &JsonPointer,
    ) -> IndexMap<String, PathItem> {
        let mut paths = IndexMap::new();
        let Some(map) = self.object(scope, value, pointer, "paths") else {
            return paths;
        };
        for (key, item) in map {
            if key.starts_with("x-") {
                continue;
            }
            if let Some(item) = self.bind_path_item(scope, item, pointer.push(key), key) {
                paths.insert(key.clone(), item);
            }
        }
        paths
    }

    fn bind_info(&mut self, scope: Scope<'r>, value: Option<&'r Value>, root: &JsonPointer) -> Info {
        let Some(value) = value else {
            self.error(
                scope,
                DiagnosticKind::MissingField,
                root,
                "document is missing required field 'info'",
            );
            return Info::default();
        };
        let pointer = root.push("info");
        let Some(map) = self.object(scope, value, &pointer, "info") else {
            return Info::default();
        };

        let summary = if self.version.is_json_schema_aligned() {
            self.string(scope, map, "summary", &pointer)
        } else {
            None
        };
        let contact = self.field_object(scope, map, "contact", &pointer).map(|contact| {
            let at = pointer.push("contact");
            Contact {
                name: self.string(scope, contact, "name", &at),
                url: self.string(scope, contact, "url", &at),
                email: self.string(scope, contact, "email", &at),
            }
        });
        let license = self.field_object(scope, map, "license", &pointer).map(|license| {
            let at = pointer.push("license");
            License {
                name: self
                    .required_string(scope, license, "name", &at, "license")
                    .unwrap_or_default(),
                identifier: if self.version.is_json_schema_aligned() {
                    self.string(scope, license, "identifier", &at)
                } else {
                    None
                },
                url: self.string(scope, license, "url", &at),
            }
        });

        Info {
            title: self
                .required_string(scope, map, "title", &pointer, "info")
                .unwrap_or_default(),
            version: self
                .required_string(scope, map, "version", &pointer, "info")
                .unwrap_or_default(),
            summary,
            description: self.string(scope, map, "description", &pointer),
            terms_of_service: self.string(scope, map, "termsOfService", &pointer),
            contact,
            license,
        }
    }

    fn bind_servers(
        &mut self,
        scope: Scope<'r>,
        value: Option<&'r Value>,
        pointer: &JsonPointer,
    ) -> Vec<Server> {
        let Some(value) = value else {
            return Vec::new();
        };
        let mut servers = Vec::new();
        for (idx, entry) in self.array(scope, value, pointer, "servers").iter().enumerate() {
            let at = pointer.push(idx.to_string());
            let Some(map) = self.object(scope, entry, &at, "server") else {
                continue;
            };
            let Some(url) = self.required_string(scope, map, "url", &at, "server") else {
                continue;
            };
            let mut variables = IndexMap::new();
            if let Some(vars) = self.field_object(scope, map, "variables", &at) {
                let vars_at = at.push("variables");
                for (name, var) in vars {
                    let var_at = vars_at.push(name);
                    let Some(var) = self.object(scope, var, &var_at, "server variable") else {
                        continue;
                    };
                    let enum_values = var
                        .contains_key("enum")
                        .then(|| self.strings(scope, var, "enum", &var_at));
                    variables.insert(
                        name.clone(),
                        ServerVariable {
                            default: self
                                .required_string(scope, var, "default", &var_at, "server variable")
                                .unwrap_or_default(),
                            enum_values,
                            description: self.string(scope, var, "description", &var_at),
                        },
                    );
                }
            }
            servers.push(Server {
                url,
                description: self.string(scope, map, "description", &at),
                variables,
                location: at,
            });
        }
        servers
    }

    fn bind_security(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: &JsonPointer,
    ) -> Vec<SecurityRequirement> {
        let mut requirements = Vec::new();
        for (idx, entry) in self.array(scope, value, pointer, "security").iter().enumerate() {
            let at = pointer.push(idx.to_string());
            let Some(map) = self.object(scope, entry, &at, "security requirement") else {
                continue;
            };
            let schemes = map
                .keys()
                .map(|name| (name.clone(), self.strings(scope, map, name, &at)))
                .collect();
            requirements.push(SecurityRequirement {
                schemes,
                location: at,
            });
        }
        requirements
    }

    fn bind_tags(
        &mut self,
        scope: Scope<'r>,
        value: Option<&'r Value>,
        pointer: &JsonPointer,
    ) -> Vec<Tag> {
        let Some(value) = value else {
            return Vec::new();
        };
        let mut tags = Vec::new();
        for (idx, entry) in self.array(scope, value, pointer, "tags").iter().enumerate() {
            let at = pointer.push(idx.to_string());
            let Some(map) = self.object(scope, entry, &at, "tag") else {
                continue;
            };
            let Some(name) = self.required_string(scope, map, "name", &at, "tag") else {
                continue;
            };
            let external_docs = map
                .get("externalDocs")
                .and_then(|docs| self.bind_external_docs(scope, docs, &at.push("externalDocs")));
            tags.push(Tag {
                name,
                description: self.string(scope, map, "description", &at),
                external_docs,
            });
        }
        tags
    }

    fn bind_external_docs(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: &JsonPointer,
    ) -> Option<ExternalDocs> {
        let map = self.object(scope, value, pointer, "externalDocs")?;
        Some(ExternalDocs {
            url: self.required_string(scope, map, "url", pointer, "externalDocs")?,
            description: self.string(scope, map, "description", pointer),
        })
    }

    // --- reference resolution ---

    /// Locates the node a `$ref` written in `scope` points at.
    fn locate(&mut self, scope: Scope<'r>, reference: &str, at: &JsonPointer) -> Option<Located<'r>> {
        let parsed = parse_reference(reference);
        let doc = if parsed.is_local() {
            scope.doc
        } else {
            self.locate_document(scope, parsed.document, reference, at)?
        };

        let pointer = match parsed.fragment {
            None => JsonPointer::root(),
            Some(fragment) => match JsonPointer::parse(fragment) {
                Some(pointer) => pointer,
                None => {
                    let name = decode_pointer_segment(fragment);
                    match doc.anchor(&name) {
                        Some(pointer) => pointer.clone(),
                        None => {
                            self.error(
                                scope,
                                DiagnosticKind::UnresolvedReference,
                                at,
                                format!(
                                    "anchor '{}' referenced by '{}' does not exist",
                                    name, reference
                                ),
                            );
                            return None;
                        }
                    }
                }
            },
        };

        match resolve_pointer(&doc.root, &pointer) {
            Some(value) => {
                trace!("resolved {} to {}{}", reference, doc.uri, pointer);
                Some(Located {
                    scope: Scope { doc },
                    pointer,
                    value,
                })
            }
            None => {
                self.error(
                    scope,
                    DiagnosticKind::UnresolvedReference,
                    at,
                    format!("reference '{}' does not point to an existing node", reference),
                );
                None
            }
        }
    }

    fn locate_document(
        &mut self,
        scope: Scope<'r>,
        document: &str,
        reference: &str,
        at: &JsonPointer,
    ) -> Option<&'r RegisteredDocument> {
        let Ok(url) = scope.doc.base.join(document) else {
            self.error(
                scope,
                DiagnosticKind::UnresolvedReference,
                at,
                format!("reference '{}' is not a valid URI reference", reference),
            );
            return None;
        };
        let registry = self.registry;
        let found = registry.get(url.as_str());
        if let Some(doc) = found {
            if std::ptr::eq(doc, scope.doc) {
                return Some(doc);
            }
        }
        if !self.options.resolve_external {
            self.warning(
                scope,
                DiagnosticKind::ExternalReference,
                at,
                format!("external reference '{}' left unresolved", reference),
            );
            return None;
        }
        match found {
            Some(doc) => {
                debug!("following {} into {}", reference, doc.uri);
                Some(doc)
            }
            None => {
                self.error(
                    scope,
                    DiagnosticKind::UnresolvedReference,
                    at,
                    format!(
                        "document '{}' referenced by '{}' is not registered",
                        display_uri(url.as_str()),
                        reference
                    ),
                );
                None
            }
        }
    }

    /// Follows a chain of Reference Objects to the concrete object.
    ///
    /// The returned node records the first `$ref` of the chain.
    fn resolve_object(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
    ) -> Option<Resolved<'r>> {
        let origin = pointer.clone();
        let mut current = Located {
            scope,
            pointer,
            value,
        };
        let mut reference: Option<String> = None;
        let mut seen = HashSet::new();

        loop {
            let value: &'r Value = current.value;
            let Some(target) = value.get("$ref") else {
                break;
            };
            let at = current.pointer.push("$ref");
            let Some(target) = target.as_str() else {
                self.error(
                    current.scope,
                    DiagnosticKind::UnexpectedType,
                    &at,
                    format!("'$ref' must be a string, found {}", value_kind(target)),
                );
                return None;
            };
            let first = reference.get_or_insert_with(|| target.to_string()).clone();
            if !seen.insert(slot_key(current.scope, &current.pointer)) {
                self.error(
                    scope,
                    DiagnosticKind::CyclicReference,
                    &origin,
                    format!("reference chain starting at '{}' loops back on itself", first),
                );
                return None;
            }
            if seen.len() > self.options.max_depth {
                self.error(
                    scope,
                    DiagnosticKind::DepthLimitExceeded,
                    &origin,
                    format!(
                        "reference chain starting at '{}' exceeds the depth limit of {}",
                        first, self.options.max_depth
                    ),
                );
                return None;
            }
            current = self.locate(current.scope, target, &at)?;
        }

        Some(Resolved {
            scope: current.scope,
            pointer: current.pointer,
            value: current.value,
            reference,
        })
    }

    /// Marks a resolved path item or callback as being bound.
    ///
    /// Returns the key to release once binding finishes, or `None` after reporting a
    /// reference back into an object that is still being bound.
    fn enter_object(
        &mut self,
        scope: Scope<'r>,
        origin: &JsonPointer,
        resolved: &Resolved<'r>,
    ) -> Option<String> {
        let key = slot_key(resolved.scope, &resolved.pointer);
        if self.in_progress.insert(key.clone()) {
            return Some(key);
        }
        self.error(
            scope,
            DiagnosticKind::CyclicReference,
            origin,
            format!(
                "'{}' refers back to an object that encloses it",
                resolved.reference.as_deref().unwrap_or(resolved.pointer.as_str())
            ),
        );
        None
    }

    // --- diagnostics ---

    fn label(&self, scope: Scope<'r>) -> Option<String> {
        if std::ptr::eq(scope.doc, self.entry) {
            None
        } else {
            Some(display_uri(&scope.doc.uri))
        }
    }

    fn diagnose(
        &mut self,
        scope: Scope<'r>,
        severity: Severity,
        kind: DiagnosticKind,
        pointer: &JsonPointer,
        message: impl Into<String>,
    ) {
        let diagnostic =
            Diagnostic::new(severity, kind, pointer.clone(), message).in_document(self.label(scope));
        self.report.push(diagnostic);
    }

    fn error(
        &mut self,
        scope: Scope<'r>,
        kind: DiagnosticKind,
        pointer: &JsonPointer,
        message: impl Into<String>,
    ) {
        self.diagnose(scope, Severity::Error, kind, pointer, message);
    }

    fn warning(
        &mut self,
        scope: Scope<'r>,
        kind: DiagnosticKind,
        pointer: &JsonPointer,
        message: impl Into<String>,
    ) {
        self.diagnose(scope, Severity::Warning, kind, pointer, message);
    }

    /// Warns about a field the declared version does not define, if present.
    fn unsupported_field(
        &mut self,
        scope: Scope<'r>,
        map: &Map<String, Value>,
        key: &str,
        pointer: &JsonPointer,
    ) {
        if map.contains_key(key) {
            self.warning(
                scope,
                DiagnosticKind::UnsupportedFeature,
                &pointer.push(key),
                format!("'{}' is not supported in OpenAPI {} and is ignored", key, self.version),
            );
        }
    }

    // --- typed field access ---

    fn object<'v>(
        &mut self,
        scope: Scope<'r>,
        value: &'v Value,
        pointer: &JsonPointer,
        what: &str,
    ) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.error(
                    scope,
                    DiagnosticKind::UnexpectedType,
                    pointer,
                    format!("{} must be an object, found {}", what, value_kind(other)),
                );
                None
            }
        }
    }

    fn array<'v>(
        &mut self,
        scope: Scope<'r>,
        value: &'v Value,
        pointer: &JsonPointer,
        what: &str,
    ) -> &'v [Value] {
        match value {
            Value::Array(items) => items,
            other => {
                self.error(
                    scope,
                    DiagnosticKind::UnexpectedType,
                    pointer,
                    format!("{} must be an array, found {}", what, value_kind(other)),
                );
                &[]
            }
        }
    }

    fn field_object<'v>(
        &mut self,
        scope: Scope<'r>,
        map: &'v Map<String, Value>,
        key: &str,
        pointer: &JsonPointer,
    ) -> Option<&'v Map<String, Value>> {
        let value = map.get(key)?;
        self.object(scope, value, &pointer.push(key), &format!("'{}'", key))
    }

    fn mistyped(
        &mut self,
        scope: Scope<'r>,
        key: &str,
        pointer: &JsonPointer,
        expected: &str,
        found: &Value,
    ) {
        self.error(
            scope,
            DiagnosticKind::UnexpectedType,
            &pointer.push(key),
            format!("'{}' must be {}, found {}", key, expected, value_kind(found)),
        );
    }

    fn string(
        &mut self,
        scope: Scope<'r>,
        map: &Map<String, Value>,
        key: &str,
        pointer: &JsonPointer,
    ) -> Option<String> {
        match map.get(key)? {
            Value::String(text) => Some(text.clone()),
            other => {
                self.mistyped(scope, key, pointer, "a string", other);
                None
            }
        }
    }

    fn required_string(
        &mut self,
        scope: Scope<'r>,
        map: &Map<String, Value>,
        key: &str,
        pointer: &JsonPointer,
        owner: &str,
    ) -> Option<String> {
        if !map.contains_key(key) {
            self.error(
                scope,
                DiagnosticKind::MissingField,
                pointer,
                format!("{} is missing required field '{}'", owner, key),
            );
            return None;
        }
        self.string(scope, map, key, pointer)
    }

    fn boolean(
        &mut self,
        scope: Scope<'r>,
        map: &Map<String, Value>,
        key: &str,
        pointer: &JsonPointer,
    ) -> Option<bool> {
        match map.get(key)? {
            Value::Bool(flag) => Some(*flag),
            other => {
                self.mistyped(scope, key, pointer, "a boolean", other);
                None
            }
        }
    }

    fn number(
        &mut self,
        scope: Scope<'r>,
        map: &Map<String, Value>,
        key: &str,
        pointer: &JsonPointer,
    ) -> Option<f64> {
        match map.get(key)? {
            Value::Number(n) => n.as_f64(),
            other => {
                self.mistyped(scope, key, pointer, "a number", other);
                None
            }
        }
    }

    fn count(
        &mut self,
        scope: Scope<'r>,
        map: &Map<String, Value>,
        key: &str,
        pointer: &JsonPointer,
    ) -> Option<u64> {
        let value = map.get(key)?;
        match value.as_u64() {
            Some(n) => Some(n),
            None => {
                self.mistyped(scope, key, pointer, "a non-negative integer", value);
                None
            }
        }
    }

    fn strings(
        &mut self,
        scope: Scope<'r>,
        map: &Map<String, Value>,
        key: &str,
        pointer: &JsonPointer,
    ) -> Vec<String> {
        let Some(value) = map.get(key) else {
            return Vec::new();
        };
        let at = pointer.push(key);
        let mut out = Vec::new();
        for (idx, item) in self.array(scope, value, &at, &format!("'{}'", key)).iter().enumerate() {
            match item {
                Value::String(text) => out.push(text.clone()),
                other => self.error(
                    scope,
                    DiagnosticKind::UnexpectedType,
                    &at.push(idx.to_string()),
                    format!("'{}' entries must be strings, found {}", key, value_kind(other)),
                ),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::schema::{ResolutionState, SchemaKind};

    fn bind(text: &str) -> (Document, ValidationReport) {
        bind_with(text, &ImportOptions::default(), |_| {})
    }

    fn bind_with(
        text: &str,
        options: &ImportOptions,
        setup: impl FnOnce(&mut DocumentRegistry),
    ) -> (Document, ValidationReport) {
        let mut registry = DocumentRegistry::new();
        setup(&mut registry);
        registry.register("openapi.yaml", text).unwrap();
        let root = &registry.get("openapi.yaml").unwrap().root;
        let (version, declared) = crate::oas::version::detect_version(root).unwrap();
        bind_document(&registry, "openapi.yaml", options, version, &declared).unwrap()
    }

    #[test]
    fn test_bind_minimal() {
        let (doc, report) = bind(
            r#"
openapi: 3.0.3
info:
  title: Minimal
  version: "1.0"
x-audience: internal
paths: {}
"#,
        );
        assert!(report.is_empty(), "{report}");
        assert_eq!(doc.info.title, "Minimal");
        assert_eq!(doc.version, SpecVersion::V3_0);
        assert_eq!(doc.extensions.get("x-audience"), Some(&Value::from("internal")));
    }

    #[test]
    fn test_missing_info_fields_accumulate() {
        let (_, report) = bind("openapi: 3.0.0\ninfo: {}\npaths: {}\n");
        let missing: Vec<String> = report
            .of_kind(DiagnosticKind::MissingField)
            .map(|d| d.message.clone())
            .collect();
        assert_eq!(missing.len(), 2);
        assert!(missing[0].contains("'title'"));
        assert!(missing[1].contains("'version'"));
    }

    #[test]
    fn test_paths_required_only_in_3_0() {
        let (_, report) = bind("openapi: 3.0.0\ninfo: {title: t, version: v}\n");
        assert!(report
            .of_kind(DiagnosticKind::MissingField)
            .any(|d| d.message.contains("'paths'")));

        let (_, report) = bind("openapi: 3.1.0\ninfo: {title: t, version: v}\ncomponents: {}\n");
        assert!(report.is_empty(), "{report}");

        let (_, report) = bind("openapi: 3.1.0\ninfo: {title: t, version: v}\n");
        assert_eq!(report.of_kind(DiagnosticKind::MissingField).count(), 1);
    }

    #[test]
    fn test_webhooks_ignored_in_3_0() {
        let (doc, report) = bind(
            r#"
openapi: 3.0.3
info: {title: t, version: v}
paths: {}
webhooks:
  newPet:
    post:
      responses:
        "200": {description: ok}
"#,
        );
        assert!(doc.webhooks.is_empty());
        assert_eq!(report.of_kind(DiagnosticKind::UnsupportedFeature).count(), 1);
    }

    #[test]
    fn test_numeric_openapi_warns() {
        let (doc, report) = bind("openapi: 3.1\ninfo: {title: t, version: v}\npaths: {}\n");
        assert_eq!(doc.openapi, "3.1");
        assert!(!report.has_errors());
        assert_eq!(report.of_kind(DiagnosticKind::UnsupportedFeature).count(), 1);
    }

    #[test]
    fn test_external_reference_resolution() {
        let text = r#"
openapi: 3.1.0
info: {title: t, version: v}
components:
  schemas:
    Pet:
      $ref: "schemas/common.yaml#/Pet"
"#;
        let common = "Pet:\n  type: object\n  properties:\n    name: {type: string}\n";

        let (doc, report) = bind_with(text, &ImportOptions::default(), |registry| {
            registry.register("schemas/common.yaml", common).unwrap();
        });
        assert!(report.is_empty(), "{report}");
        let pet = doc.components.schemas["Pet"];
        let target = doc.schemas.resolve(pet).unwrap();
        assert_eq!(doc.schemas[target].document.as_deref(), Some("schemas/common.yaml"));

        let (doc, report) = bind_with(text, &ImportOptions::default(), |_| {});
        assert_eq!(report.of_kind(DiagnosticKind::UnresolvedReference).count(), 1);
        let pet = doc.component_schema("Pet").unwrap();
        assert_eq!(pet.as_reference().unwrap().state, ResolutionState::Unresolved);

        let options = ImportOptions::default().with_resolve_external(false);
        let (_, report) = bind_with(text, &options, |registry| {
            registry.register("schemas/common.yaml", common).unwrap();
        });
        assert!(!report.has_errors());
        assert_eq!(report.of_kind(DiagnosticKind::ExternalReference).count(), 1);
    }

    #[test]
    fn test_anchor_reference() {
        let (doc, report) = bind(
            r##"
openapi: 3.1.0
info: {title: t, version: v}
components:
  schemas:
    Tag:
      $anchor: TagAnchor
      type: string
    Holder:
      type: object
      properties:
        tag: {$ref: "#TagAnchor"}
"##,
        );
        assert!(report.is_empty(), "{report}");
        let holder = doc.component_schema("Holder").unwrap().as_object().unwrap();
        let tag_ref = holder.properties["tag"];
        assert_eq!(
            doc.schemas.resolve(tag_ref),
            Some(doc.components.schemas["Tag"])
        );
    }

    #[test]
    fn test_non_schema_reference_cycle() {
        let (doc, report) = bind(
            r##"
openapi: 3.0.3
info: {title: t, version: v}
paths: {}
components:
  parameters:
    A: {$ref: "#/components/parameters/B"}
    B: {$ref: "#/components/parameters/A"}
"##,
        );
        assert!(doc.components.parameters.is_empty());
        assert_eq!(report.of_kind(DiagnosticKind::CyclicReference).count(), 2);
    }

    #[test]
    fn test_reference_chain_depth_limit() {
        let options = ImportOptions::default().with_max_depth(2);
        let (_, report) = bind_with(
            r##"
openapi: 3.0.3
info: {title: t, version: v}
paths: {}
components:
  responses:
    A: {$ref: "#/components/responses/B"}
    B: {$ref: "#/components/responses/C"}
    C: {$ref: "#/components/responses/D"}
    D: {description: done}
"##,
            &options,
            |_| {},
        );
        assert!(report
            .of_kind(DiagnosticKind::DepthLimitExceeded)
            .any(|d| d.pointer.to_string() == "#/components/responses/A"));
    }

    #[test]
    fn test_self_uri_reference_is_local() {
        let (doc, report) = bind_with(
            r#"
openapi: 3.2.0
$self: https://api.example.com/openapi.yaml
info: {title: t, version: v}
components:
  schemas:
    Id: {type: integer}
    Ref:
      $ref: "https://api.example.com/openapi.yaml#/components/schemas/Id"
"#,
            &ImportOptions::default().with_resolve_external(false),
            |_| {},
        );
        assert!(report.is_empty(), "{report}");
        let id = doc.components.schemas["Ref"];
        assert!(matches!(
            doc.schemas[doc.schemas.resolve(id).unwrap()].kind,
            SchemaKind::Primitive(_)
        ));
    }
}
