//! # Document Registry
//!
//! Stores externally supplied OpenAPI / JSON Schema documents for multi-document
//! reference resolution. No network or file access is performed: every
//! document a reference may point at must be registered up front.

use crate::error::{AppError, AppResult};
use crate::loader::{load_document, LoadedDocument, SourceFormat};
use crate::oas::pointer::JsonPointer;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Base used to give relative retrieval URIs an absolute form.
pub const DUMMY_BASE: &str = "http://example.invalid/";

/// Retrieval URI assumed for the entry document when none is configured.
pub const DEFAULT_ENTRY_URI: &str = "openapi.yaml";

/// A single registered document.
#[derive(Debug, Clone)]
pub struct RegisteredDocument {
    /// Normalized absolute URI, without fragment.
    pub uri: String,
    /// Base for resolving relative references found inside the document.
    pub base: Url,
    /// Format the document was parsed from.
    pub format: SourceFormat,
    /// Generic node tree.
    pub root: Value,
    anchors: HashMap<String, JsonPointer>,
}

impl RegisteredDocument {
    /// Location of a plain-name `$anchor` / `$dynamicAnchor` within the document.
    pub fn anchor(&self, name: &str) -> Option<&JsonPointer> {
        self.anchors.get(name)
    }
}

/// Registry for in-memory OpenAPI / JSON Schema documents.
///
/// Clones share the loaded documents.
#[derive(Debug, Default, Clone)]
pub struct DocumentRegistry {
    docs: Vec<Arc<RegisteredDocument>>,
    index: HashMap<String, usize>,
}

impl DocumentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and registers a document under `uri`.
    ///
    /// # Errors
    ///
    /// Fails if the text cannot be loaded or the URI (or the document's root
    /// `$self` / `$id`) is already registered.
    pub fn register(&mut self, uri: &str, text: &str) -> AppResult<()> {
        let loaded = load_document(text)?;
        self.insert(uri, loaded)
    }

    /// Registers an already loaded document under `uri`.
    pub fn insert(&mut self, uri: &str, document: LoadedDocument) -> AppResult<()> {
        let entry = build_entry(uri, document)?;
        let aliases = entry_aliases(&entry);
        for alias in &aliases {
            if let Some(existing) = self.index.get(alias) {
                return Err(AppError::General(format!(
                    "Document registry URI collision for '{}': already registered as {}",
                    alias, self.docs[*existing].uri
                )));
            }
        }
        self.push_entry(entry, aliases);
        Ok(())
    }

    /// Registers `document` under `uri`, replacing any document already there.
    pub(crate) fn replace(&mut self, uri: &str, document: LoadedDocument) -> AppResult<String> {
        let entry = build_entry(uri, document)?;
        let key = entry.uri.clone();
        let aliases = entry_aliases(&entry);

        let existing = aliases.iter().find_map(|alias| self.index.get(alias).copied());
        match existing {
            Some(idx) => {
                self.index.retain(|_, v| *v != idx);
                for alias in aliases {
                    self.index.insert(alias, idx);
                }
                self.docs[idx] = Arc::new(entry);
            }
            None => self.push_entry(entry, aliases),
        }
        Ok(key)
    }

    /// Looks up a document by any URI it is known under.
    ///
    /// Relative URIs are interpreted against the placeholder base.
    pub fn get(&self, uri: &str) -> Option<&RegisteredDocument> {
        let key = normalize_uri(uri)?;
        self.index
            .get(&key)
            .and_then(|idx| self.docs.get(*idx))
            .map(Arc::as_ref)
    }

    /// True if a document is registered under `uri`.
    pub fn contains(&self, uri: &str) -> bool {
        self.get(uri).is_some()
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn push_entry(&mut self, entry: RegisteredDocument, aliases: Vec<String>) {
        let idx = self.docs.len();
        debug!("registered document {} ({} aliases)", entry.uri, aliases.len());
        self.docs.push(Arc::new(entry));
        for alias in aliases {
            self.index.insert(alias, idx);
        }
    }
}

fn build_entry(uri: &str, document: LoadedDocument) -> AppResult<RegisteredDocument> {
    let base = parse_base_url(uri)
        .ok_or_else(|| AppError::General(format!("Invalid document URI '{}'", uri)))?;
    let mut key = base.clone();
    key.set_fragment(None);

    let mut anchors = HashMap::new();
    collect_anchors(&document.root, &JsonPointer::root(), &mut anchors);

    Ok(RegisteredDocument {
        uri: key.to_string(),
        base,
        format: document.format,
        root: document.root,
        anchors,
    })
}

fn entry_aliases(entry: &RegisteredDocument) -> Vec<String> {
    let mut aliases = vec![entry.uri.clone()];
    for key in ["$self", "$id"] {
        let declared = entry.root.get(key).and_then(Value::as_str);
        if let Some(mut id) = declared.and_then(|id| entry.base.join(id).ok()) {
            id.set_fragment(None);
            let id = id.to_string();
            if !aliases.contains(&id) {
                aliases.push(id);
            }
        }
    }
    aliases
}

/// Parses `uri` as an absolute URL, falling back to resolving it against the placeholder base.
pub(crate) fn parse_base_url(uri: &str) -> Option<Url> {
    if let Ok(url) = Url::parse(uri) {
        return Some(url);
    }
    let dummy = Url::parse(DUMMY_BASE).ok()?;
    dummy.join(uri).ok()
}

/// Normalizes `uri` into the registry's key form.
pub(crate) fn normalize_uri(uri: &str) -> Option<String> {
    let mut url = parse_base_url(uri)?;
    url.set_fragment(None);
    Some(url.to_string())
}

/// Maps a registry key back to the form a caller would recognize: the
/// placeholder base is stripped from relative URIs.
pub(crate) fn display_uri(uri: &str) -> String {
    uri.strip_prefix(DUMMY_BASE).unwrap_or(uri).to_string()
}

fn collect_anchors(value: &Value, pointer: &JsonPointer, anchors: &mut HashMap<String, JsonPointer>) {
    match value {
        Value::Object(map) => {
            for key in ["$anchor", "$dynamicAnchor"] {
                if let Some(name) = map.get(key).and_then(Value::as_str) {
                    anchors
                        .entry(name.to_string())
                        .or_insert_with(|| pointer.clone());
                }
            }
            for (key, child) in map {
                // Example payloads are data, not schemas.
                if matches!(key.as_str(), "example" | "examples" | "default" | "const" | "enum") {
                    continue;
                }
                collect_anchors(child, &pointer.push(key), anchors);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                collect_anchors(child, &pointer.push(idx.to_string()), anchors);
            }
        }
        _ => {}
    }
}
