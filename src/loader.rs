//! # Document Loader
//!
//! Parses raw JSON or YAML text into a generic `serde_json::Value` tree.
//!
//! YAML is read through `serde_yaml`'s own value type first so that
//! non-string mapping keys (e.g. unquoted `200:` response codes) and merge keys
//! can be normalized before the tree is handed to the binder.

use crate::error::{AppError, AppResult, SyntaxError};
use crate::oas::pointer::JsonPointer;
use derive_more::Display;
use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Textual format of a loaded document.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceFormat {
    /// JSON text.
    #[display("JSON")]
    Json,
    /// YAML text. Anything whose first non-blank character is not `{` or `[`.
    #[display("YAML")]
    Yaml,
}

/// A parsed document tree plus the format it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// Format the text was parsed as.
    pub format: SourceFormat,
    /// Root node. Always a JSON object.
    pub root: Value,
}

/// Guesses the format of `text`: JSON when the first significant character
/// opens an object or array, YAML otherwise.
pub fn detect_format(text: &str) -> SourceFormat {
    match strip_bom(text).trim_start().chars().next() {
        Some('{') | Some('[') => SourceFormat::Json,
        _ => SourceFormat::Yaml,
    }
}

/// Parses `text` into a generic node tree.
///
/// # Errors
///
/// * `AppError::Syntax` - the text is empty or not valid JSON/YAML.
/// * `AppError::Structure` - the root is not an object, a mapping key is not a
///   scalar, or a number cannot be represented in JSON.
pub fn load_document(text: &str) -> AppResult<LoadedDocument> {
    let text = strip_bom(text);
    let format = detect_format(text);

    if text.trim().is_empty() {
        return Err(SyntaxError::new(format, "document is empty").into());
    }

    let root = match format {
        SourceFormat::Json => parse_json(text)?,
        SourceFormat::Yaml => parse_yaml(text)?,
    };

    if !root.is_object() {
        return Err(AppError::Structure(format!(
            "document root must be an object, found {}",
            value_kind(&root)
        )));
    }

    trace!("loaded {} document", format);
    Ok(LoadedDocument { format, root })
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

fn parse_json(text: &str) -> AppResult<Value> {
    serde_json::from_str(text).map_err(|e| {
        let err = SyntaxError::new(SourceFormat::Json, strip_position_suffix(&e.to_string()));
        if e.line() > 0 {
            err.at(e.line(), e.column()).into()
        } else {
            err.into()
        }
    })
}

fn parse_yaml(text: &str) -> AppResult<Value> {
    let mut raw: serde_yaml::Value = serde_yaml::from_str(text).map_err(yaml_syntax_error)?;
    raw.apply_merge().map_err(yaml_syntax_error)?;
    yaml_to_json(raw, &JsonPointer::root())
}

fn yaml_syntax_error(e: serde_yaml::Error) -> AppError {
    let err = SyntaxError::new(SourceFormat::Yaml, strip_position_suffix(&e.to_string()));
    match e.location() {
        Some(loc) => err.at(loc.line(), loc.column()).into(),
        None => err.into(),
    }
}

// Both parsers append " at line X column Y" to their messages; the position is
// carried separately.
fn strip_position_suffix(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(idx) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

fn yaml_to_json(value: serde_yaml::Value, pointer: &JsonPointer) -> AppResult<Value> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => Value::Number(yaml_number(&n, pointer)?),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (idx, item) in items.into_iter().enumerate() {
                out.push(yaml_to_json(item, &pointer.push(idx.to_string()))?);
            }
            Value::Array(out)
        }
        Yaml::Mapping(mapping) => {
            let mut out = Map::new();
            for (key, item) in mapping {
                let key = mapping_key(key, pointer)?;
                let converted = yaml_to_json(item, &pointer.push(&key))?;
                out.insert(key, converted);
            }
            Value::Object(out)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value, pointer)?,
    })
}

fn mapping_key(key: serde_yaml::Value, pointer: &JsonPointer) -> AppResult<String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => mapping_key(tagged.value, pointer),
        Yaml::Sequence(_) | Yaml::Mapping(_) => Err(AppError::Structure(format!(
            "mapping at {} uses a non-scalar key",
            pointer
        ))),
    }
}

fn yaml_number(n: &serde_yaml::Number, pointer: &JsonPointer) -> AppResult<Number> {
    if let Some(i) = n.as_i64() {
        return Ok(Number::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Number::from(u));
    }
    n.as_f64()
        .and_then(Number::from_f64)
        .ok_or_else(|| {
            AppError::Structure(format!(
                "number '{}' at {} cannot be represented in JSON",
                n, pointer
            ))
        })
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
