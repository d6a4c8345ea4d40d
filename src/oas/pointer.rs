//! # JSON Pointers and References
//!
//! Shared helpers for addressing nodes of a loaded document (RFC 6901) and for
//! splitting `$ref` values into their document and fragment parts.

use percent_encoding::percent_decode_str;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// An owned JSON Pointer, stored in its escaped form without the leading `#`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPointer(String);

impl JsonPointer {
    /// The pointer addressing the whole document.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Parses a URI fragment (with or without the leading `#`).
    ///
    /// Percent-encoded characters are decoded; `~0`/`~1` escapes are kept.
    /// Returns `None` when the fragment is not a JSON Pointer (e.g. an anchor name).
    pub fn parse(fragment: &str) -> Option<Self> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if fragment.is_empty() {
            return Some(Self::root());
        }
        if !fragment.starts_with('/') {
            return None;
        }
        let decoded = percent_decode_str(fragment).decode_utf8_lossy();
        Some(Self(decoded.into_owned()))
    }

    /// Returns a new pointer with `segment` appended.
    pub fn push(&self, segment: impl AsRef<str>) -> Self {
        let mut out = String::with_capacity(self.0.len() + segment.as_ref().len() + 1);
        out.push_str(&self.0);
        out.push('/');
        out.push_str(&escape_pointer_segment(segment.as_ref()));
        Self(out)
    }

    /// Unescaped reference tokens.
    pub fn segments(&self) -> impl Iterator<Item = String> + '_ {
        self.0
            .split('/')
            .skip(1)
            .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
    }

    /// The pointer one level up, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let idx = self.0.rfind('/')?;
        Some(Self(self.0[..idx].to_string()))
    }

    /// The final unescaped token.
    pub fn last(&self) -> Option<String> {
        self.segments().last()
    }

    /// True for the whole-document pointer.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Escaped pointer text without the `#`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A `$ref` split at the first `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedReference<'a> {
    /// URI of the target document; empty for same-document references.
    pub document: &'a str,
    /// Fragment after `#`, if one was present.
    pub fragment: Option<&'a str>,
}

impl ParsedReference<'_> {
    /// True when the reference stays within the current document.
    pub fn is_local(&self) -> bool {
        self.document.is_empty()
    }
}

/// Splits a `$ref` value into document and fragment.
pub fn parse_reference(reference: &str) -> ParsedReference<'_> {
    match reference.split_once('#') {
        Some((document, fragment)) => ParsedReference {
            document,
            fragment: Some(fragment),
        },
        None => ParsedReference {
            document: reference,
            fragment: None,
        },
    }
}

/// Decodes a JSON Pointer segment taken from a URI fragment
/// (percent-decoding, then `~1` and `~0`).
pub fn decode_pointer_segment(segment: &str) -> String {
    percent_decode_str(segment)
        .decode_utf8_lossy()
        .replace("~1", "/")
        .replace("~0", "~")
}

/// Escapes `~` and `/` for use inside a JSON Pointer.
pub fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Looks up the node addressed by `pointer`.
pub fn resolve_pointer<'v>(root: &'v Value, pointer: &JsonPointer) -> Option<&'v Value> {
    let mut current = root;
    for segment in pointer.segments() {
        current = match current {
            Value::Object(map) => map.get(&segment)?,
            Value::Array(items) => items.get(parse_array_index(&segment)?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn parse_array_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || (segment.len() > 1 && segment.starts_with('0')) {
        return None;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pointer_push_escapes() {
        let pointer = JsonPointer::root()
            .push("paths")
            .push("/pets/{id}")
            .push("get");
        assert_eq!(pointer.as_str(), "/paths/~1pets~1{id}/get");
        assert_eq!(pointer.to_string(), "#/paths/~1pets~1{id}/get");
        let segments: Vec<String> = pointer.segments().collect();
        assert_eq!(segments, ["paths", "/pets/{id}", "get"]);
    }

    #[test]
    fn test_pointer_parent_and_last() {
        let pointer = JsonPointer::parse("#/components/schemas/a~0b").unwrap();
        assert_eq!(pointer.last().as_deref(), Some("a~b"));
        assert_eq!(
            pointer.parent().unwrap().to_string(),
            "#/components/schemas"
        );
        assert!(JsonPointer::root().parent().is_none());
    }

    #[test]
    fn test_pointer_parse_rejects_anchor() {
        assert!(JsonPointer::parse("#Pet").is_none());
        assert!(JsonPointer::parse("#").unwrap().is_root());
        assert!(JsonPointer::parse("").unwrap().is_root());
    }

    #[test]
    fn test_parse_reference_parts() {
        let local = parse_reference("#/components/schemas/Pet");
        assert!(local.is_local());
        assert_eq!(local.fragment, Some("/components/schemas/Pet"));

        let remote = parse_reference("common.yaml#/Pet");
        assert_eq!(remote.document, "common.yaml");
        assert_eq!(remote.fragment, Some("/Pet"));

        let whole = parse_reference("schemas/pet.json");
        assert_eq!(whole.document, "schemas/pet.json");
        assert_eq!(whole.fragment, None);
    }

    #[test]
    fn test_decode_pointer_segment_percent_encoding() {
        assert_eq!(
            decode_pointer_segment("User%20Profile~1details"),
            "User Profile/details"
        );
    }

    #[test]
    fn test_resolve_pointer() {
        let doc = json!({
            "paths": {"/pets": {"get": {"tags": ["a", "b"]}}},
            "weird": {"a/b": 1, "m~n": 2}
        });
        let tags = JsonPointer::root()
            .push("paths")
            .push("/pets")
            .push("get")
            .push("tags")
            .push("1");
        assert_eq!(resolve_pointer(&doc, &tags), Some(&json!("b")));
        assert_eq!(
            resolve_pointer(&doc, &JsonPointer::parse("/weird/a~1b").unwrap()),
            Some(&json!(1))
        );
        assert_eq!(
            resolve_pointer(&doc, &JsonPointer::parse("/weird/m~0n").unwrap()),
            Some(&json!(2))
        );
        assert!(resolve_pointer(&doc, &JsonPointer::parse("/paths/missing").unwrap()).is_none());
        let leading_zero = JsonPointer::parse("/paths/~1pets/get/tags/01").unwrap();
        assert!(resolve_pointer(&doc, &leading_zero).is_none());
    }
}
