//! # Schema Graph
//!
//! Bound Schema Objects live in an arena ([`SchemaGraph`]) and refer to each
//! other through [`SchemaId`]s. A `$ref` becomes a [`SchemaKind::Reference`]
//! node whose target is the id of the bound target, so recursive schemas are
//! plain back-edges instead of infinite expansions.

use crate::oas::pointer::JsonPointer;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::ops::Index;

/// Index of a schema inside a [`SchemaGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SchemaId(pub(crate) usize);

impl SchemaId {
    /// Position of the schema in its graph.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A bound Schema Object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    /// Component name, for schemas under `components/schemas`.
    pub name: Option<String>,
    /// Document URI when the schema comes from a registered secondary document.
    pub document: Option<String>,
    /// Where the schema was found.
    pub location: JsonPointer,
    /// `title`
    pub title: Option<String>,
    /// `description`
    pub description: Option<String>,
    /// Structural shape.
    pub kind: SchemaKind,
    /// Accepts `null`, from 3.0 `nullable` or a 3.1 `"null"` type member.
    pub nullable: bool,
    /// `readOnly`
    pub read_only: bool,
    /// `writeOnly`
    pub write_only: bool,
    /// `deprecated`
    pub deprecated: bool,
    /// `default`
    pub default: Option<Value>,
    /// `example` plus the entries of a JSON Schema `examples` array.
    pub examples: Vec<Value>,
    /// `enum`, or a single-element list for `const`.
    pub enum_values: Option<Vec<Value>>,
    /// Specification extensions (`x-*`).
    pub extensions: IndexMap<String, Value>,
}

impl Schema {
    pub(crate) fn placeholder(location: JsonPointer, document: Option<String>) -> Self {
        Self {
            name: None,
            document,
            location,
            title: None,
            description: None,
            kind: SchemaKind::Any,
            nullable: false,
            read_only: false,
            write_only: false,
            deprecated: false,
            default: None,
            examples: Vec::new(),
            enum_values: None,
            extensions: IndexMap::new(),
        }
    }

    /// True for `$ref` nodes.
    pub fn is_reference(&self) -> bool {
        matches!(self.kind, SchemaKind::Reference(_))
    }

    /// The object shape, if this is an object schema.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The reference, if this is a `$ref` node.
    pub fn as_reference(&self) -> Option<&Reference> {
        match &self.kind {
            SchemaKind::Reference(reference) => Some(reference),
            _ => None,
        }
    }
}

/// Structural shape of a schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SchemaKind {
    /// Accepts any instance (`{}` or `true`).
    Any,
    /// Accepts nothing (`false`).
    Never,
    /// A scalar type.
    Primitive(PrimitiveSchema),
    /// `type: object`, or a schema with object keywords.
    Object(ObjectSchema),
    /// `type: array`, or a schema with array keywords.
    Array(ArraySchema),
    /// `allOf` / `oneOf` / `anyOf` / `not`, or a multi-type `type` array.
    Composed(ComposedSchema),
    /// A `$ref`.
    Reference(Reference),
}

/// JSON scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    /// `string`
    String,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `null` (3.1+ only)
    Null,
}

impl PrimitiveType {
    /// Parses a `type` keyword value.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            _ => None,
        }
    }
}

/// A scalar schema with its validation keywords.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimitiveSchema {
    /// Scalar type.
    pub ty: PrimitiveType,
    /// `format`
    pub format: Option<String>,
    /// `minimum`
    pub minimum: Option<f64>,
    /// `maximum`
    pub maximum: Option<f64>,
    /// Exclusive lower bound (3.0 boolean form is normalized into this).
    pub exclusive_minimum: Option<f64>,
    /// Exclusive upper bound (3.0 boolean form is normalized into this).
    pub exclusive_maximum: Option<f64>,
    /// `multipleOf`
    pub multiple_of: Option<f64>,
    /// `minLength`
    pub min_length: Option<u64>,
    /// `maxLength`
    pub max_length: Option<u64>,
    /// `pattern`
    pub pattern: Option<String>,
}

impl PrimitiveSchema {
    pub(crate) fn new(ty: PrimitiveType) -> Self {
        Self {
            ty,
            format: None,
            minimum: None,
            maximum: None,
            exclusive_minimum: None,
            exclusive_maximum: None,
            multiple_of: None,
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }
}

/// `additionalProperties`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true`/`false` (absent means `true`).
    Allowed(bool),
    /// A schema every additional property must satisfy.
    Schema(SchemaId),
}

impl Default for AdditionalProperties {
    fn default() -> Self {
        AdditionalProperties::Allowed(true)
    }
}

/// An object schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectSchema {
    /// Declared properties, in document order.
    pub properties: IndexMap<String, SchemaId>,
    /// `required`
    pub required: Vec<String>,
    /// `additionalProperties`
    pub additional_properties: AdditionalProperties,
    /// `minProperties`
    pub min_properties: Option<u64>,
    /// `maxProperties`
    pub max_properties: Option<u64>,
    /// `discriminator`
    pub discriminator: Option<Discriminator>,
}

/// An array schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArraySchema {
    /// `items`
    pub items: Option<SchemaId>,
    /// `prefixItems` (3.1+)
    pub prefix_items: Vec<SchemaId>,
    /// `minItems`
    pub min_items: Option<u64>,
    /// `maxItems`
    pub max_items: Option<u64>,
    /// `uniqueItems`
    pub unique_items: bool,
}

/// A polymorphic schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposedSchema {
    /// `allOf`
    pub all_of: Vec<SchemaId>,
    /// `oneOf`
    pub one_of: Vec<SchemaId>,
    /// `anyOf`
    pub any_of: Vec<SchemaId>,
    /// `not`
    pub not: Option<SchemaId>,
    /// Structural keywords written next to the composition keywords.
    pub inline: Option<SchemaId>,
    /// `discriminator`
    pub discriminator: Option<Discriminator>,
}

/// Discriminator Object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discriminator {
    /// `propertyName`
    pub property_name: String,
    /// Payload value to schema.
    pub mapping: IndexMap<String, Reference>,
}

/// A `$ref` plus what it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    /// The `$ref` text as written.
    pub target_ref: String,
    /// Resolution outcome.
    pub state: ResolutionState,
}

/// Resolution state of a [`Reference`].
///
/// `Resolving` exists only while the binder is working on the target; it never
/// appears in a finished graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "target", rename_all = "camelCase")]
pub enum ResolutionState {
    /// The target could not be located.
    Unresolved,
    /// The target is being bound.
    Resolving,
    /// The target was bound.
    Resolved(SchemaId),
    /// The target is an ancestor of this reference (recursive schema).
    Cyclic(SchemaId),
}

impl ResolutionState {
    /// Id of the target schema, for resolved or cyclic references.
    pub fn target(self) -> Option<SchemaId> {
        match self {
            ResolutionState::Resolved(id) | ResolutionState::Cyclic(id) => Some(id),
            ResolutionState::Unresolved | ResolutionState::Resolving => None,
        }
    }
}

/// Outcome of following a reference chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Followed {
    Concrete(SchemaId),
    Unresolved,
    Cycle,
}

/// Arena of bound schemas.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaGraph {
    nodes: Vec<Schema>,
}

impl SchemaGraph {
    pub(crate) fn alloc(&mut self, schema: Schema) -> SchemaId {
        self.nodes.push(schema);
        SchemaId(self.nodes.len() - 1)
    }

    pub(crate) fn get_mut(&mut self, id: SchemaId) -> Option<&mut Schema> {
        self.nodes.get_mut(id.0)
    }

    /// The schema behind `id`.
    pub fn get(&self, id: SchemaId) -> Option<&Schema> {
        self.nodes.get(id.0)
    }

    /// Number of bound schemas.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True for an empty graph.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every schema with its id.
    pub fn iter(&self) -> impl Iterator<Item = (SchemaId, &Schema)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, schema)| (SchemaId(idx), schema))
    }

    /// Follows `$ref` nodes starting at `id` to the first concrete schema.
    ///
    /// Returns `None` when the chain ends in an unresolved reference or loops
    /// back on itself without reaching a concrete schema.
    pub fn resolve(&self, id: SchemaId) -> Option<SchemaId> {
        match self.follow(id) {
            Followed::Concrete(id) => Some(id),
            Followed::Unresolved | Followed::Cycle => None,
        }
    }

    /// Id of the component schema called `name`.
    pub fn named(&self, name: &str) -> Option<SchemaId> {
        self.iter()
            .find(|(_, schema)| schema.name.as_deref() == Some(name))
            .map(|(id, _)| id)
    }

    pub(crate) fn follow(&self, id: SchemaId) -> Followed {
        let mut seen = HashSet::new();
        let mut current = id;
        loop {
            if !seen.insert(current) {
                return Followed::Cycle;
            }
            let Some(schema) = self.get(current) else {
                return Followed::Unresolved;
            };
            match &schema.kind {
                SchemaKind::Reference(reference) => match reference.state.target() {
                    Some(next) => current = next,
                    None => return Followed::Unresolved,
                },
                _ => return Followed::Concrete(current),
            }
        }
    }
}

impl Index<SchemaId> for SchemaGraph {
    type Output = Schema;

    fn index(&self, id: SchemaId) -> &Schema {
        &self.nodes[id.0]
    }
}
