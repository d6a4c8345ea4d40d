//! Schema Object binding.
//!
//! Every schema location is bound once; a `$ref` to a location still being
//! bound is recorded as a cyclic edge instead of being expanded again.

use super::{extensions, slot_key, Binder, SchemaSlot, Scope};
use crate::loader::value_kind;
use crate::oas::pointer::{escape_pointer_segment, JsonPointer};
use crate::oas::report::DiagnosticKind;
use crate::oas::schema::{
    AdditionalProperties, ArraySchema, ComposedSchema, Discriminator, ObjectSchema,
    PrimitiveSchema, PrimitiveType, Reference, ResolutionState, Schema, SchemaId, SchemaKind,
};
use indexmap::IndexMap;
use log::trace;
use serde_json::{Map, Value};

const OBJECT_KEYWORDS: [&str; 5] = [
    "properties",
    "additionalProperties",
    "required",
    "minProperties",
    "maxProperties",
];
const ARRAY_KEYWORDS: [&str; 5] = ["items", "prefixItems", "minItems", "maxItems", "uniqueItems"];
const COMPOSITION_KEYWORDS: [&str; 4] = ["allOf", "oneOf", "anyOf", "not"];
const TYPE_NAMES: [&str; 6] = ["object", "array", "string", "integer", "number", "boolean"];

impl<'r> Binder<'r> {
    /// Binds the schema at `pointer`, or returns the id it was already bound to.
    pub(super) fn bind_schema(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
    ) -> SchemaId {
        let key = slot_key(scope, &pointer);
        if let Some(slot) = self.memo.get(&key) {
            return slot.id();
        }

        let label = self.label(scope);
        if self.depth >= self.options.max_depth {
            self.error(
                scope,
                DiagnosticKind::DepthLimitExceeded,
                &pointer,
                format!(
                    "schema nesting exceeds the depth limit of {}",
                    self.options.max_depth
                ),
            );
            let id = self.graph.alloc(Schema::placeholder(pointer, label));
            self.memo.insert(key, SchemaSlot::Bound(id));
            return id;
        }

        let id = self.graph.alloc(Schema::placeholder(pointer.clone(), label));
        self.memo.insert(key.clone(), SchemaSlot::Binding(id));
        self.depth += 1;
        let schema = self.build_schema(scope, value, &pointer);
        self.depth -= 1;
        if let Some(node) = self.graph.get_mut(id) {
            *node = schema;
        }
        self.memo.insert(key, SchemaSlot::Bound(id));
        id
    }

    fn build_schema(&mut self, scope: Scope<'r>, value: &'r Value, pointer: &JsonPointer) -> Schema {
        let mut schema = Schema::placeholder(pointer.clone(), self.label(scope));
        let map = match value {
            Value::Object(map) => map,
            Value::Bool(accepts) => {
                if self.version.is_json_schema_aligned() {
                    schema.kind = if *accepts {
                        SchemaKind::Any
                    } else {
                        SchemaKind::Never
                    };
                } else {
                    self.error(
                        scope,
                        DiagnosticKind::UnexpectedType,
                        pointer,
                        "boolean schemas require OpenAPI 3.1 or later",
                    );
                }
                return schema;
            }
            other => {
                self.error(
                    scope,
                    DiagnosticKind::UnexpectedType,
                    pointer,
                    format!("schema must be an object, found {}", value_kind(other)),
                );
                return schema;
            }
        };

        if let Some(target) = map.get("$ref") {
            return self.build_reference(scope, map, target, pointer, schema);
        }

        self.read_annotations(scope, map, pointer, &mut schema);
        let types = self.read_types(scope, map, pointer, &mut schema.nullable);
        schema.kind = self.build_kind(scope, map, pointer, &types);
        schema
    }

    fn build_reference(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        target: &'r Value,
        pointer: &JsonPointer,
        mut schema: Schema,
    ) -> Schema {
        let Some(target_ref) = target.as_str() else {
            self.error(
                scope,
                DiagnosticKind::UnexpectedType,
                &pointer.push("$ref"),
                format!("'$ref' must be a string, found {}", value_kind(target)),
            );
            return schema;
        };

        if self.version.is_json_schema_aligned() {
            schema.title = self.string(scope, map, "title", pointer);
            schema.description = self.string(scope, map, "description", pointer);
        } else {
            let siblings: Vec<&str> = map
                .keys()
                .map(String::as_str)
                .filter(|key| *key != "$ref" && !key.starts_with("x-"))
                .collect();
            if !siblings.is_empty() {
                self.warning(
                    scope,
                    DiagnosticKind::UnsupportedFeature,
                    pointer,
                    format!(
                        "keywords next to '$ref' are ignored in OpenAPI 3.0: {}",
                        siblings.join(", ")
                    ),
                );
            }
        }
        schema.extensions = extensions(map);

        let state = self.resolve_schema_ref(scope, target_ref, &pointer.push("$ref"));
        schema.kind = SchemaKind::Reference(Reference {
            target_ref: target_ref.to_string(),
            state,
        });
        schema
    }

    fn resolve_schema_ref(
        &mut self,
        scope: Scope<'r>,
        reference: &str,
        at: &JsonPointer,
    ) -> ResolutionState {
        let Some(target) = self.locate(scope, reference, at) else {
            return ResolutionState::Unresolved;
        };
        match self.memo.get(&slot_key(target.scope, &target.pointer)).copied() {
            Some(SchemaSlot::Binding(id)) => {
                trace!("{} closes a cycle at schema {}", reference, id.index());
                ResolutionState::Cyclic(id)
            }
            Some(SchemaSlot::Bound(id)) => ResolutionState::Resolved(id),
            None => ResolutionState::Resolved(self.bind_schema(
                target.scope,
                target.value,
                target.pointer,
            )),
        }
    }

    fn read_annotations(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        pointer: &JsonPointer,
        schema: &mut Schema,
    ) {
        let aligned = self.version.is_json_schema_aligned();
        schema.title = self.string(scope, map, "title", pointer);
        schema.description = self.string(scope, map, "description", pointer);
        schema.deprecated = self.boolean(scope, map, "deprecated", pointer).unwrap_or(false);
        schema.read_only = self.boolean(scope, map, "readOnly", pointer).unwrap_or(false);
        schema.write_only = self.boolean(scope, map, "writeOnly", pointer).unwrap_or(false);
        schema.default = map.get("default").cloned();
        schema.extensions = extensions(map);

        if let Some(example) = map.get("example") {
            schema.examples.push(example.clone());
        }
        match map.get("examples") {
            Some(Value::Array(items)) => schema.examples.extend(items.iter().cloned()),
            Some(other) if aligned => {
                self.mistyped(scope, "examples", pointer, "an array", other);
            }
            _ => {}
        }

        match map.get("enum") {
            Some(Value::Array(items)) => schema.enum_values = Some(items.clone()),
            Some(other) => self.mistyped(scope, "enum", pointer, "an array", other),
            None => {}
        }
        if let Some(constant) = map.get("const") {
            if aligned {
                schema.enum_values = Some(vec![constant.clone()]);
            } else {
                self.unsupported_field(scope, map, "const", pointer);
            }
        }

        if let Some(nullable) = self.boolean(scope, map, "nullable", pointer) {
            schema.nullable |= nullable;
            if aligned {
                self.warning(
                    scope,
                    DiagnosticKind::UnsupportedFeature,
                    &pointer.push("nullable"),
                    "'nullable' is an OpenAPI 3.0 keyword; use a \"null\" type member instead",
                );
            }
        }
    }

    /// Reads `type`, folding a `"null"` member into `nullable` unless it is the only type.
    fn read_types(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        pointer: &JsonPointer,
        nullable: &mut bool,
    ) -> Vec<&'r str> {
        let Some(raw) = map.get("type") else {
            return Vec::new();
        };
        let aligned = self.version.is_json_schema_aligned();
        let at = pointer.push("type");
        let names: Vec<&'r str> = match raw {
            Value::String(name) => vec![name.as_str()],
            Value::Array(items) if aligned => {
                let mut names = Vec::new();
                for (idx, item) in items.iter().enumerate() {
                    match item.as_str() {
                        Some(name) => names.push(name),
                        None => self.error(
                            scope,
                            DiagnosticKind::UnexpectedType,
                            &at.push(idx.to_string()),
                            format!("type entries must be strings, found {}", value_kind(item)),
                        ),
                    }
                }
                names
            }
            Value::Array(_) => {
                self.error(
                    scope,
                    DiagnosticKind::UnexpectedType,
                    &at,
                    "type arrays require OpenAPI 3.1 or later",
                );
                return Vec::new();
            }
            other => {
                self.mistyped(scope, "type", pointer, "a string", other);
                return Vec::new();
            }
        };

        let mut types = Vec::new();
        let mut null = None;
        for name in names {
            if name == "null" && aligned {
                *nullable = true;
                null = Some(name);
            } else if TYPE_NAMES.contains(&name) {
                if !types.contains(&name) {
                    types.push(name);
                }
            } else {
                self.error(
                    scope,
                    DiagnosticKind::UnexpectedType,
                    &at,
                    format!("unknown schema type '{}'", name),
                );
            }
        }
        if types.is_empty() {
            types.extend(null);
        }
        types
    }

    fn build_kind(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        pointer: &JsonPointer,
        types: &[&str],
    ) -> SchemaKind {
        let structural = match types {
            [] => self.inferred_kind(scope, map, pointer),
            [single] => self.typed_kind(scope, map, pointer, single),
            many => {
                let mut any_of = Vec::with_capacity(many.len());
                for ty in many {
                    let mut member = Schema::placeholder(pointer.clone(), self.label(scope));
                    member.kind = self.typed_kind(scope, map, pointer, ty);
                    any_of.push(self.graph.alloc(member));
                }
                SchemaKind::Composed(ComposedSchema {
                    any_of,
                    ..ComposedSchema::default()
                })
            }
        };
        let discriminator = self.read_discriminator(scope, map, pointer);

        if !COMPOSITION_KEYWORDS.iter().any(|key| map.contains_key(*key)) {
            return match (structural, discriminator) {
                (kind, None) => kind,
                (SchemaKind::Object(mut object), discriminator) => {
                    object.discriminator = discriminator;
                    SchemaKind::Object(object)
                }
                (SchemaKind::Any, discriminator) => SchemaKind::Object(ObjectSchema {
                    discriminator,
                    ..ObjectSchema::default()
                }),
                (SchemaKind::Composed(mut composed), discriminator) => {
                    composed.discriminator = discriminator;
                    SchemaKind::Composed(composed)
                }
                (kind, Some(_)) => {
                    self.warning(
                        scope,
                        DiagnosticKind::InvalidDiscriminator,
                        &pointer.push("discriminator"),
                        "discriminator is only meaningful on object or composed schemas",
                    );
                    kind
                }
            };
        }

        let all_of = self.schema_list(scope, map, "allOf", pointer);
        let one_of = self.schema_list(scope, map, "oneOf", pointer);
        let any_of = self.schema_list(scope, map, "anyOf", pointer);
        let not = map
            .get("not")
            .map(|value| self.bind_schema(scope, value, pointer.push("not")));
        let inline = match structural {
            SchemaKind::Any => None,
            kind => {
                let mut node = Schema::placeholder(pointer.clone(), self.label(scope));
                node.kind = kind;
                Some(self.graph.alloc(node))
            }
        };

        SchemaKind::Composed(ComposedSchema {
            all_of,
            one_of,
            any_of,
            not,
            inline,
            discriminator,
        })
    }

    fn inferred_kind(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        pointer: &JsonPointer,
    ) -> SchemaKind {
        if OBJECT_KEYWORDS.iter().any(|key| map.contains_key(*key)) {
            SchemaKind::Object(self.bind_object(scope, map, pointer))
        } else if ARRAY_KEYWORDS.iter().any(|key| map.contains_key(*key)) {
            SchemaKind::Array(self.bind_array(scope, map, pointer))
        } else {
            SchemaKind::Any
        }
    }

    fn typed_kind(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        pointer: &JsonPointer,
        ty: &str,
    ) -> SchemaKind {
        match ty {
            "object" => SchemaKind::Object(self.bind_object(scope, map, pointer)),
            "array" => {
                if !self.version.is_json_schema_aligned() && !map.contains_key("items") {
                    self.error(
                        scope,
                        DiagnosticKind::MissingField,
                        pointer,
                        "array schema is missing required field 'items'",
                    );
                }
                SchemaKind::Array(self.bind_array(scope, map, pointer))
            }
            other => match PrimitiveType::parse(other) {
                Some(primitive) => {
                    SchemaKind::Primitive(self.bind_primitive(scope, map, pointer, primitive))
                }
                None => SchemaKind::Any,
            },
        }
    }

    fn bind_object(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        pointer: &JsonPointer,
    ) -> ObjectSchema {
        let mut object = ObjectSchema::default();
        if let Some(properties) = self.field_object(scope, map, "properties", pointer) {
            let at = pointer.push("properties");
            for (name, value) in properties {
                let id = self.bind_schema(scope, value, at.push(name));
                object.properties.insert(name.clone(), id);
            }
        }
        object.required = self.strings(scope, map, "required", pointer);
        object.additional_properties = match map.get("additionalProperties") {
            None => AdditionalProperties::default(),
            Some(Value::Bool(allowed)) => AdditionalProperties::Allowed(*allowed),
            Some(value @ Value::Object(_)) => AdditionalProperties::Schema(self.bind_schema(
                scope,
                value,
                pointer.push("additionalProperties"),
            )),
            Some(other) => {
                self.mistyped(scope, "additionalProperties", pointer, "a boolean or schema", other);
                AdditionalProperties::default()
            }
        };
        object.min_properties = self.count(scope, map, "minProperties", pointer);
        object.max_properties = self.count(scope, map, "maxProperties", pointer);
        object
    }

    fn bind_array(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        pointer: &JsonPointer,
    ) -> ArraySchema {
        let mut array = ArraySchema::default();
        match map.get("items") {
            None => {}
            Some(Value::Array(_)) => self.error(
                scope,
                DiagnosticKind::UnexpectedType,
                &pointer.push("items"),
                "'items' must be a single schema; tuple forms use 'prefixItems'",
            ),
            Some(value) => array.items = Some(self.bind_schema(scope, value, pointer.push("items"))),
        }
        if self.version.is_json_schema_aligned() {
            array.prefix_items = self.schema_list(scope, map, "prefixItems", pointer);
        } else {
            self.unsupported_field(scope, map, "prefixItems", pointer);
        }
        array.min_items = self.count(scope, map, "minItems", pointer);
        array.max_items = self.count(scope, map, "maxItems", pointer);
        array.unique_items = self.boolean(scope, map, "uniqueItems", pointer).unwrap_or(false);
        array
    }

    fn bind_primitive(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        pointer: &JsonPointer,
        ty: PrimitiveType,
    ) -> PrimitiveSchema {
        let mut primitive = PrimitiveSchema::new(ty);
        primitive.format = self.string(scope, map, "format", pointer);
        primitive.minimum = self.number(scope, map, "minimum", pointer);
        primitive.maximum = self.number(scope, map, "maximum", pointer);
        primitive.exclusive_minimum =
            self.exclusive_bound(scope, map, "exclusiveMinimum", pointer, &mut primitive.minimum);
        primitive.exclusive_maximum =
            self.exclusive_bound(scope, map, "exclusiveMaximum", pointer, &mut primitive.maximum);
        primitive.multiple_of = self.number(scope, map, "multipleOf", pointer);
        primitive.min_length = self.count(scope, map, "minLength", pointer);
        primitive.max_length = self.count(scope, map, "maxLength", pointer);
        primitive.pattern = self.string(scope, map, "pattern", pointer);
        primitive
    }

    /// Reads an exclusive bound; the 3.0 boolean form moves `bound` over.
    fn exclusive_bound(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        key: &str,
        pointer: &JsonPointer,
        bound: &mut Option<f64>,
    ) -> Option<f64> {
        let aligned = self.version.is_json_schema_aligned();
        match map.get(key)? {
            Value::Bool(exclusive) if !aligned => {
                if *exclusive {
                    bound.take()
                } else {
                    None
                }
            }
            Value::Number(n) if aligned => n.as_f64(),
            Value::Bool(_) => {
                self.error(
                    scope,
                    DiagnosticKind::UnexpectedType,
                    &pointer.push(key),
                    format!("'{}' must be a number in OpenAPI {}", key, self.version),
                );
                None
            }
            Value::Number(_) => {
                self.error(
                    scope,
                    DiagnosticKind::UnexpectedType,
                    &pointer.push(key),
                    format!("'{}' must be a boolean in OpenAPI 3.0", key),
                );
                None
            }
            other => {
                self.mistyped(scope, key, pointer, "a number", other);
                None
            }
        }
    }

    fn read_discriminator(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        pointer: &JsonPointer,
    ) -> Option<Discriminator> {
        let object = self.field_object(scope, map, "discriminator", pointer)?;
        let at = pointer.push("discriminator");
        let property_name =
            self.required_string(scope, object, "propertyName", &at, "discriminator")?;

        let mut mapping = IndexMap::new();
        if let Some(entries) = self.field_object(scope, object, "mapping", &at) {
            let mapping_at = at.push("mapping");
            for (key, target) in entries {
                let Some(target) = target.as_str() else {
                    self.mistyped(scope, key, &mapping_at, "a string", target);
                    continue;
                };
                // Bare names refer to component schemas.
                let target_ref = if target.contains('#') || target.contains('/') {
                    target.to_string()
                } else {
                    format!("#/components/schemas/{}", escape_pointer_segment(target))
                };
                let state = self.resolve_schema_ref(scope, &target_ref, &mapping_at.push(key));
                mapping.insert(key.clone(), Reference { target_ref, state });
            }
        }
        Some(Discriminator {
            property_name,
            mapping,
        })
    }

    fn schema_list(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        key: &str,
        pointer: &JsonPointer,
    ) -> Vec<SchemaId> {
        let Some(value) = map.get(key) else {
            return Vec::new();
        };
        let at = pointer.push(key);
        let items = self.array(scope, value, &at, &format!("'{}'", key));
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| self.bind_schema(scope, item, at.push(idx.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ImportOptions;
    use crate::oas::binder::bind_document;
    use crate::oas::models::Document;
    use crate::oas::registry::DocumentRegistry;
    use crate::oas::report::{DiagnosticKind, ValidationReport};
    use crate::oas::schema::*;
    use crate::oas::version::detect_version;

    fn bind_schemas(text: &str, options: &ImportOptions) -> (Document, ValidationReport) {
        let mut registry = DocumentRegistry::new();
        registry.register("openapi.yaml", text).unwrap();
        let (version, declared) =
            detect_version(&registry.get("openapi.yaml").unwrap().root).unwrap();
        bind_document(&registry, "openapi.yaml", options, version, &declared).unwrap()
    }

    fn component<'d>(doc: &'d Document, name: &str) -> &'d Schema {
        doc.component_schema(name).unwrap()
    }

    #[test]
    fn test_recursive_schema_produces_cyclic_edge() {
        let (doc, report) = bind_schemas(
            r##"
openapi: 3.0.3
info: {title: t, version: v}
paths: {}
components:
  schemas:
    Node:
      type: object
      properties:
        value: {type: string}
        children:
          type: array
          items: {$ref: "#/components/schemas/Node"}
"##,
            &ImportOptions::default(),
        );
        assert!(report.is_empty(), "{report}");
        let node_id = doc.components.schemas["Node"];
        let node = component(&doc, "Node").as_object().unwrap();
        let SchemaKind::Array(children) = &doc.schemas[node.properties["children"]].kind else {
            panic!("children should be an array");
        };
        let item = doc.schemas[children.items.unwrap()].as_reference().unwrap();
        assert_eq!(item.state, ResolutionState::Cyclic(node_id));
        assert!(doc.schemas.iter().all(|(_, s)| !matches!(
            s.as_reference().map(|r| r.state),
            Some(ResolutionState::Resolving)
        )));
    }

    #[test]
    fn test_shared_target_bound_once() {
        let (doc, _) = bind_schemas(
            r##"
openapi: 3.0.3
info: {title: t, version: v}
paths: {}
components:
  schemas:
    A:
      type: object
      properties:
        x: {$ref: "#/components/schemas/Shared"}
        y: {$ref: "#/components/schemas/Shared"}
    Shared: {type: integer}
"##,
            &ImportOptions::default(),
        );
        let a = component(&doc, "A").as_object().unwrap();
        let x = doc.schemas.resolve(a.properties["x"]);
        let y = doc.schemas.resolve(a.properties["y"]);
        assert_eq!(x, y);
        assert_eq!(x, Some(doc.components.schemas["Shared"]));
        assert_eq!(component(&doc, "Shared").name.as_deref(), Some("Shared"));
    }

    #[test]
    fn test_nullable_forms() {
        let (doc, report) = bind_schemas(
            r#"
openapi: 3.0.3
info: {title: t, version: v}
paths: {}
components:
  schemas:
    Legacy: {type: string, nullable: true}
"#,
            &ImportOptions::default(),
        );
        assert!(report.is_empty(), "{report}");
        assert!(component(&doc, "Legacy").nullable);

        let (doc, report) = bind_schemas(
            r#"
openapi: 3.1.0
info: {title: t, version: v}
components:
  schemas:
    Modern: {type: [string, "null"]}
    Mixed: {type: [string, integer]}
    Old: {type: string, nullable: true}
    OnlyNull: {type: "null"}
    NullArray: {type: ["null", "null"]}
"#,
            &ImportOptions::default(),
        );
        let modern = component(&doc, "Modern");
        assert!(modern.nullable);
        assert!(matches!(
            &modern.kind,
            SchemaKind::Primitive(p) if p.ty == PrimitiveType::String
        ));
        let SchemaKind::Composed(mixed) = &component(&doc, "Mixed").kind else {
            panic!("type array should compose");
        };
        assert_eq!(mixed.any_of.len(), 2);
        assert!(component(&doc, "Old").nullable);
        for name in ["OnlyNull", "NullArray"] {
            assert!(
                matches!(
                    &component(&doc, name).kind,
                    SchemaKind::Primitive(p) if p.ty == PrimitiveType::Null
                ),
                "{name}"
            );
        }
        assert_eq!(report.of_kind(DiagnosticKind::UnsupportedFeature).count(), 1);
        assert_eq!(report.len(), 1, "{report}");
    }

    #[test]
    fn test_version_specific_keywords() {
        let (doc, report) = bind_schemas(
            r#"
openapi: 3.0.3
info: {title: t, version: v}
paths: {}
components:
  schemas:
    Bool: true
    Bounded: {type: integer, minimum: 1, exclusiveMinimum: true}
    Tuple: {type: [string, integer]}
"#,
            &ImportOptions::default(),
        );
        assert_eq!(report.of_kind(DiagnosticKind::UnexpectedType).count(), 2);
        let SchemaKind::Primitive(bounded) = &component(&doc, "Bounded").kind else {
            panic!("expected primitive");
        };
        assert_eq!(bounded.minimum, None);
        assert_eq!(bounded.exclusive_minimum, Some(1.0));

        let (doc, report) = bind_schemas(
            r#"
openapi: 3.1.0
info: {title: t, version: v}
components:
  schemas:
    Never: false
    Fixed: {const: 3}
    Bounded: {type: number, exclusiveMaximum: 10}
"#,
            &ImportOptions::default(),
        );
        assert!(report.is_empty(), "{report}");
        assert_eq!(component(&doc, "Never").kind, SchemaKind::Never);
        assert_eq!(
            component(&doc, "Fixed").enum_values,
            Some(vec![serde_json::json!(3)])
        );
    }

    #[test]
    fn test_ref_siblings_by_version() {
        let text = |version: &str| {
            format!(
                r##"
openapi: {version}
info: {{title: t, version: v}}
paths: {{}}
components:
  schemas:
    Id: {{type: string}}
    Alias:
      $ref: "#/components/schemas/Id"
      description: Identifier alias
"##
            )
        };
        let (doc, report) = bind_schemas(&text("3.0.3"), &ImportOptions::default());
        assert_eq!(report.of_kind(DiagnosticKind::UnsupportedFeature).count(), 1);
        assert!(component(&doc, "Alias").description.is_none());

        let (doc, report) = bind_schemas(&text("3.1.0"), &ImportOptions::default());
        assert!(report.is_empty(), "{report}");
        assert_eq!(
            component(&doc, "Alias").description.as_deref(),
            Some("Identifier alias")
        );
    }

    #[test]
    fn test_composition_with_inline_and_discriminator() {
        let (doc, report) = bind_schemas(
            r##"
openapi: 3.0.3
info: {title: t, version: v}
paths: {}
components:
  schemas:
    Cat: {type: object, properties: {kind: {type: string}}}
    Dog: {type: object, properties: {kind: {type: string}}}
    Pet:
      oneOf:
        - $ref: "#/components/schemas/Cat"
        - $ref: "#/components/schemas/Dog"
      discriminator:
        propertyName: kind
        mapping:
          cat: Cat
          dog: "#/components/schemas/Dog"
      properties:
        name: {type: string}
"##,
            &ImportOptions::default(),
        );
        assert!(report.is_empty(), "{report}");
        let SchemaKind::Composed(pet) = &component(&doc, "Pet").kind else {
            panic!("expected composed");
        };
        assert_eq!(pet.one_of.len(), 2);
        assert!(doc.schemas[pet.inline.unwrap()].as_object().is_some());
        let discriminator = pet.discriminator.as_ref().unwrap();
        assert_eq!(discriminator.mapping["cat"].target_ref, "#/components/schemas/Cat");
        assert_eq!(
            discriminator.mapping["cat"].state,
            ResolutionState::Resolved(doc.components.schemas["Cat"])
        );
    }

    #[test]
    fn test_depth_limit_yields_any() {
        let (doc, report) = bind_schemas(
            r#"
openapi: 3.0.3
info: {title: t, version: v}
paths: {}
components:
  schemas:
    Deep:
      type: object
      properties:
        a:
          type: object
          properties:
            b:
              type: object
              properties:
                c: {type: string}
"#,
            &ImportOptions::default().with_max_depth(2),
        );
        assert_eq!(report.of_kind(DiagnosticKind::DepthLimitExceeded).count(), 1);
        let deep = component(&doc, "Deep").as_object().unwrap();
        let a = doc.schemas[deep.properties["a"]].as_object().unwrap();
        assert_eq!(doc.schemas[a.properties["b"]].kind, SchemaKind::Any);
    }

    #[test]
    fn test_unknown_type_reported() {
        let (_, report) = bind_schemas(
            r#"
openapi: 3.0.3
info: {title: t, version: v}
paths: {}
components:
  schemas:
    Odd: {type: date}
"#,
            &ImportOptions::default(),
        );
        let diagnostic = report.of_kind(DiagnosticKind::UnexpectedType).next().unwrap();
        assert_eq!(diagnostic.pointer.to_string(), "#/components/schemas/Odd/type");
    }
}
