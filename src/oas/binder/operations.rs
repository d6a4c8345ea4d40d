//! Path Item, Operation and related object binding.

use super::{extensions, Binder, Resolved, Scope};
use crate::oas::models::{
    Callback, Example, Header, HttpMethod, Link, MediaType, Operation, Parameter,
    ParameterLocation, PathItem, RequestBody, Response,
};
use crate::oas::pointer::JsonPointer;
use crate::oas::report::DiagnosticKind;
use indexmap::IndexMap;
use log::trace;
use serde_json::Value;

impl<'r> Binder<'r> {
    pub(super) fn bind_path_item(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
        path: &str,
    ) -> Option<PathItem> {
        let resolved = self.resolve_object(scope, value, pointer.clone())?;
        let key = self.enter_object(scope, &pointer, &resolved)?;
        let item = self.path_item_fields(resolved, pointer, path);
        self.in_progress.remove(&key);
        item
    }

    fn path_item_fields(
        &mut self,
        resolved: Resolved<'r>,
        pointer: JsonPointer,
        path: &str,
    ) -> Option<PathItem> {
        let Resolved {
            scope,
            pointer: target,
            value,
            reference,
        } = resolved;
        let map = self.object(scope, value, &target, "path item")?;
        trace!("binding path item {}", path);

        let mut item = PathItem {
            summary: self.string(scope, map, "summary", &target),
            description: self.string(scope, map, "description", &target),
            servers: self.bind_servers(scope, map.get("servers"), &target.push("servers")),
            parameters: self.bind_parameters(scope, map.get("parameters"), &target.push("parameters")),
            reference,
            document: self.label(scope),
            location: pointer,
            ..PathItem::default()
        };
        for method in HttpMethod::ALL {
            let Some(operation) = map.get(method.as_str()) else {
                continue;
            };
            let at = target.push(method.as_str());
            if let Some(operation) = self.bind_operation(scope, operation, at, method, path) {
                item.operations.insert(method, operation);
            }
        }
        Some(item)
    }

    fn bind_operation(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
        method: HttpMethod,
        path: &str,
    ) -> Option<Operation> {
        let map = self.object(scope, value, &pointer, "operation")?;

        let responses = match map.get("responses") {
            Some(responses) => Some(self.bind_responses(scope, responses, &pointer.push("responses"))),
            None => {
                if self.version.requires_operation_responses() {
                    self.error(
                        scope,
                        DiagnosticKind::MissingField,
                        &pointer,
                        "operation is missing required field 'responses'",
                    );
                }
                None
            }
        };
        let request_body = map
            .get("requestBody")
            .and_then(|body| self.bind_request_body(scope, body, pointer.push("requestBody")));
        let security = map
            .get("security")
            .map(|security| self.bind_security(scope, security, &pointer.push("security")));

        Some(Operation {
            method,
            path: path.to_string(),
            operation_id: self.string(scope, map, "operationId", &pointer),
            summary: self.string(scope, map, "summary", &pointer),
            description: self.string(scope, map, "description", &pointer),
            tags: self.strings(scope, map, "tags", &pointer),
            parameters: self.bind_parameters(scope, map.get("parameters"), &pointer.push("parameters")),
            request_body,
            responses,
            callbacks: self.bind_callbacks(scope, map.get("callbacks"), &pointer.push("callbacks")),
            deprecated: self.boolean(scope, map, "deprecated", &pointer).unwrap_or(false),
            security,
            servers: self.bind_servers(scope, map.get("servers"), &pointer.push("servers")),
            extensions: extensions(map),
            document: self.label(scope),
            location: pointer,
        })
    }

    fn bind_callbacks(
        &mut self,
        scope: Scope<'r>,
        value: Option<&'r Value>,
        pointer: &JsonPointer,
    ) -> IndexMap<String, Callback> {
        let mut callbacks = IndexMap::new();
        let Some(map) = value.and_then(|value| self.object(scope, value, pointer, "callbacks")) else {
            return callbacks;
        };
        for (name, entry) in map {
            if let Some(callback) = self.bind_callback(scope, entry, pointer.push(name)) {
                callbacks.insert(name.clone(), callback);
            }
        }
        callbacks
    }

    pub(super) fn bind_callback(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
    ) -> Option<Callback> {
        let resolved = self.resolve_object(scope, value, pointer.clone())?;
        let key = self.enter_object(scope, &pointer, &resolved)?;
        let callback = self.callback_expressions(resolved);
        self.in_progress.remove(&key);
        callback
    }

    fn callback_expressions(&mut self, resolved: Resolved<'r>) -> Option<Callback> {
        let Resolved {
            scope,
            pointer: target,
            value,
            reference,
        } = resolved;
        let map = self.object(scope, value, &target, "callback")?;
        let mut callback = Callback {
            reference,
            ..Callback::default()
        };
        for (expression, item) in map {
            if expression.starts_with("x-") {
                continue;
            }
            if let Some(item) = self.bind_path_item(scope, item, target.push(expression), expression) {
                callback.expressions.insert(expression.clone(), item);
            }
        }
        Some(callback)
    }

    fn bind_parameters(
        &mut self,
        scope: Scope<'r>,
        value: Option<&'r Value>,
        pointer: &JsonPointer,
    ) -> Vec<Parameter> {
        let Some(value) = value else {
            return Vec::new();
        };
        let items = self.array(scope, value, pointer, "parameters");
        items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| self.bind_parameter(scope, item, pointer.push(idx.to_string())))
            .collect()
    }

    pub(super) fn bind_parameter(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
    ) -> Option<Parameter> {
        let Resolved {
            scope,
            pointer: target,
            value,
            reference,
        } = self.resolve_object(scope, value, pointer.clone())?;
        let map = self.object(scope, value, &target, "parameter")?;

        let name = self.required_string(scope, map, "name", &target, "parameter");
        let location = match self.required_string(scope, map, "in", &target, "parameter") {
            Some(raw) => {
                let parsed = ParameterLocation::parse(&raw);
                if parsed.is_none() {
                    self.error(
                        scope,
                        DiagnosticKind::UnexpectedType,
                        &target.push("in"),
                        format!("unknown parameter location '{}'", raw),
                    );
                }
                parsed
            }
            None => None,
        };
        let (name, location) = (name?, location?);

        if map.contains_key("schema") && map.contains_key("content") {
            self.error(
                scope,
                DiagnosticKind::UnexpectedType,
                &target,
                format!("parameter '{}' must not define both 'schema' and 'content'", name),
            );
        }

        Some(Parameter {
            description: self.string(scope, map, "description", &target),
            required: self.boolean(scope, map, "required", &target).unwrap_or(false),
            deprecated: self.boolean(scope, map, "deprecated", &target).unwrap_or(false),
            allow_empty_value: self
                .boolean(scope, map, "allowEmptyValue", &target)
                .unwrap_or(false),
            style: self.string(scope, map, "style", &target),
            explode: self.boolean(scope, map, "explode", &target),
            schema: map
                .get("schema")
                .map(|schema| self.bind_schema(scope, schema, target.push("schema"))),
            content: self.bind_content(scope, map.get("content"), &target.push("content")),
            name,
            location,
            reference,
            location_pointer: pointer,
        })
    }

    pub(super) fn bind_request_body(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
    ) -> Option<RequestBody> {
        let Resolved {
            scope,
            pointer: target,
            value,
            reference,
        } = self.resolve_object(scope, value, pointer)?;
        let map = self.object(scope, value, &target, "request body")?;
        if !map.contains_key("content") {
            self.error(
                scope,
                DiagnosticKind::MissingField,
                &target,
                "request body is missing required field 'content'",
            );
        }
        Some(RequestBody {
            description: self.string(scope, map, "description", &target),
            required: self.boolean(scope, map, "required", &target).unwrap_or(false),
            content: self.bind_content(scope, map.get("content"), &target.push("content")),
            reference,
        })
    }

    fn bind_responses(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: &JsonPointer,
    ) -> IndexMap<String, Response> {
        let mut responses = IndexMap::new();
        let Some(map) = self.object(scope, value, pointer, "responses") else {
            return responses;
        };
        for (code, entry) in map {
            if code.starts_with("x-") {
                continue;
            }
            if let Some(response) = self.bind_response(scope, entry, pointer.push(code)) {
                responses.insert(code.clone(), response);
            }
        }
        responses
    }

    pub(super) fn bind_response(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
    ) -> Option<Response> {
        let Resolved {
            scope,
            pointer: target,
            value,
            reference,
        } = self.resolve_object(scope, value, pointer)?;
        let map = self.object(scope, value, &target, "response")?;
        let description = if self.version.requires_response_description() {
            self.required_string(scope, map, "description", &target, "response")
        } else {
            self.string(scope, map, "description", &target)
        };

        let mut headers = IndexMap::new();
        if let Some(entries) = self.field_object(scope, map, "headers", &target) {
            let at = target.push("headers");
            for (name, header) in entries {
                if let Some(header) = self.bind_header(scope, header, at.push(name)) {
                    headers.insert(name.clone(), header);
                }
            }
        }
        let mut links = IndexMap::new();
        if let Some(entries) = self.field_object(scope, map, "links", &target) {
            let at = target.push("links");
            for (name, link) in entries {
                if let Some(link) = self.bind_link(scope, link, at.push(name)) {
                    links.insert(name.clone(), link);
                }
            }
        }

        Some(Response {
            description,
            headers,
            content: self.bind_content(scope, map.get("content"), &target.push("content")),
            links,
            reference,
        })
    }

    pub(super) fn bind_header(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
    ) -> Option<Header> {
        let Resolved {
            scope,
            pointer: target,
            value,
            reference,
        } = self.resolve_object(scope, value, pointer)?;
        let map = self.object(scope, value, &target, "header")?;
        Some(Header {
            description: self.string(scope, map, "description", &target),
            required: self.boolean(scope, map, "required", &target).unwrap_or(false),
            deprecated: self.boolean(scope, map, "deprecated", &target).unwrap_or(false),
            schema: map
                .get("schema")
                .map(|schema| self.bind_schema(scope, schema, target.push("schema"))),
            content: self.bind_content(scope, map.get("content"), &target.push("content")),
            reference,
        })
    }

    fn bind_content(
        &mut self,
        scope: Scope<'r>,
        value: Option<&'r Value>,
        pointer: &JsonPointer,
    ) -> IndexMap<String, MediaType> {
        let mut content = IndexMap::new();
        let Some(map) = value.and_then(|value| self.object(scope, value, pointer, "content")) else {
            return content;
        };
        for (media_type, entry) in map {
            let at = pointer.push(media_type);
            let Some(entry) = self.object(scope, entry, &at, "media type") else {
                continue;
            };
            let mut examples = IndexMap::new();
            if let Some(entries) = self.field_object(scope, entry, "examples", &at) {
                let examples_at = at.push("examples");
                for (name, example) in entries {
                    if let Some(example) = self.bind_example(scope, example, examples_at.push(name)) {
                        examples.insert(name.clone(), example);
                    }
                }
            }
            let media = MediaType {
                schema: entry
                    .get("schema")
                    .map(|schema| self.bind_schema(scope, schema, at.push("schema"))),
                example: entry.get("example").cloned(),
                examples,
            };
            content.insert(media_type.clone(), media);
        }
        content
    }

    pub(super) fn bind_example(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
    ) -> Option<Example> {
        let Resolved {
            scope,
            pointer: target,
            value,
            reference,
        } = self.resolve_object(scope, value, pointer)?;
        let map = self.object(scope, value, &target, "example")?;
        Some(Example {
            summary: self.string(scope, map, "summary", &target),
            description: self.string(scope, map, "description", &target),
            value: map.get("value").cloned(),
            external_value: self.string(scope, map, "externalValue", &target),
            reference,
        })
    }

    pub(super) fn bind_link(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
    ) -> Option<Link> {
        let Resolved {
            scope,
            pointer: target,
            value,
            reference,
        } = self.resolve_object(scope, value, pointer)?;
        let map = self.object(scope, value, &target, "link")?;
        if map.contains_key("operationId") && map.contains_key("operationRef") {
            self.error(
                scope,
                DiagnosticKind::UnexpectedType,
                &target,
                "link must not define both 'operationId' and 'operationRef'",
            );
        }
        let parameters = self
            .field_object(scope, map, "parameters", &target)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Some(Link {
            operation_id: self.string(scope, map, "operationId", &target),
            operation_ref: self.string(scope, map, "operationRef", &target),
            parameters,
            request_body: map.get("requestBody").cloned(),
            description: self.string(scope, map, "description", &target),
            reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ImportOptions;
    use crate::oas::binder::bind_document;
    use crate::oas::models::{Document, HttpMethod, ParameterLocation};
    use crate::oas::registry::DocumentRegistry;
    use crate::oas::report::{DiagnosticKind, ValidationReport};
    use crate::oas::version::detect_version;

    fn bind(text: &str) -> (Document, ValidationReport) {
        let mut registry = DocumentRegistry::new();
        registry.register("openapi.yaml", text).unwrap();
        let (version, declared) =
            detect_version(&registry.get("openapi.yaml").unwrap().root).unwrap();
        bind_document(
            &registry,
            "openapi.yaml",
            &ImportOptions::default(),
            version,
            &declared,
        )
        .unwrap()
    }

    const PETS: &str = r##"
openapi: 3.0.3
info: {title: Pets, version: "1"}
paths:
  /pets/{petId}:
    parameters:
      - $ref: "#/components/parameters/PetId"
    get:
      operationId: getPet
      tags: [pets]
      x-rate-limit: 10
      responses:
        "200":
          description: A pet
          content:
            application/json:
              schema: {type: object}
              examples:
                basic: {$ref: "#/components/examples/Basic"}
        default:
          $ref: "#/components/responses/Error"
      callbacks:
        onEvent:
          "{$request.body#/url}":
            post:
              requestBody:
                content:
                  application/json: {schema: {type: string}}
              responses:
                "204": {description: ack}
components:
  parameters:
    PetId: {name: petId, in: path, required: true, schema: {type: string}}
  examples:
    Basic: {summary: basic, value: {id: 1}}
  responses:
    Error: {description: failure}
"##;

    #[test]
    fn test_bind_operation_tree() {
        let (doc, report) = bind(PETS);
        assert!(report.is_empty(), "{report}");

        let item = &doc.paths["/pets/{petId}"];
        assert_eq!(item.parameters.len(), 1);
        let param = &item.parameters[0];
        assert_eq!(param.location, ParameterLocation::Path);
        assert_eq!(param.reference.as_deref(), Some("#/components/parameters/PetId"));
        assert_eq!(
            param.location_pointer.to_string(),
            "#/paths/~1pets~1{petId}/parameters/0"
        );

        let get = &item.operations[&HttpMethod::Get];
        assert_eq!(get.operation_id.as_deref(), Some("getPet"));
        assert_eq!(get.extensions.get("x-rate-limit"), Some(&serde_json::json!(10)));
        let responses = get.responses.as_ref().unwrap();
        assert_eq!(
            responses["default"].reference.as_deref(),
            Some("#/components/responses/Error")
        );
        let media = &responses["200"].content["application/json"];
        assert_eq!(media.examples["basic"].summary.as_deref(), Some("basic"));

        let callback = &get.callbacks["onEvent"];
        let post = &callback.expressions["{$request.body#/url}"].operations[&HttpMethod::Post];
        assert!(post.request_body.is_some());
        assert_eq!(doc.find_operation("getPet").map(|op| op.method), Some(HttpMethod::Get));
    }

    #[test]
    fn test_parameter_and_body_required_fields() {
        let (doc, report) = bind(
            r#"
openapi: 3.0.3
info: {title: t, version: v}
paths:
  /a:
    post:
      parameters:
        - in: query
        - name: flag
          in: body
      requestBody:
        description: nothing
      responses:
        "200": {}
"#,
        );
        let op = &doc.paths["/a"].operations[&HttpMethod::Post];
        assert!(op.parameters.is_empty());
        assert_eq!(report.of_kind(DiagnosticKind::MissingField).count(), 3);
        assert_eq!(report.of_kind(DiagnosticKind::UnexpectedType).count(), 1);
    }

    #[test]
    fn test_recursive_callbacks_are_cut() {
        let (doc, report) = bind(
            r##"
openapi: 3.1.0
info: {title: t, version: v}
components:
  callbacks:
    Again:
      "{$request.body#/url}":
        post:
          callbacks:
            nested: {$ref: "#/components/callbacks/Again"}
          responses:
            "200": {description: ok}
  pathItems:
    Hook:
      post:
        callbacks:
          back:
            "{$request.body#/next}": {$ref: "#/components/pathItems/Hook"}
        responses:
          "200": {description: ok}
"##,
        );
        let cycles: Vec<_> = report
            .of_kind(DiagnosticKind::CyclicReference)
            .map(|d| d.pointer.to_string())
            .collect();
        assert_eq!(cycles.len(), 2, "{report}");
        assert!(cycles[0].ends_with("/post/callbacks/nested"), "{}", cycles[0]);
        assert!(cycles[1].starts_with("#/components/pathItems/Hook/post/callbacks/back/"));

        let again = &doc.components.callbacks["Again"];
        let item = &again.expressions["{$request.body#/url}"];
        assert!(item.operations[&HttpMethod::Post].callbacks.is_empty());
        let hook = &doc.components.path_items["Hook"];
        assert!(hook.operations[&HttpMethod::Post].callbacks["back"]
            .expressions
            .is_empty());
    }

    #[test]
    fn test_responses_required_in_3_0_only() {
        let text = |version: &str| {
            format!(
                "openapi: {version}\ninfo: {{title: t, version: v}}\npaths:\n  /a:\n    get: {{}}\n"
            )
        };
        let (_, report) = bind(&text("3.0.3"));
        assert_eq!(report.of_kind(DiagnosticKind::MissingField).count(), 1);

        let (doc, report) = bind(&text("3.1.0"));
        assert!(report.is_empty(), "{report}");
        assert!(doc.paths["/a"].operations[&HttpMethod::Get].responses.is_none());
    }

    #[test]
    fn test_response_description_optional_in_3_2() {
        let text = |version: &str| {
            format!(
                "openapi: {version}\ninfo: {{title: t, version: v}}\npaths:\n  /a:\n    get:\n      responses:\n        \"204\": {{}}\n"
            )
        };
        let (_, report) = bind(&text("3.1.0"));
        assert_eq!(report.of_kind(DiagnosticKind::MissingField).count(), 1);
        let (_, report) = bind(&text("3.2.0"));
        assert!(report.is_empty(), "{report}");
    }
}
