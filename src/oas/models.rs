//! # Document Model
//!
//! The bound, fully-resolved representation of an OpenAPI document handed to
//! downstream consumers. Reusable objects reached through `$ref` are inlined
//! and remember the reference they came from; schemas live in the
//! document's [`SchemaGraph`].

use crate::oas::pointer::JsonPointer;
use crate::oas::schema::{Schema, SchemaGraph, SchemaId};
use crate::oas::version::SpecVersion;
use derive_more::Display;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Root of a bound OpenAPI document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// The declared `openapi` version text.
    pub openapi: String,
    /// Detected revision.
    pub version: SpecVersion,
    /// Info Object.
    pub info: Info,
    /// `jsonSchemaDialect` (3.1+).
    pub json_schema_dialect: Option<String>,
    /// Root `servers`.
    pub servers: Vec<Server>,
    /// `paths`, keyed by path template.
    pub paths: IndexMap<String, PathItem>,
    /// `webhooks` (3.1+), keyed by name.
    pub webhooks: IndexMap<String, PathItem>,
    /// Components Object.
    pub components: Components,
    /// Root security requirements.
    pub security: Vec<SecurityRequirement>,
    /// Tag declarations.
    pub tags: Vec<Tag>,
    /// `externalDocs`
    pub external_docs: Option<ExternalDocs>,
    /// Root specification extensions.
    pub extensions: IndexMap<String, Value>,
    /// Every schema bound while reading the document.
    pub schemas: SchemaGraph,
}

impl Document {
    /// The Components Object.
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Operations under `paths`, in document order, paired with their path template.
    pub fn operations(&self) -> impl Iterator<Item = (&str, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations
                .values()
                .map(move |operation| (path.as_str(), operation))
        })
    }

    /// Operations under `webhooks`, paired with the webhook name.
    pub fn webhook_operations(&self) -> impl Iterator<Item = (&str, &Operation)> {
        self.webhooks.iter().flat_map(|(name, item)| {
            item.operations
                .values()
                .map(move |operation| (name.as_str(), operation))
        })
    }

    /// Finds an operation under `paths` or `webhooks` by `operationId`.
    pub fn find_operation(&self, operation_id: &str) -> Option<&Operation> {
        self.operations()
            .chain(self.webhook_operations())
            .map(|(_, op)| op)
            .find(|op| op.operation_id.as_deref() == Some(operation_id))
    }

    /// Looks up a bound schema.
    pub fn schema(&self, id: SchemaId) -> Option<&Schema> {
        self.schemas.get(id)
    }

    /// Looks up a component schema by name.
    pub fn component_schema(&self, name: &str) -> Option<&Schema> {
        self.components
            .schemas
            .get(name)
            .and_then(|id| self.schemas.get(*id))
    }
}

/// Info Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Info {
    /// `title`
    pub title: String,
    /// `version`
    pub version: String,
    /// `summary` (3.1+)
    pub summary: Option<String>,
    /// `description`
    pub description: Option<String>,
    /// `termsOfService`
    pub terms_of_service: Option<String>,
    /// `contact`
    pub contact: Option<Contact>,
    /// `license`
    pub license: Option<License>,
}

/// Contact Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contact {
    /// `name`
    pub name: Option<String>,
    /// `url`
    pub url: Option<String>,
    /// `email`
    pub email: Option<String>,
}

/// License Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct License {
    /// `name`
    pub name: String,
    /// SPDX `identifier` (3.1+).
    pub identifier: Option<String>,
    /// `url`
    pub url: Option<String>,
}

/// Server Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Server {
    /// URL template.
    pub url: String,
    /// `description`
    pub description: Option<String>,
    /// Template variables.
    pub variables: IndexMap<String, ServerVariable>,
    /// Where the server was declared.
    pub location: JsonPointer,
}

/// Server Variable Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerVariable {
    /// `default`
    pub default: String,
    /// `enum`, when present.
    pub enum_values: Option<Vec<String>>,
    /// `description`
    pub description: Option<String>,
}

/// HTTP methods an operation can be bound to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// GET
    #[display("get")]
    Get,
    /// PUT
    #[display("put")]
    Put,
    /// POST
    #[display("post")]
    Post,
    /// DELETE
    #[display("delete")]
    Delete,
    /// OPTIONS
    #[display("options")]
    Options,
    /// HEAD
    #[display("head")]
    Head,
    /// PATCH
    #[display("patch")]
    Patch,
    /// TRACE
    #[display("trace")]
    Trace,
}

impl HttpMethod {
    /// All methods, in the order the OpenAPI specification lists them.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// The Path Item field name.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

/// Path Item Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathItem {
    /// `summary`
    pub summary: Option<String>,
    /// `description`
    pub description: Option<String>,
    /// Operations keyed by method, in document order.
    pub operations: IndexMap<HttpMethod, Operation>,
    /// Parameters shared by every operation.
    pub parameters: Vec<Parameter>,
    /// Path-level server overrides.
    pub servers: Vec<Server>,
    /// `$ref` this item was reached through.
    pub reference: Option<String>,
    /// Document the item's contents come from, when not the entry document.
    pub document: Option<String>,
    /// Where the item was found.
    pub location: JsonPointer,
}

impl PathItem {
    /// Parameters in effect for `operation`: path-level parameters, overridden
    /// by operation parameters with the same name and location.
    pub fn effective_parameters<'a>(&'a self, operation: &'a Operation) -> Vec<&'a Parameter> {
        let mut out: Vec<&Parameter> = self
            .parameters
            .iter()
            .filter(|shared| {
                !operation
                    .parameters
                    .iter()
                    .any(|own| own.same_identity(shared))
            })
            .collect();
        out.extend(operation.parameters.iter());
        out
    }
}

/// Operation Object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    /// Method the operation is bound to.
    pub method: HttpMethod,
    /// Path template (or webhook name) the operation belongs to.
    pub path: String,
    /// `operationId`
    pub operation_id: Option<String>,
    /// `summary`
    pub summary: Option<String>,
    /// `description`
    pub description: Option<String>,
    /// `tags`
    pub tags: Vec<String>,
    /// Parameters declared on the operation itself.
    pub parameters: Vec<Parameter>,
    /// `requestBody`
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code or `default`; `None` when the field is absent.
    pub responses: Option<IndexMap<String, Response>>,
    /// Callbacks keyed by name, then by runtime expression.
    pub callbacks: IndexMap<String, Callback>,
    /// `deprecated`
    pub deprecated: bool,
    /// Operation-level security; `None` inherits the root requirements.
    pub security: Option<Vec<SecurityRequirement>>,
    /// Operation-level server overrides.
    pub servers: Vec<Server>,
    /// Specification extensions.
    pub extensions: IndexMap<String, Value>,
    /// Document the operation lives in, when not the entry document.
    pub document: Option<String>,
    /// Where the operation was found.
    pub location: JsonPointer,
}

/// Callback Object: runtime expression to Path Item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Callback {
    /// Path items keyed by expression.
    pub expressions: IndexMap<String, PathItem>,
    /// `$ref` this callback was reached through.
    pub reference: Option<String>,
}

/// Parameter locations.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// `in: path`
    #[display("path")]
    Path,
    /// `in: query`
    #[display("query")]
    Query,
    /// `in: header`
    #[display("header")]
    Header,
    /// `in: cookie`
    #[display("cookie")]
    Cookie,
}

impl ParameterLocation {
    /// Parses the `in` field.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

/// Parameter Object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// `name`
    pub name: String,
    /// `in`
    pub location: ParameterLocation,
    /// `description`
    pub description: Option<String>,
    /// `required`
    pub required: bool,
    /// `deprecated`
    pub deprecated: bool,
    /// `allowEmptyValue`
    pub allow_empty_value: bool,
    /// `style`
    pub style: Option<String>,
    /// `explode`
    pub explode: Option<bool>,
    /// `schema`
    pub schema: Option<SchemaId>,
    /// `content` (mutually exclusive with `schema`).
    pub content: IndexMap<String, MediaType>,
    /// `$ref` this parameter was reached through.
    pub reference: Option<String>,
    /// Where the parameter was declared (the `$ref` site for referenced ones).
    pub location_pointer: JsonPointer,
}

impl Parameter {
    /// Two parameters are the same when name and location match; header
    /// names compare case-insensitively.
    pub fn same_identity(&self, other: &Parameter) -> bool {
        if self.location != other.location {
            return false;
        }
        match self.location {
            ParameterLocation::Header => self.name.eq_ignore_ascii_case(&other.name),
            _ => self.name == other.name,
        }
    }
}

/// Request Body Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestBody {
    /// `description`
    pub description: Option<String>,
    /// `required`
    pub required: bool,
    /// Media types keyed by content type.
    pub content: IndexMap<String, MediaType>,
    /// `$ref` this body was reached through.
    pub reference: Option<String>,
}

/// Media Type Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaType {
    /// `schema`
    pub schema: Option<SchemaId>,
    /// `example`
    pub example: Option<Value>,
    /// `examples`
    pub examples: IndexMap<String, Example>,
}

/// Response Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    /// `description`
    pub description: Option<String>,
    /// `headers`
    pub headers: IndexMap<String, Header>,
    /// Media types keyed by content type.
    pub content: IndexMap<String, MediaType>,
    /// `links`
    pub links: IndexMap<String, Link>,
    /// `$ref` this response was reached through.
    pub reference: Option<String>,
}

/// Header Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Header {
    /// `description`
    pub description: Option<String>,
    /// `required`
    pub required: bool,
    /// `deprecated`
    pub deprecated: bool,
    /// `schema`
    pub schema: Option<SchemaId>,
    /// `content`
    pub content: IndexMap<String, MediaType>,
    /// `$ref` this header was reached through.
    pub reference: Option<String>,
}

/// Example Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Example {
    /// `summary`
    pub summary: Option<String>,
    /// `description`
    pub description: Option<String>,
    /// `value`
    pub value: Option<Value>,
    /// `externalValue`
    pub external_value: Option<String>,
    /// `$ref` this example was reached through.
    pub reference: Option<String>,
}

/// Link Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Link {
    /// `operationId`
    pub operation_id: Option<String>,
    /// `operationRef`
    pub operation_ref: Option<String>,
    /// `parameters`
    pub parameters: IndexMap<String, Value>,
    /// `requestBody`
    pub request_body: Option<Value>,
    /// `description`
    pub description: Option<String>,
    /// `$ref` this link was reached through.
    pub reference: Option<String>,
}

/// Security Scheme Object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityScheme {
    /// Type-specific fields.
    pub kind: SecuritySchemeKind,
    /// `description`
    pub description: Option<String>,
    /// `$ref` this scheme was reached through.
    pub reference: Option<String>,
}

/// Where an API key is sent.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    /// Query string.
    #[display("query")]
    Query,
    /// Request header.
    #[display("header")]
    Header,
    /// Cookie.
    #[display("cookie")]
    Cookie,
}

/// The `type` of a Security Scheme with its required fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SecuritySchemeKind {
    /// `apiKey`
    ApiKey {
        /// Header, query or cookie name.
        name: String,
        /// Where the key is sent.
        location: ApiKeyLocation,
    },
    /// `http`
    Http {
        /// Authorization scheme, e.g. `bearer`.
        scheme: String,
        /// Bearer token format hint.
        bearer_format: Option<String>,
    },
    /// `oauth2`
    #[serde(rename = "oauth2")]
    OAuth2 {
        /// Supported flows.
        flows: OAuthFlows,
    },
    /// `openIdConnect`
    OpenIdConnect {
        /// Discovery URL.
        url: String,
    },
    /// `mutualTLS` (3.1+)
    #[serde(rename = "mutualTLS")]
    MutualTls,
}

impl SecuritySchemeKind {
    /// Whether requirements may list scopes for this scheme in OpenAPI 3.0.
    pub fn uses_scopes(&self) -> bool {
        matches!(
            self,
            SecuritySchemeKind::OAuth2 { .. } | SecuritySchemeKind::OpenIdConnect { .. }
        )
    }
}

/// OAuth Flows Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OAuthFlows {
    /// `implicit`
    pub implicit: Option<OAuthFlow>,
    /// `password`
    pub password: Option<OAuthFlow>,
    /// `clientCredentials`
    pub client_credentials: Option<OAuthFlow>,
    /// `authorizationCode`
    pub authorization_code: Option<OAuthFlow>,
}

impl OAuthFlows {
    /// True when no flow is configured.
    pub fn is_empty(&self) -> bool {
        self.implicit.is_none()
            && self.password.is_none()
            && self.client_credentials.is_none()
            && self.authorization_code.is_none()
    }
}

/// OAuth Flow Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OAuthFlow {
    /// `authorizationUrl`
    pub authorization_url: Option<String>,
    /// `tokenUrl`
    pub token_url: Option<String>,
    /// `refreshUrl`
    pub refresh_url: Option<String>,
    /// Scope name to description.
    pub scopes: IndexMap<String, String>,
}

/// Security Requirement Object. An empty map makes security optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityRequirement {
    /// Scheme name to required scopes.
    pub schemes: IndexMap<String, Vec<String>>,
    /// Where the requirement was declared.
    pub location: JsonPointer,
}

/// Tag Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tag {
    /// `name`
    pub name: String,
    /// `description`
    pub description: Option<String>,
    /// `externalDocs`
    pub external_docs: Option<ExternalDocs>,
}

/// External Documentation Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExternalDocs {
    /// `url`
    pub url: String,
    /// `description`
    pub description: Option<String>,
}

/// Components Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Components {
    /// `schemas`
    pub schemas: IndexMap<String, SchemaId>,
    /// `responses`
    pub responses: IndexMap<String, Response>,
    /// `parameters`
    pub parameters: IndexMap<String, Parameter>,
    /// `examples`
    pub examples: IndexMap<String, Example>,
    /// `requestBodies`
    pub request_bodies: IndexMap<String, RequestBody>,
    /// `headers`
    pub headers: IndexMap<String, Header>,
    /// `securitySchemes`
    pub security_schemes: IndexMap<String, SecurityScheme>,
    /// `links`
    pub links: IndexMap<String, Link>,
    /// `callbacks`
    pub callbacks: IndexMap<String, Callback>,
    /// `pathItems` (3.1+)
    pub path_items: IndexMap<String, PathItem>,
    /// Keys of every section as written, for key validation.
    #[serde(skip)]
    pub(crate) raw_keys: IndexMap<String, Vec<String>>,
}

impl Components {
    /// True when `section` was written with an entry named `name`, whether or not it bound.
    pub(crate) fn declares(&self, section: &str, name: &str) -> bool {
        self.raw_keys
            .get(section)
            .is_some_and(|keys| keys.iter().any(|key| key == name))
    }

    /// True when no section holds anything.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.responses.is_empty()
            && self.parameters.is_empty()
            && self.examples.is_empty()
            && self.request_bodies.is_empty()
            && self.headers.is_empty()
            && self.security_schemes.is_empty()
            && self.links.is_empty()
            && self.callbacks.is_empty()
            && self.path_items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, location: ParameterLocation, description: &str) -> Parameter {
        Parameter {
            name: name.into(),
            location,
            description: Some(description.into()),
            required: false,
            deprecated: false,
            allow_empty_value: false,
            style: None,
            explode: None,
            schema: None,
            content: IndexMap::new(),
            reference: None,
            location_pointer: JsonPointer::root(),
        }
    }

    fn operation(parameters: Vec<Parameter>) -> Operation {
        Operation {
            method: HttpMethod::Get,
            path: "/items".into(),
            operation_id: None,
            summary: None,
            description: None,
            tags: Vec::new(),
            parameters,
            request_body: None,
            responses: None,
            callbacks: IndexMap::new(),
            deprecated: false,
            security: None,
            servers: Vec::new(),
            extensions: IndexMap::new(),
            document: None,
            location: JsonPointer::root(),
        }
    }

    #[test]
    fn test_effective_parameters_override() {
        let item = PathItem {
            parameters: vec![
                param("limit", ParameterLocation::Query, "shared"),
                param("X-Trace", ParameterLocation::Header, "shared"),
            ],
            ..PathItem::default()
        };
        let op = operation(vec![
            param("limit", ParameterLocation::Query, "own"),
            param("x-trace", ParameterLocation::Header, "own"),
            param("limit", ParameterLocation::Header, "own"),
        ]);

        let effective = item.effective_parameters(&op);
        assert_eq!(effective.len(), 3);
        assert!(effective
            .iter()
            .all(|p| p.description.as_deref() == Some("own")));
    }

    #[test]
    fn test_http_method_order() {
        let names: Vec<&str> = HttpMethod::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(
            names,
            ["get", "put", "post", "delete", "options", "head", "patch", "trace"]
        );
        assert_eq!(HttpMethod::Patch.to_string(), "patch");
    }

    #[test]
    fn test_parameter_location_parse() {
        assert_eq!(ParameterLocation::parse("path"), Some(ParameterLocation::Path));
        assert_eq!(ParameterLocation::parse("body"), None);
    }
}
