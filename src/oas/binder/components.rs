//! Components Object and Security Scheme binding.

use super::{Binder, Resolved, Scope};
use crate::oas::models::{
    ApiKeyLocation, Components, OAuthFlow, OAuthFlows, SecurityScheme, SecuritySchemeKind,
};
use crate::oas::pointer::JsonPointer;
use crate::oas::report::DiagnosticKind;
use indexmap::IndexMap;
use log::debug;
use serde_json::{Map, Value};

impl<'r> Binder<'r> {
    pub(super) fn bind_components(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
    ) -> Components {
        let mut components = Components::default();
        let Some(map) = self.object(scope, value, &pointer, "components") else {
            return components;
        };
        for (section, entries) in map {
            if let Value::Object(entries) = entries {
                if !section.starts_with("x-") {
                    components
                        .raw_keys
                        .insert(section.clone(), entries.keys().cloned().collect());
                }
            }
        }

        if let Some(entries) = self.field_object(scope, map, "schemas", &pointer) {
            let at = pointer.push("schemas");
            for (name, schema) in entries {
                let id = self.bind_schema(scope, schema, at.push(name));
                if let Some(node) = self.graph.get_mut(id) {
                    node.name.get_or_insert_with(|| name.clone());
                }
                components.schemas.insert(name.clone(), id);
            }
        }

        components.responses = self.bind_section(scope, map, "responses", &pointer, Self::bind_response);
        components.parameters =
            self.bind_section(scope, map, "parameters", &pointer, Self::bind_parameter);
        components.examples = self.bind_section(scope, map, "examples", &pointer, Self::bind_example);
        components.request_bodies =
            self.bind_section(scope, map, "requestBodies", &pointer, Self::bind_request_body);
        components.headers = self.bind_section(scope, map, "headers", &pointer, Self::bind_header);
        components.security_schemes = self.bind_section(
            scope,
            map,
            "securitySchemes",
            &pointer,
            Self::bind_security_scheme,
        );
        components.links = self.bind_section(scope, map, "links", &pointer, Self::bind_link);
        components.callbacks = self.bind_section(scope, map, "callbacks", &pointer, Self::bind_callback);
        if self.version.supports_webhooks() {
            components.path_items =
                self.bind_section(scope, map, "pathItems", &pointer, |binder, scope, value, at| {
                    let name = at.last().unwrap_or_default();
                    binder.bind_path_item(scope, value, at, &name)
                });
        } else {
            self.unsupported_field(scope, map, "pathItems", &pointer);
        }

        debug!(
            "bound components: {} schemas, {} parameters, {} responses, {} security schemes",
            components.schemas.len(),
            components.parameters.len(),
            components.responses.len(),
            components.security_schemes.len()
        );
        components
    }

    fn bind_section<T>(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        section: &str,
        pointer: &JsonPointer,
        bind: impl Fn(&mut Self, Scope<'r>, &'r Value, JsonPointer) -> Option<T>,
    ) -> IndexMap<String, T> {
        let mut out = IndexMap::new();
        let Some(entries) = self.field_object(scope, map, section, pointer) else {
            return out;
        };
        let at = pointer.push(section);
        for (name, value) in entries {
            if let Some(bound) = bind(self, scope, value, at.push(name)) {
                out.insert(name.clone(), bound);
            }
        }
        out
    }

    fn bind_security_scheme(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: JsonPointer,
    ) -> Option<SecurityScheme> {
        let Resolved {
            scope,
            pointer: target,
            value,
            reference,
        } = self.resolve_object(scope, value, pointer)?;
        let map = self.object(scope, value, &target, "security scheme")?;
        let ty = self.required_string(scope, map, "type", &target, "security scheme")?;

        let kind = match ty.as_str() {
            "apiKey" => {
                let owner = "apiKey security scheme";
                let name = self.required_string(scope, map, "name", &target, owner);
                let location = match self.required_string(scope, map, "in", &target, owner) {
                    Some(raw) => {
                        let location = match raw.as_str() {
                            "query" => Some(ApiKeyLocation::Query),
                            "header" => Some(ApiKeyLocation::Header),
                            "cookie" => Some(ApiKeyLocation::Cookie),
                            _ => None,
                        };
                        if location.is_none() {
                            self.error(
                                scope,
                                DiagnosticKind::UnexpectedType,
                                &target.push("in"),
                                format!("unknown API key location '{}'", raw),
                            );
                        }
                        location
                    }
                    None => None,
                };
                SecuritySchemeKind::ApiKey {
                    name: name?,
                    location: location?,
                }
            }
            "http" => SecuritySchemeKind::Http {
                scheme: self.required_string(scope, map, "scheme", &target, "http security scheme")?,
                bearer_format: self.string(scope, map, "bearerFormat", &target),
            },
            "oauth2" => {
                let Some(flows) = map.get("flows") else {
                    self.error(
                        scope,
                        DiagnosticKind::MissingField,
                        &target,
                        "oauth2 security scheme is missing required field 'flows'",
                    );
                    return None;
                };
                SecuritySchemeKind::OAuth2 {
                    flows: self.bind_oauth_flows(scope, flows, &target.push("flows")),
                }
            }
            "openIdConnect" => SecuritySchemeKind::OpenIdConnect {
                url: self.required_string(
                    scope,
                    map,
                    "openIdConnectUrl",
                    &target,
                    "openIdConnect security scheme",
                )?,
            },
            "mutualTLS" if self.version.is_json_schema_aligned() => SecuritySchemeKind::MutualTls,
            other => {
                self.error(
                    scope,
                    DiagnosticKind::UnexpectedType,
                    &target.push("type"),
                    format!(
                        "unsupported security scheme type '{}' for OpenAPI {}",
                        other, self.version
                    ),
                );
                return None;
            }
        };

        Some(SecurityScheme {
            kind,
            description: self.string(scope, map, "description", &target),
            reference,
        })
    }

    fn bind_oauth_flows(
        &mut self,
        scope: Scope<'r>,
        value: &'r Value,
        pointer: &JsonPointer,
    ) -> OAuthFlows {
        let Some(map) = self.object(scope, value, pointer, "OAuth flows") else {
            return OAuthFlows::default();
        };
        OAuthFlows {
            implicit: self.bind_oauth_flow(scope, map, "implicit", pointer, true, false),
            password: self.bind_oauth_flow(scope, map, "password", pointer, false, true),
            client_credentials: self.bind_oauth_flow(
                scope,
                map,
                "clientCredentials",
                pointer,
                false,
                true,
            ),
            authorization_code: self.bind_oauth_flow(
                scope,
                map,
                "authorizationCode",
                pointer,
                true,
                true,
            ),
        }
    }

    fn bind_oauth_flow(
        &mut self,
        scope: Scope<'r>,
        map: &'r Map<String, Value>,
        key: &str,
        pointer: &JsonPointer,
        needs_authorization_url: bool,
        needs_token_url: bool,
    ) -> Option<OAuthFlow> {
        let value = map.get(key)?;
        let at = pointer.push(key);
        let flow = self.object(scope, value, &at, "OAuth flow")?;
        let owner = format!("OAuth '{}' flow", key);

        let authorization_url = if needs_authorization_url {
            self.required_string(scope, flow, "authorizationUrl", &at, &owner)
        } else {
            self.string(scope, flow, "authorizationUrl", &at)
        };
        let token_url = if needs_token_url {
            self.required_string(scope, flow, "tokenUrl", &at, &owner)
        } else {
            self.string(scope, flow, "tokenUrl", &at)
        };

        let mut scopes = IndexMap::new();
        if !flow.contains_key("scopes") {
            self.error(
                scope,
                DiagnosticKind::MissingField,
                &at,
                format!("{} is missing required field 'scopes'", owner),
            );
        } else if let Some(entries) = self.field_object(scope, flow, "scopes", &at) {
            let scopes_at = at.push("scopes");
            for name in entries.keys() {
                if let Some(description) = self.string(scope, entries, name, &scopes_at) {
                    scopes.insert(name.clone(), description);
                }
            }
        }

        Some(OAuthFlow {
            authorization_url,
            token_url,
            refresh_url: self.string(scope, flow, "refreshUrl", &at),
            scopes,
        })
    }
}
