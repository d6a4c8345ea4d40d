//! Checks over the bound schema graph.

use super::emit;
use crate::oas::models::Document;
use crate::oas::report::{DiagnosticKind, Severity, ValidationReport};
use crate::oas::schema::{
    AdditionalProperties, Discriminator, Followed, ResolutionState, Schema, SchemaGraph, SchemaId,
    SchemaKind,
};
use std::collections::HashSet;

pub(super) fn validate_schemas(document: &Document, report: &mut ValidationReport) {
    let graph = &document.schemas;
    for (id, schema) in graph.iter() {
        match &schema.kind {
            SchemaKind::Reference(reference) => {
                if matches!(reference.state, ResolutionState::Cyclic(_))
                    && graph.follow(id) == Followed::Cycle
                {
                    emit(
                        report,
                        Severity::Error,
                        DiagnosticKind::CyclicReference,
                        schema.document.as_deref(),
                        &schema.location,
                        format!(
                            "'{}' only refers back to itself and never reaches a schema",
                            reference.target_ref
                        ),
                    );
                }
            }
            SchemaKind::Object(object) => {
                if let Some(discriminator) = &object.discriminator {
                    if !object.properties.contains_key(&discriminator.property_name) {
                        invalid_discriminator(
                            schema,
                            discriminator,
                            "is not a declared property".into(),
                            report,
                        );
                    }
                }
                if object.additional_properties == AdditionalProperties::Allowed(false) {
                    for name in &object.required {
                        if !object.properties.contains_key(name) {
                            emit(
                                report,
                                Severity::Warning,
                                DiagnosticKind::UnknownRequiredProperty,
                                schema.document.as_deref(),
                                &schema.location.push("required"),
                                format!(
                                    "required property '{}' is not declared and additional properties are not allowed",
                                    name
                                ),
                            );
                        }
                    }
                }
            }
            SchemaKind::Composed(composed) => {
                let Some(discriminator) = &composed.discriminator else {
                    continue;
                };
                let alternatives: Vec<SchemaId> = composed
                    .one_of
                    .iter()
                    .chain(&composed.any_of)
                    .copied()
                    .collect();
                if alternatives.is_empty() {
                    if !has_property(graph, id, &discriminator.property_name, &mut HashSet::new()) {
                        invalid_discriminator(
                            schema,
                            discriminator,
                            "is not a declared property".into(),
                            report,
                        );
                    }
                    continue;
                }
                for member in alternatives {
                    let Some(target) = graph.resolve(member) else {
                        continue;
                    };
                    if !declares_properties(graph, target) {
                        continue;
                    }
                    if !has_property(graph, target, &discriminator.property_name, &mut HashSet::new())
                    {
                        let label = graph[target]
                            .name
                            .clone()
                            .unwrap_or_else(|| graph[target].location.to_string());
                        invalid_discriminator(
                            schema,
                            discriminator,
                            format!("is not declared by alternative '{}'", label),
                            report,
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

fn invalid_discriminator(
    schema: &Schema,
    discriminator: &Discriminator,
    problem: String,
    report: &mut ValidationReport,
) {
    emit(
        report,
        Severity::Warning,
        DiagnosticKind::InvalidDiscriminator,
        schema.document.as_deref(),
        &schema.location.push("discriminator"),
        format!(
            "discriminator property '{}' {}",
            discriminator.property_name, problem
        ),
    );
}

/// Object schemas and compositions can declare properties; anything else is skipped.
fn declares_properties(graph: &SchemaGraph, id: SchemaId) -> bool {
    matches!(
        graph[id].kind,
        SchemaKind::Object(_) | SchemaKind::Composed(_)
    )
}

/// Whether `name` is declared by `id`, directly or through `allOf` and inline parts.
fn has_property(
    graph: &SchemaGraph,
    id: SchemaId,
    name: &str,
    visited: &mut HashSet<SchemaId>,
) -> bool {
    let Some(id) = graph.resolve(id) else {
        return false;
    };
    if !visited.insert(id) {
        return false;
    }
    match &graph[id].kind {
        SchemaKind::Object(object) => object.properties.contains_key(name),
        SchemaKind::Composed(composed) => composed
            .all_of
            .iter()
            .chain(composed.inline.iter())
            .any(|part| has_property(graph, *part, name, visited)),
        _ => false,
    }
}
