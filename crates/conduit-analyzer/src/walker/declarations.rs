// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Handlers for declaration elements: messages, variables, correlations,
//! ports and service links.

use conduit_model::key::child_key;
use conduit_model::source::{ElementKind, MetaModelElement, PortTypeDefinition, ResourceKind};
use conduit_model::workflow::{
    ActivityReference, ChannelBindingKind, CorrelationBinding, WorkflowChannel, WorkflowMessage,
    WorkflowObjectType, WorkflowVariable,
};

use super::{WalkContext, WalkOutput, element_name};
use crate::error::AnalysisError;

/// Prefix of platform types that have no schema resource.
const SYSTEM_TYPE_PREFIX: &str = "System.";

fn type_property<'e>(
    walk: &mut WalkContext<'_>,
    element: &'e MetaModelElement,
    owner: &str,
) -> Option<&'e str> {
    match element.property("Type").filter(|t| !t.is_empty()) {
        Some(type_name) => Some(type_name),
        None => {
            walk.report(AnalysisError::missing(owner, "Type"));
            None
        }
    }
}

/// Resolve a schema type name to its `namespace#root` message type.
fn resolve_message_type(walk: &WalkContext<'_>, type_name: &str) -> Option<String> {
    walk.resources
        .find_resource_by_name(ResourceKind::Schema, type_name)
        .and_then(|r| r.as_schema())
        .map(|schema| schema.message_type())
}

fn resolve_port_type<'r>(walk: &WalkContext<'r>, name: &str) -> Option<&'r PortTypeDefinition> {
    walk.resources
        .find_resource_by_name(ResourceKind::PortType, name)
        .and_then(|r| r.as_port_type())
}

/// `MessageDeclaration`: a single-part or composite message.
pub fn message(walk: &mut WalkContext<'_>, element: &MetaModelElement, key: &str) -> WalkOutput {
    let name = element_name(element);
    let Some(type_name) = type_property(walk, element, &name) else {
        return WalkOutput::Skip;
    };

    let multipart = walk
        .resources
        .find_resource_by_name(ResourceKind::MultipartMessageType, type_name)
        .and_then(|r| r.as_multipart_message_type());

    let mut message = match multipart {
        Some(definition) => {
            let parts = definition
                .parts
                .iter()
                .map(|part| {
                    let part_key = child_key(key, &part.name);
                    let mut message = WorkflowMessage::new(&part.name, part_key, &part.type_name);
                    message.message_type = resolve_message_type(walk, &part.type_name);
                    message
                })
                .collect();
            WorkflowMessage::composite(&name, key, type_name, parts)
        }
        None => {
            let mut message = WorkflowMessage::new(&name, key, type_name);
            message.message_type = resolve_message_type(walk, type_name);
            if message.message_type.is_none() && !type_name.starts_with(SYSTEM_TYPE_PREFIX) {
                walk.report(AnalysisError::unresolved(&name, "message type", type_name));
            }
            message
        }
    };
    message.object.properties = walk.object(element, key, message.object.object_type).properties;
    WalkOutput::Message(message)
}

/// `VariableDeclaration`: a plain variable.
pub fn variable(walk: &mut WalkContext<'_>, element: &MetaModelElement, key: &str) -> WalkOutput {
    let name = element_name(element);
    let variable_type = element.property("Type").unwrap_or_default();
    let mut variable = WorkflowVariable::new(&name, key, variable_type);
    variable.object.properties = walk.object(element, key, variable.object.object_type).properties;
    WalkOutput::Variable(variable)
}

/// `CorrelationDeclaration`: a correlation variable with its activity references.
pub fn correlation(
    walk: &mut WalkContext<'_>,
    element: &MetaModelElement,
    key: &str,
) -> WalkOutput {
    let name = element_name(element);
    let Some(type_name) = type_property(walk, element, &name) else {
        return WalkOutput::Skip;
    };

    let properties = match walk
        .resources
        .find_resource_by_name(ResourceKind::CorrelationType, type_name)
        .and_then(|r| r.as_correlation_type())
    {
        Some(correlation_type) => correlation_type.properties.clone(),
        None => {
            walk.report(AnalysisError::unresolved(&name, "correlation type", type_name));
            Vec::new()
        }
    };

    let mut activity_refs = Vec::new();
    for reference in element.children_of_kind(&ElementKind::StatementRef) {
        match reference.property("Ref").filter(|r| !r.is_empty()) {
            Some(object_id) => activity_refs.push(ActivityReference {
                object_id: object_id.to_string(),
                initializes: reference.bool_property("Initializes"),
            }),
            None => walk.report(AnalysisError::mismatch(
                &name,
                "statement reference without a Ref",
            )),
        }
    }

    let binding = CorrelationBinding {
        correlation_type: type_name.to_string(),
        properties,
        activity_refs,
        ..Default::default()
    };
    let mut variable = WorkflowVariable::correlation(&name, key, binding);
    variable.object.properties = walk.object(element, key, variable.object.object_type).properties;
    WalkOutput::Variable(variable)
}

/// Binding kind selected by a port declaration's binding attribute.
fn binding_kind(element: &MetaModelElement) -> ChannelBindingKind {
    element
        .elements
        .iter()
        .find_map(|child| match child.kind {
            ElementKind::LogicalBindingAttribute => Some(ChannelBindingKind::Logical),
            ElementKind::PhysicalBindingAttribute => Some(ChannelBindingKind::Physical),
            ElementKind::DirectBindingAttribute => Some(ChannelBindingKind::Direct),
            _ => None,
        })
        .unwrap_or_default()
}

/// `PortDeclaration`: one channel per operation of the port type.
pub fn port(walk: &mut WalkContext<'_>, element: &MetaModelElement, key: &str) -> WalkOutput {
    let name = element_name(element);
    let Some(type_name) = type_property(walk, element, &name) else {
        return WalkOutput::Skip;
    };
    let Some(port_type) = resolve_port_type(walk, type_name) else {
        walk.report(AnalysisError::unresolved(&name, "port type", type_name));
        return WalkOutput::Skip;
    };

    let binding = binding_kind(element);
    let properties = walk.object(element, key, WorkflowObjectType::Channel).properties;
    let channels = port_type
        .operations
        .iter()
        .map(|operation| {
            let mut channel = WorkflowChannel::port_operation(
                &name,
                child_key(key, &operation.name),
                &operation.name,
                &port_type.name,
            );
            channel.binding = binding;
            channel.object.properties = properties.clone();
            channel
        })
        .collect();
    WalkOutput::Channels(channels)
}

/// `ServiceLinkDeclaration`: one channel per role and operation.
///
/// A `RoleName` property restricts the channels to that role.
pub fn service_link(
    walk: &mut WalkContext<'_>,
    element: &MetaModelElement,
    key: &str,
) -> WalkOutput {
    let name = element_name(element);
    let Some(type_name) = type_property(walk, element, &name) else {
        return WalkOutput::Skip;
    };
    let Some(link_type) = walk
        .resources
        .find_resource_by_name(ResourceKind::ServiceLinkType, type_name)
        .and_then(|r| r.as_service_link_type())
    else {
        walk.report(AnalysisError::unresolved(&name, "service link type", type_name));
        return WalkOutput::Skip;
    };

    let role_filter = element.property("RoleName").filter(|r| !r.is_empty());
    if let Some(role) = role_filter
        && !link_type.roles.iter().any(|r| r.name == role)
    {
        walk.report(AnalysisError::mismatch(
            &name,
            format!("role '{}' is not defined by service link type '{}'", role, type_name),
        ));
        return WalkOutput::Skip;
    }

    let mut channels = Vec::new();
    for role in &link_type.roles {
        if role_filter.is_some_and(|r| r != role.name) {
            continue;
        }
        let role_key = child_key(key, &role.name);
        for port_type_name in &role.port_types {
            let Some(port_type) = resolve_port_type(walk, port_type_name) else {
                walk.report(AnalysisError::mismatch(
                    &name,
                    format!(
                        "role '{}' exposes port type '{}' which could not be found",
                        role.name, port_type_name
                    ),
                ));
                continue;
            };
            for operation in &port_type.operations {
                channels.push(WorkflowChannel::service_link_role(
                    &name,
                    child_key(&role_key, &operation.name),
                    &role.name,
                    &operation.name,
                    &port_type.name,
                ));
            }
        }
    }
    WalkOutput::Channels(channels)
}
