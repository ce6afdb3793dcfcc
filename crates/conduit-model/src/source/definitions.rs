// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Type definitions referenced by orchestrations.
//!
//! Port types, service link types, correlation types, schemas and multipart
//! message types are resolved by exact qualified-name match.

use serde::{Deserialize, Serialize};

use super::metamodel::MetaModelElement;

// ============================================================================
// Orchestrations
// ============================================================================

/// A parsed orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationDefinition {
    /// Short orchestration name
    pub name: String,

    /// Fully-qualified type name (namespace + name)
    pub full_name: String,

    /// Root of the element tree (usually a `Module` element)
    pub model: MetaModelElement,
}

// ============================================================================
// Port Types
// ============================================================================

/// Message exchange shape of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OperationKind {
    #[default]
    OneWay,
    RequestResponse,
}

/// Slot of an operation a message type occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSlot {
    Request,
    Response,
    Fault,
}

/// An operation on a port type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDefinition {
    pub name: String,

    #[serde(default)]
    pub kind: OperationKind,

    /// Message type carried by the request slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,

    /// Message type carried by the response slot (request-response only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    /// Message types carried by fault slots
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<String>,
}

impl OperationDefinition {
    /// Find which slot of this operation carries the given message type.
    ///
    /// The request slot wins when the type fills more than one slot; use
    /// [`slots_for`](Self::slots_for) to see every match.
    pub fn slot_for(&self, message_type: &str) -> Option<MessageSlot> {
        self.slots_for(message_type).first().copied()
    }

    /// Every slot carrying the given message type, request first.
    pub fn slots_for(&self, message_type: &str) -> Vec<MessageSlot> {
        let mut slots = Vec::new();
        if self.request.as_deref() == Some(message_type) {
            slots.push(MessageSlot::Request);
        }
        if self.response.as_deref() == Some(message_type) {
            slots.push(MessageSlot::Response);
        }
        if self.faults.iter().any(|f| f == message_type) {
            slots.push(MessageSlot::Fault);
        }
        slots
    }

    /// Whether the operation has a response slot.
    pub fn is_two_way(&self) -> bool {
        self.kind == OperationKind::RequestResponse
    }
}

/// A port type: a named set of operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortTypeDefinition {
    /// Fully-qualified port type name
    pub name: String,

    #[serde(default)]
    pub operations: Vec<OperationDefinition>,
}

impl PortTypeDefinition {
    /// Find an operation by name.
    pub fn operation(&self, name: &str) -> Option<&OperationDefinition> {
        self.operations.iter().find(|o| o.name == name)
    }
}

// ============================================================================
// Service Link Types
// ============================================================================

/// A role (provider or consumer) of a service link type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDefinition {
    pub name: String,

    /// Fully-qualified names of the port types the role exposes
    #[serde(default)]
    pub port_types: Vec<String>,
}

/// A service link type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLinkTypeDefinition {
    pub name: String,

    #[serde(default)]
    pub roles: Vec<RoleDefinition>,
}

// ============================================================================
// Correlation Types
// ============================================================================

/// A correlation type: the property set a correlation initializes/follows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationTypeDefinition {
    pub name: String,

    /// Fully-qualified property names
    #[serde(default)]
    pub properties: Vec<String>,
}

// ============================================================================
// Schemas and Message Types
// ============================================================================

/// A message schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    /// Fully-qualified schema type name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,

    pub root_node: String,
}

impl SchemaDefinition {
    /// Message type string (`namespace#root`, or just the root node).
    pub fn message_type(&self) -> String {
        match &self.target_namespace {
            Some(ns) if !ns.is_empty() => format!("{}#{}", ns, self.root_node),
            _ => self.root_node.clone(),
        }
    }
}

/// One part of a multipart message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePartDefinition {
    pub name: String,

    /// Fully-qualified schema (or system) type of the part
    pub type_name: String,

    #[serde(default)]
    pub is_body: bool,
}

/// A multipart message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartMessageTypeDefinition {
    pub name: String,

    #[serde(default)]
    pub parts: Vec<MessagePartDefinition>,
}

// ============================================================================
// Binding Files
// ============================================================================

/// Logical port to physical port mapping for one orchestration port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortBinding {
    /// Orchestration port name
    pub logical_port: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_port: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_port: Option<String>,
}

/// Port bindings of one orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBinding {
    /// Fully-qualified orchestration name
    pub name: String,

    #[serde(default)]
    pub ports: Vec<PortBinding>,
}

/// A binding file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingFileDefinition {
    #[serde(default)]
    pub services: Vec<ServiceBinding>,
}

impl BindingFileDefinition {
    /// Find the port binding for an orchestration's logical port.
    pub fn port_binding(&self, service: &str, logical_port: &str) -> Option<&PortBinding> {
        self.services
            .iter()
            .filter(|s| s.name == service)
            .flat_map(|s| s.ports.iter())
            .find(|p| p.logical_port == logical_port)
    }
}
