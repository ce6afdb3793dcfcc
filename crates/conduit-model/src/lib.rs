// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Conduit model types
//!
//! This crate defines the three models the analyzer works between:
//! - `source`: the parsed integration application (resource registry,
//!   orchestration element trees, type definitions, ports, pipelines)
//! - `workflow`: the typed workflow built from one orchestration
//! - `target`: the produced messaging graph (endpoints, intermediaries,
//!   channels) and its key-indexed registry

// Key formatting shared by workflow and target keys
pub mod key;

// Insert-once property bag
pub mod property;

pub mod source;
pub mod target;
pub mod workflow;

pub use property::PropertyBag;
pub use source::{Resource, ResourceKind, ResourceRegistry};
pub use target::TargetModel;
pub use workflow::WorkflowDefinition;

// ============================================================================
// Parsing Functions
// ============================================================================

/// Parse a resource registry from a JSON list of resources
pub fn parse_resource_registry(json: &serde_json::Value) -> Result<ResourceRegistry, String> {
    serde_json::from_value(json.clone())
        .map_err(|e| format!("Failed to parse resource registry: {}", e))
}

/// Parse a target model from JSON Value
pub fn parse_target_model(json: &serde_json::Value) -> Result<TargetModel, String> {
    serde_json::from_value(json.clone()).map_err(|e| format!("Failed to parse target model: {}", e))
}

/// Parse a workflow definition from JSON Value
pub fn parse_workflow_definition(json: &serde_json::Value) -> Result<WorkflowDefinition, String> {
    serde_json::from_value(json.clone())
        .map_err(|e| format!("Failed to parse workflow definition: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_package_metadata_is_own() {
        assert_eq!(env!("CARGO_PKG_VERSION"), "0.1.0");
        assert_eq!(env!("CARGO_PKG_REPOSITORY"), "");
    }

    #[test]
    fn test_parse_target_model() {
        let json = json!({
            "messageBus": {
                "key": "bus",
                "name": "Message Bus",
                "applications": [{
                    "key": "bus:systemapplication",
                    "name": "System Application",
                    "channels": [{
                        "key": "bus:systemapplication:messageboxtopic",
                        "name": "Message Box",
                        "kind": { "channelType": "topic", "subscriptions": [] }
                    }]
                }]
            }
        });
        let model = parse_target_model(&json).unwrap();
        let (app, object) = model
            .find_messaging_object("bus:systemapplication:messageboxtopic")
            .unwrap();
        assert_eq!(app.common.name, "System Application");
        assert!(matches!(
            object.as_channel().map(|c| &c.kind),
            Some(target::ChannelKind::Topic { .. })
        ));
    }

    #[test]
    fn test_parse_resource_registry_error() {
        let err = parse_resource_registry(&json!({ "not": "a list" })).unwrap_err();
        assert!(err.starts_with("Failed to parse resource registry"));
    }

    #[test]
    fn test_workflow_definition_roundtrip_keeps_activities() {
        let json = json!({
            "name": "ProcessOrder",
            "key": "processorder",
            "type": "workflow",
            "fullName": "Contoso.ProcessOrder",
            "activities": {
                "activities": [{
                    "name": "ReceiveOrder",
                    "key": "processorder.receiveorder",
                    "type": "receive",
                    "objectId": "r1",
                    "kind": {
                        "activityType": "receive",
                        "portName": "ReceivePort",
                        "operationName": "Submit",
                        "messageName": "Order",
                        "activate": true
                    }
                }]
            }
        });
        let definition = parse_workflow_definition(&json).unwrap();
        let activity = definition.find_activity_by_object_id("r1").unwrap();
        assert!(activity.message_exchange().unwrap().activate);
    }
}
