// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for conduit-analyzer integration tests.
//!
//! Provides builders for a target message bus with the shared system
//! channels and for the source resources of a small order application.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use conduit_model::source::{
    ApplicationDefinition, ComponentKind, ElementKind, MetaModelElement, OperationDefinition,
    OperationKind, OrchestrationDefinition, PipelineComponent, PipelineDefinition,
    PipelineDirection, PortTypeDefinition, ReceiveLocationDefinition, ReceivePortDefinition,
    RelationshipKind, Resource, SchemaDefinition, SendPortDefinition, SourceObject,
};
use conduit_model::target::{
    Application, Channel, ChannelKind, MessageBus, MessagingObjectCommon, TargetModel,
};

pub const APP_KEY: &str = "bus:orders";
pub const APP_RESOURCE_KEY: &str = "app-orders";
pub const MESSAGE_BOX_KEY: &str = "bus:systemapplication:messageboxtopic";
pub const INTERCHANGE_QUEUE_KEY: &str = "bus:systemapplication:interchangequeue";

/// Install a test subscriber honouring `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn load_fixture(filename: &str) -> serde_json::Value {
    let path = fixtures_dir().join(filename);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e))
}

// ============================================================================
// Target model
// ============================================================================

/// A message bus with the system application and an empty `Orders` app.
pub fn target_model() -> TargetModel {
    let mut bus = MessageBus::new(MessagingObjectCommon::new("bus", "Message Bus"));
    let mut system = Application::new(MessagingObjectCommon::new(
        "bus:systemapplication",
        "System Application",
    ));
    system.channels.push(Channel::new(
        MessagingObjectCommon::new(MESSAGE_BOX_KEY, "Message Box"),
        ChannelKind::Topic {
            subscriptions: Vec::new(),
        },
    ));
    system.channels.push(Channel::new(
        MessagingObjectCommon::new("bus:systemapplication:suspendqueue", "Suspend Queue"),
        ChannelKind::CorrelatingQueue,
    ));
    system.channels.push(Channel::new(
        MessagingObjectCommon::new(INTERCHANGE_QUEUE_KEY, "Interchange Queue"),
        ChannelKind::CorrelatingQueue,
    ));
    bus.applications.push(system);
    bus.applications
        .push(Application::new(MessagingObjectCommon::new(APP_KEY, "Orders")));
    TargetModel::new(bus)
}

// ============================================================================
// Source resources
// ============================================================================

/// The `Orders` application resource owning `children`.
pub fn application(children: &[&Resource]) -> Resource {
    let mut app = Resource::new(
        APP_RESOURCE_KEY,
        "Orders",
        SourceObject::Application(ApplicationDefinition {
            name: "Orders".to_string(),
            description: None,
        }),
    );
    for child in children {
        app = app.with_relationship(RelationshipKind::Child, &child.key);
    }
    app
}

pub fn order_schema() -> Resource {
    Resource::new(
        "schema-order",
        "Contoso.Order",
        SourceObject::Schema(SchemaDefinition {
            name: "Contoso.Order".to_string(),
            target_namespace: Some("http://contoso".to_string()),
            root_node: "Order".to_string(),
        }),
    )
}

pub fn order_port_type() -> Resource {
    Resource::new(
        "pt-order",
        "Contoso.OrderPortType",
        SourceObject::PortType(PortTypeDefinition {
            name: "Contoso.OrderPortType".to_string(),
            operations: vec![OperationDefinition {
                name: "Submit".to_string(),
                kind: OperationKind::OneWay,
                request: Some("Contoso.Order".to_string()),
                response: None,
                faults: vec![],
            }],
        }),
    )
}

/// A pipeline resource keyed and named `key`.
pub fn pipeline(key: &str, direction: PipelineDirection, components: &[(&str, bool)]) -> Resource {
    Resource::new(
        key,
        key,
        SourceObject::Pipeline(PipelineDefinition {
            name: key.to_string(),
            direction,
            components: components
                .iter()
                .map(|(name, handles_batches)| PipelineComponent {
                    name: name.to_string(),
                    kind: if *handles_batches {
                        ComponentKind::Disassembler
                    } else {
                        ComponentKind::Decoder
                    },
                    handles_batches: *handles_batches,
                })
                .collect(),
        }),
    )
}

pub fn location(name: &str, receive_pipeline: Option<&str>) -> ReceiveLocationDefinition {
    ReceiveLocationDefinition {
        name: name.to_string(),
        adapter: "FILE".to_string(),
        receive_pipeline: receive_pipeline.map(str::to_string),
        send_pipeline: None,
    }
}

pub fn receive_port(name: &str, locations: Vec<ReceiveLocationDefinition>) -> Resource {
    Resource::new(
        format!("rp-{}", name.to_lowercase()),
        name,
        SourceObject::ReceivePort(ReceivePortDefinition {
            name: name.to_string(),
            two_way: false,
            locations,
            inbound_maps: vec![],
            outbound_maps: vec![],
        }),
    )
}

pub fn send_port(name: &str, transmit_pipeline: &str) -> Resource {
    Resource::new(
        format!("sp-{}", name.to_lowercase()),
        name,
        SourceObject::SendPort(SendPortDefinition {
            name: name.to_string(),
            two_way: false,
            adapter: "SMTP".to_string(),
            transmit_pipeline: Some(transmit_pipeline.to_string()),
            receive_pipeline: None,
            filter: None,
            outbound_maps: vec![],
            ordered_delivery: false,
        }),
    )
}

// ============================================================================
// Orchestrations
// ============================================================================

/// An orchestration `Contoso.<name>` whose body holds `body`.
///
/// Every orchestration declares an `Order` message and a `ReceivePort` of
/// the order port type.
pub fn orchestration(name: &str, body: Vec<MetaModelElement>) -> Resource {
    let mut service_body = MetaModelElement::new(ElementKind::ServiceBody);
    for element in body {
        service_body = service_body.with_element(element);
    }
    let service = MetaModelElement::new(ElementKind::ServiceDeclaration)
        .with_property("Name", name)
        .with_element(
            MetaModelElement::new(ElementKind::MessageDeclaration)
                .with_property("Name", "Order")
                .with_property("Type", "Contoso.Order"),
        )
        .with_element(
            MetaModelElement::new(ElementKind::PortDeclaration)
                .with_property("Name", "ReceivePort")
                .with_property("Type", "Contoso.OrderPortType"),
        )
        .with_element(service_body);
    let full_name = format!("Contoso.{}", name);
    Resource::new(
        format!("orch-{}", name.to_lowercase()),
        &full_name,
        SourceObject::Orchestration(OrchestrationDefinition {
            name: name.to_string(),
            full_name: full_name.clone(),
            model: MetaModelElement::new(ElementKind::Module).with_element(service),
        }),
    )
}

/// An activating receive of the `Order` message.
pub fn activating_receive() -> MetaModelElement {
    MetaModelElement::new(ElementKind::Receive)
        .with_oid("receive-order")
        .with_property("Name", "ReceiveOrder")
        .with_property("PortName", "ReceivePort")
        .with_property("OperationName", "Submit")
        .with_property("MessageName", "Order")
        .with_property("Activate", "True")
}

/// A synchronous call of another orchestration.
pub fn call(invokee: &str) -> MetaModelElement {
    MetaModelElement::new(ElementKind::Call)
        .with_property("Name", format!("Call {}", invokee))
        .with_property("Invokee", invokee)
}
