// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Workflow channels: one logical port operation, service link role, trigger
//! or publish/subscribe path of a workflow.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumString};

use super::{WorkflowObject, WorkflowObjectType, WorkflowParameter};
use crate::target::Subscription;

/// Message exchange direction of a channel, seen from the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum ChannelDirection {
    /// One-way inbound
    Receive,
    /// Inbound request that the workflow answers
    ReceiveResponse,
    /// Outbound request awaiting a reply
    RequestReply,
    /// One-way outbound
    Send,
    /// Outbound without waiting (asynchronous invocation)
    FireForget,
    Accept,
}

impl ChannelDirection {
    /// Messages arrive at the workflow through this channel.
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            ChannelDirection::Receive | ChannelDirection::ReceiveResponse | ChannelDirection::Accept
        )
    }

    /// Messages leave the workflow through this channel.
    pub fn is_outbound(&self) -> bool {
        matches!(
            self,
            ChannelDirection::Send | ChannelDirection::RequestReply | ChannelDirection::FireForget
        )
    }
}

/// How a port declaration is bound to the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
pub enum ChannelBindingKind {
    /// Bound directly to the message box
    #[default]
    Direct,
    /// Bound through a binding file to a physical port
    Logical,
    /// Bound to a physical port at design time
    Physical,
}

/// What a workflow channel represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowChannelKind {
    /// One operation of a port declaration
    PortOperation,
    /// One operation exposed by a service link role
    ServiceLinkRole { role: String },
    /// Invocation of another workflow
    Trigger,
    /// The suspend path shared by suspend and terminate activities
    PublishSubscribe,
}

/// A logical channel of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowChannel {
    #[serde(flatten)]
    pub object: WorkflowObject,

    pub kind: WorkflowChannelKind,

    /// Operation name (empty for trigger and publish/subscribe channels)
    #[serde(default)]
    pub operation_name: String,

    /// Fully-qualified port type name
    #[serde(default)]
    pub port_type: String,

    /// Set when any bound receive on this channel is activatable
    #[serde(default)]
    pub activator: bool,

    /// Assigned once by the first binding activity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<ChannelDirection>,

    #[serde(default)]
    pub binding: ChannelBindingKind,

    /// Names of inbound messages
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub messages_in: BTreeSet<String>,

    /// Names of outbound messages
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub messages_out: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,

    /// Parameters of the invocation (trigger channels)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<WorkflowParameter>,
}

impl WorkflowChannel {
    /// Channel for one operation of a declared port.
    pub fn port_operation(
        port_name: &str,
        key: impl Into<String>,
        operation_name: impl Into<String>,
        port_type: impl Into<String>,
    ) -> Self {
        Self::with_kind(
            port_name,
            key,
            WorkflowChannelKind::PortOperation,
            operation_name,
            port_type,
        )
    }

    /// Channel for one operation of a service link role.
    pub fn service_link_role(
        link_name: &str,
        key: impl Into<String>,
        role: impl Into<String>,
        operation_name: impl Into<String>,
        port_type: impl Into<String>,
    ) -> Self {
        Self::with_kind(
            link_name,
            key,
            WorkflowChannelKind::ServiceLinkRole { role: role.into() },
            operation_name,
            port_type,
        )
    }

    /// Trigger channel named after an invoked workflow.
    pub fn trigger(name: &str, key: impl Into<String>) -> Self {
        Self::with_kind(name, key, WorkflowChannelKind::Trigger, "", "")
    }

    /// The publish/subscribe suspend channel.
    pub fn publish_subscribe(name: &str, key: impl Into<String>) -> Self {
        Self::with_kind(name, key, WorkflowChannelKind::PublishSubscribe, "", "")
    }

    fn with_kind(
        name: &str,
        key: impl Into<String>,
        kind: WorkflowChannelKind,
        operation_name: impl Into<String>,
        port_type: impl Into<String>,
    ) -> Self {
        Self {
            object: WorkflowObject::new(name, key, WorkflowObjectType::Channel),
            kind,
            operation_name: operation_name.into(),
            port_type: port_type.into(),
            activator: false,
            direction: None,
            binding: ChannelBindingKind::Direct,
            messages_in: BTreeSet::new(),
            messages_out: BTreeSet::new(),
            subscription: None,
            parameters: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn key(&self) -> &str {
        &self.object.key
    }

    pub fn is_trigger(&self) -> bool {
        self.kind == WorkflowChannelKind::Trigger
    }

    pub fn is_publish_subscribe(&self) -> bool {
        self.kind == WorkflowChannelKind::PublishSubscribe
    }

    /// Assign the direction.
    ///
    /// The first assignment wins. Re-assigning the same direction is a no-op;
    /// a contradicting direction is rejected with the direction in place.
    pub fn set_direction(&mut self, direction: ChannelDirection) -> Result<(), ChannelDirection> {
        match self.direction {
            None => {
                self.direction = Some(direction);
                Ok(())
            }
            Some(existing) if existing == direction => Ok(()),
            Some(existing) => Err(existing),
        }
    }

    /// Whether this channel matches a port (or link) name and operation.
    pub fn matches(&self, port_name: &str, operation_name: &str) -> bool {
        self.object.name == port_name && self.operation_name == operation_name
    }
}
