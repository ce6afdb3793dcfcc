// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Produced messaging objects: endpoints, intermediaries, channels, messages.
//!
//! Objects reference each other only by key. References are resolved through
//! [`TargetModel::find_messaging_object`](super::TargetModel::find_messaging_object).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::IntoStaticStr;

use super::report::{ConversionRating, ReportMessage};
use super::subscription::Subscription;
use crate::property::PropertyBag;
use crate::workflow::WorkflowDefinition;

// ============================================================================
// Common
// ============================================================================

/// Fields shared by every produced messaging object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingObjectCommon {
    /// Globally unique key (`<bus>:<app>:<scenario>:...:<leaf>`)
    pub key: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub rating: ConversionRating,

    /// Name of the scenario the object takes part in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_name: Option<String>,

    /// Step name used by routers to dispatch to this object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_step_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub report_messages: Vec<ReportMessage>,

    /// Help link URLs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub report_links: Vec<String>,

    #[serde(default, skip_serializing_if = "PropertyBag::is_empty")]
    pub properties: PropertyBag,
}

impl MessagingObjectCommon {
    /// Create the common part of a messaging object.
    ///
    /// # Panics
    ///
    /// Panics if `key` or `name` is empty.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        let key = key.into();
        let name = name.into();
        assert!(!key.is_empty(), "messaging object key must not be empty");
        assert!(!name.is_empty(), "messaging object name must not be empty");
        Self {
            key,
            name,
            description: String::new(),
            rating: ConversionRating::NoRating,
            scenario_name: None,
            scenario_step_name: None,
            report_messages: Vec::new(),
            report_links: Vec::new(),
            properties: PropertyBag::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rating(mut self, rating: ConversionRating) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_scenario(
        mut self,
        scenario_name: impl Into<String>,
        step_name: impl Into<String>,
    ) -> Self {
        self.scenario_name = Some(scenario_name.into());
        self.scenario_step_name = Some(step_name.into());
        self
    }

    /// Add a help link unless already present.
    pub fn add_report_link(&mut self, url: impl Into<String>) {
        let url = url.into();
        if !self.report_links.contains(&url) {
            self.report_links.push(url);
        }
    }
}

// ============================================================================
// Endpoints
// ============================================================================

/// Which way messages cross an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointDirection {
    /// Messages enter the system (receive location)
    Inbound,
    /// Messages leave the system (send port)
    Outbound,
}

/// Adapter boundary of the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(flatten)]
    pub common: MessagingObjectCommon,

    /// Transport adapter name
    pub adapter: String,

    pub direction: EndpointDirection,

    #[serde(default)]
    pub two_way: bool,

    #[serde(default)]
    pub activator: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_channel_key_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_channel_key_ref: Option<String>,
}

impl Endpoint {
    pub fn new(
        common: MessagingObjectCommon,
        adapter: impl Into<String>,
        direction: EndpointDirection,
    ) -> Self {
        Self {
            common,
            adapter: adapter.into(),
            direction,
            two_way: false,
            activator: false,
            input_channel_key_ref: None,
            output_channel_key_ref: None,
        }
    }
}

// ============================================================================
// Intermediaries
// ============================================================================

/// What an intermediary does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "intermediaryType", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum IntermediaryKind {
    /// Dispatches a message to the next named step of its routing slip
    RoutingSlipRouter {
        /// Scenario step name routed to (empty at the end of a route)
        route_to: String,
    },

    /// Hosts one workflow
    ProcessManager(Box<WorkflowDefinition>),

    /// A pipeline component
    MessageProcessor {
        component: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        component_kind: Option<String>,
    },

    MessageTransformer {
        #[serde(default)]
        maps: Vec<String>,
    },

    /// Publishes to the message box
    MessagePublisher,

    /// Subscribes to the message box
    MessageSubscriber {
        /// Key of the topic channel subscribed to
        topic_channel_key: String,
    },

    /// Collects interchange messages
    Aggregator,

    /// Splits interchanges into messages
    Splitter,
}

/// A processing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intermediary {
    #[serde(flatten)]
    pub common: MessagingObjectCommon,

    pub kind: IntermediaryKind,

    #[serde(default)]
    pub activator: bool,

    /// The step handles batched interchanges
    #[serde(default)]
    pub handles_batches: bool,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub input_channel_key_refs: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub output_channel_key_refs: BTreeSet<String>,
}

impl Intermediary {
    pub fn new(common: MessagingObjectCommon, kind: IntermediaryKind) -> Self {
        Self {
            common,
            kind,
            activator: false,
            handles_batches: false,
            input_channel_key_refs: BTreeSet::new(),
            output_channel_key_refs: BTreeSet::new(),
        }
    }

    pub fn with_activator(mut self, activator: bool) -> Self {
        self.activator = activator;
        self
    }

    pub fn with_handles_batches(mut self, handles_batches: bool) -> Self {
        self.handles_batches = handles_batches;
        self
    }

    pub fn is_router(&self) -> bool {
        matches!(self.kind, IntermediaryKind::RoutingSlipRouter { .. })
    }

    /// The hosted workflow of a process manager.
    pub fn workflow(&self) -> Option<&WorkflowDefinition> {
        match &self.kind {
            IntermediaryKind::ProcessManager(definition) => Some(definition),
            _ => None,
        }
    }

    pub fn workflow_mut(&mut self) -> Option<&mut WorkflowDefinition> {
        match &mut self.kind {
            IntermediaryKind::ProcessManager(definition) => Some(definition),
            _ => None,
        }
    }
}

// ============================================================================
// Channels
// ============================================================================

/// What a channel is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "channelType", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ChannelKind {
    /// Point-to-point connection between two adjacent route steps
    Trigger {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trigger_url: Option<String>,
    },

    /// Publish/subscribe channel
    Topic {
        #[serde(default)]
        subscriptions: Vec<Subscription>,
    },

    /// Queue that correlates messages to waiting instances
    CorrelatingQueue,
}

/// A produced channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(flatten)]
    pub common: MessagingObjectCommon,

    pub kind: ChannelKind,

    #[serde(default)]
    pub activator: bool,
}

impl Channel {
    pub fn new(common: MessagingObjectCommon, kind: ChannelKind) -> Self {
        Self {
            common,
            kind,
            activator: false,
        }
    }

    pub fn trigger_url(&self) -> Option<&str> {
        match &self.kind {
            ChannelKind::Trigger { trigger_url } => trigger_url.as_deref(),
            _ => None,
        }
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self.kind, ChannelKind::Trigger { .. })
    }

    /// Subscriptions of a topic channel.
    pub fn subscriptions_mut(&mut self) -> Option<&mut Vec<Subscription>> {
        match &mut self.kind {
            ChannelKind::Topic { subscriptions } => Some(subscriptions),
            _ => None,
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// A produced message definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(flatten)]
    pub common: MessagingObjectCommon,

    /// `namespace#root` message type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
}

// ============================================================================
// References
// ============================================================================

/// Borrowed view of any messaging object.
#[derive(Debug, Clone, Copy)]
pub enum MessagingObjectRef<'a> {
    Endpoint(&'a Endpoint),
    Intermediary(&'a Intermediary),
    Channel(&'a Channel),
    Message(&'a Message),
}

impl<'a> MessagingObjectRef<'a> {
    pub fn common(&self) -> &'a MessagingObjectCommon {
        match self {
            MessagingObjectRef::Endpoint(e) => &e.common,
            MessagingObjectRef::Intermediary(i) => &i.common,
            MessagingObjectRef::Channel(c) => &c.common,
            MessagingObjectRef::Message(m) => &m.common,
        }
    }

    pub fn key(&self) -> &'a str {
        &self.common().key
    }

    /// Whether the object can start a new scenario instance.
    pub fn is_activator(&self) -> bool {
        match self {
            MessagingObjectRef::Endpoint(e) => e.activator,
            MessagingObjectRef::Intermediary(i) => i.activator,
            MessagingObjectRef::Channel(c) => c.activator,
            MessagingObjectRef::Message(_) => false,
        }
    }

    pub fn as_intermediary(&self) -> Option<&'a Intermediary> {
        match self {
            MessagingObjectRef::Intermediary(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&'a Channel> {
        match self {
            MessagingObjectRef::Channel(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_endpoint(&self) -> Option<&'a Endpoint> {
        match self {
            MessagingObjectRef::Endpoint(e) => Some(e),
            _ => None,
        }
    }
}

/// Mutable view of any messaging object.
#[derive(Debug)]
pub enum MessagingObjectMut<'a> {
    Endpoint(&'a mut Endpoint),
    Intermediary(&'a mut Intermediary),
    Channel(&'a mut Channel),
    Message(&'a mut Message),
}

impl MessagingObjectMut<'_> {
    pub fn common_mut(&mut self) -> &mut MessagingObjectCommon {
        match self {
            MessagingObjectMut::Endpoint(e) => &mut e.common,
            MessagingObjectMut::Intermediary(i) => &mut i.common,
            MessagingObjectMut::Channel(c) => &mut c.common,
            MessagingObjectMut::Message(m) => &mut m.common,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "name must not be empty")]
    fn test_empty_name_panics() {
        MessagingObjectCommon::new("bus:app:thing", "");
    }

    #[test]
    fn test_report_links_are_unique() {
        let mut common = MessagingObjectCommon::new("bus:app:pm", "Process Manager");
        common.add_report_link("https://help/pm");
        common.add_report_link("https://help/pm");
        assert_eq!(common.report_links.len(), 1);
    }

    #[test]
    fn test_intermediary_serialization_tag() {
        let router = Intermediary::new(
            MessagingObjectCommon::new("bus:app:r", "Router"),
            IntermediaryKind::RoutingSlipRouter {
                route_to: "next".to_string(),
            },
        );
        let value = serde_json::to_value(&router).unwrap();
        assert_eq!(value["kind"]["intermediaryType"], "routingSlipRouter");
        assert_eq!(value["kind"]["routeTo"], "next");
        assert!(router.is_router());
    }
}
