// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Workflow model: the typed form of one orchestration.
//!
//! A [`WorkflowDefinition`] owns its messages, variables and channels plus a
//! root activity container. Activities nest to arbitrary depth; every object
//! carries a hierarchical dotted key built from its ancestors' keys.

pub mod activity;
pub mod channel;
pub mod message;
pub mod variable;

pub use activity::{
    ActivityKind, InvokeWorkflowActivity, MessageExchangeActivity, WorkflowActivity,
    WorkflowActivityContainer,
};
pub use channel::{ChannelBindingKind, ChannelDirection, WorkflowChannel, WorkflowChannelKind};
pub use message::{WorkflowMessage, WorkflowMessageType};
pub use variable::{ActivityReference, CorrelationBinding, WorkflowVariable};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::key::format_key;
use crate::property::PropertyBag;

// ============================================================================
// Workflow Objects
// ============================================================================

/// Closed set of workflow object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WorkflowObjectType {
    Workflow,
    ActivityGroup,
    CodeExpression,
    MessageConstruction,
    MessageTransform,
    InvokeWorkflow,
    Receive,
    Send,
    Suspend,
    Terminate,
    Message,
    CompositeMessage,
    Variable,
    CorrelationVariable,
    Channel,
    Unknown,
}

/// Identity shared by every workflow object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowObject {
    pub name: String,

    /// Hierarchical key (`parent.child`)
    pub key: String,

    #[serde(rename = "type")]
    pub object_type: WorkflowObjectType,

    /// Source properties copied from the element tree
    #[serde(default, skip_serializing_if = "PropertyBag::is_empty")]
    pub properties: PropertyBag,
}

impl WorkflowObject {
    /// Create a workflow object.
    ///
    /// # Panics
    ///
    /// Panics if `key` is empty.
    pub fn new(
        name: impl Into<String>,
        key: impl Into<String>,
        object_type: WorkflowObjectType,
    ) -> Self {
        let key = key.into();
        assert!(!key.is_empty(), "workflow object key must not be empty");
        Self {
            name: name.into(),
            key,
            object_type,
            properties: PropertyBag::new(),
        }
    }
}

/// Direction of a workflow invocation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
pub enum ParameterDirection {
    #[default]
    In,
    Out,
    Ref,
}

/// A parameter passed to an invoked workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowParameter {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<String>,

    #[serde(default)]
    pub direction: ParameterDirection,
}

// ============================================================================
// Workflow Definition
// ============================================================================

/// One orchestration as a typed workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    #[serde(flatten)]
    pub object: WorkflowObject,

    /// Fully-qualified orchestration name
    pub full_name: String,

    /// Top-level message scope
    #[serde(default)]
    pub messages: Vec<WorkflowMessage>,

    /// Top-level variable scope
    #[serde(default)]
    pub variables: Vec<WorkflowVariable>,

    #[serde(default)]
    pub channels: Vec<WorkflowChannel>,

    /// Root activity container
    #[serde(default)]
    pub activities: WorkflowActivityContainer,
}

impl WorkflowDefinition {
    /// Create an empty definition keyed from its fully-qualified name.
    ///
    /// Orchestrations sharing a short name in different namespaces get
    /// distinct keys.
    pub fn new(name: impl Into<String>, full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let key = format_key(&full_name);
        Self {
            object: WorkflowObject::new(name, key, WorkflowObjectType::Workflow),
            full_name,
            messages: Vec::new(),
            variables: Vec::new(),
            channels: Vec::new(),
            activities: WorkflowActivityContainer::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn key(&self) -> &str {
        &self.object.key
    }

    /// Whether any channel can start a new instance.
    pub fn is_activator(&self) -> bool {
        self.channels.iter().any(|c| c.activator)
    }

    // ===== Channels =====

    pub fn find_channel(&self, port_name: &str, operation_name: &str) -> Option<&WorkflowChannel> {
        self.channels
            .iter()
            .find(|c| c.matches(port_name, operation_name))
    }

    pub fn find_channel_mut(
        &mut self,
        port_name: &str,
        operation_name: &str,
    ) -> Option<&mut WorkflowChannel> {
        self.channels
            .iter_mut()
            .find(|c| c.matches(port_name, operation_name))
    }

    pub fn find_channel_by_key(&self, key: &str) -> Option<&WorkflowChannel> {
        self.channels.iter().find(|c| c.key() == key)
    }

    pub fn find_channel_by_key_mut(&mut self, key: &str) -> Option<&mut WorkflowChannel> {
        self.channels.iter_mut().find(|c| c.key() == key)
    }

    /// The trigger channel named after an invoked workflow.
    pub fn find_trigger_channel(&self, name: &str) -> Option<&WorkflowChannel> {
        self.channels
            .iter()
            .find(|c| c.is_trigger() && c.name() == name)
    }

    // ===== Messages =====

    /// Resolve a message name as seen from an activity.
    ///
    /// The innermost enclosing scope declaring the name wins; the top-level
    /// scope is searched last.
    pub fn resolve_message(&self, activity_key: &str, name: &str) -> Option<&WorkflowMessage> {
        let mut found = self.messages.iter().find(|m| m.name() == name);
        self.activities
            .for_each_scope(self.key(), &mut |scope_key, container| {
                if !in_scope(scope_key, activity_key) {
                    return;
                }
                if let Some(message) = container.messages.iter().find(|m| m.name() == name) {
                    found = Some(message);
                }
            });
        found
    }

    /// Find a message in any scope by key, mutably.
    pub fn find_message_by_key_mut(&mut self, key: &str) -> Option<&mut WorkflowMessage> {
        if let Some(message) = self.messages.iter_mut().find(|m| m.key() == key) {
            return Some(message);
        }
        self.activities.find_message_by_key_mut(key)
    }

    // ===== Variables =====

    /// Keys of all correlation variables in every scope, outermost first.
    pub fn correlation_variable_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .variables
            .iter()
            .filter(|v| v.is_correlation())
            .map(|v| v.key().to_string())
            .collect();
        self.activities.for_each_scope(self.key(), &mut |_, container| {
            keys.extend(
                container
                    .variables
                    .iter()
                    .filter(|v| v.is_correlation())
                    .map(|v| v.key().to_string()),
            );
        });
        keys
    }

    /// Find a variable in any scope by key, mutably.
    pub fn find_variable_by_key_mut(&mut self, key: &str) -> Option<&mut WorkflowVariable> {
        if let Some(variable) = self.variables.iter_mut().find(|v| v.key() == key) {
            return Some(variable);
        }
        self.activities.find_variable_by_key_mut(key)
    }

    // ===== Activities =====

    /// Depth-first search for the activity created from an element object id.
    pub fn find_activity_by_object_id(&self, object_id: &str) -> Option<&WorkflowActivity> {
        self.activities.find_by_object_id(object_id)
    }

    pub fn find_activity(&self, key: &str) -> Option<&WorkflowActivity> {
        self.activities.find_activity(key)
    }

    pub fn find_activity_mut(&mut self, key: &str) -> Option<&mut WorkflowActivity> {
        self.activities.find_activity_mut(key)
    }

    /// Visit every activity depth-first.
    pub fn for_each_activity<'a>(&'a self, f: &mut dyn FnMut(&'a WorkflowActivity)) {
        self.activities.for_each_activity(f);
    }
}

fn in_scope(scope_key: &str, key: &str) -> bool {
    key.len() > scope_key.len()
        && key.starts_with(scope_key)
        && key[scope_key.len()..].starts_with(crate::key::WORKFLOW_KEY_SEPARATOR)
}
