// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Workflow activities and activity containers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{WorkflowMessage, WorkflowObject, WorkflowParameter, WorkflowVariable};
use crate::source::DnfPredicate;

// ============================================================================
// Containers
// ============================================================================

/// An ordered sequence of activities with its own message and variable scope.
///
/// Messages and variables declared in a container are visible only to the
/// activities nested inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowActivityContainer {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<WorkflowMessage>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<WorkflowVariable>,

    #[serde(default)]
    pub activities: Vec<WorkflowActivity>,
}

impl WorkflowActivityContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.variables.is_empty() && self.activities.is_empty()
    }

    /// Visit every activity depth-first, parents before children.
    pub fn for_each_activity<'a>(&'a self, f: &mut dyn FnMut(&'a WorkflowActivity)) {
        for activity in &self.activities {
            f(activity);
            if let Some(container) = activity.container() {
                container.for_each_activity(f);
            }
        }
    }

    /// Visit every nested container depth-first, this one first.
    ///
    /// `scope_key` is the key of the activity owning this container (or of the
    /// workflow for the root container).
    pub fn for_each_scope<'a>(
        &'a self,
        scope_key: &'a str,
        f: &mut dyn FnMut(&'a str, &'a WorkflowActivityContainer),
    ) {
        f(scope_key, self);
        for activity in &self.activities {
            if let Some(container) = activity.container() {
                container.for_each_scope(activity.key(), f);
            }
        }
    }

    /// Depth-first search for the activity created from an element object id.
    pub fn find_by_object_id(&self, object_id: &str) -> Option<&WorkflowActivity> {
        for activity in &self.activities {
            if activity.object_id.as_deref() == Some(object_id) {
                return Some(activity);
            }
            if let Some(found) = activity.container().and_then(|c| c.find_by_object_id(object_id)) {
                return Some(found);
            }
        }
        None
    }

    /// Depth-first search for an activity by key.
    pub fn find_activity(&self, key: &str) -> Option<&WorkflowActivity> {
        for activity in &self.activities {
            if activity.key() == key {
                return Some(activity);
            }
            if let Some(found) = activity.container().and_then(|c| c.find_activity(key)) {
                return Some(found);
            }
        }
        None
    }

    /// Depth-first search for an activity by key, mutably.
    pub fn find_activity_mut(&mut self, key: &str) -> Option<&mut WorkflowActivity> {
        for activity in &mut self.activities {
            if activity.key() == key {
                return Some(activity);
            }
            if let Some(found) = activity.container_mut().and_then(|c| c.find_activity_mut(key)) {
                return Some(found);
            }
        }
        None
    }

    /// Find a message declared in this container or any nested one, by key.
    pub fn find_message_by_key_mut(&mut self, key: &str) -> Option<&mut WorkflowMessage> {
        if let Some(message) = self.messages.iter_mut().find(|m| m.key() == key) {
            return Some(message);
        }
        self.activities
            .iter_mut()
            .filter_map(WorkflowActivity::container_mut)
            .find_map(|c| c.find_message_by_key_mut(key))
    }

    /// Find a variable declared in this container or any nested one, by key.
    pub fn find_variable_by_key_mut(&mut self, key: &str) -> Option<&mut WorkflowVariable> {
        if let Some(variable) = self.variables.iter_mut().find(|v| v.key() == key) {
            return Some(variable);
        }
        self.activities
            .iter_mut()
            .filter_map(WorkflowActivity::container_mut)
            .find_map(|c| c.find_variable_by_key_mut(key))
    }
}

// ============================================================================
// Activities
// ============================================================================

/// Shared shape of receive and send activities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageExchangeActivity {
    /// Port or service link name
    pub port_name: String,

    pub operation_name: String,

    /// Name of the message received or sent
    pub message_name: String,

    /// The receive can start a new workflow instance
    #[serde(default)]
    pub activate: bool,

    /// Activation filter of an activatable receive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<DnfPredicate>,

    /// Key of the bound workflow channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_key: Option<String>,

    /// Message context properties promoted by a send
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub promoted_properties: BTreeMap<String, String>,
}

/// Invocation of another workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeWorkflowActivity {
    /// Fully-qualified name of the invoked workflow
    pub invokee: String,

    /// Exec (asynchronous) rather than call (synchronous)
    #[serde(default)]
    pub is_async: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<WorkflowParameter>,

    /// Key of the bound trigger channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_key: Option<String>,
}

/// Kind-specific data of an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "activityType", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ActivityKind {
    /// Scopes, branches, loops and other grouping shapes
    Group(WorkflowActivityContainer),

    CodeExpression {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expression: Option<String>,
    },

    MessageConstruction {
        /// Names of the messages constructed
        #[serde(default)]
        constructed_messages: Vec<String>,
        body: WorkflowActivityContainer,
    },

    MessageTransform {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        map_name: Option<String>,
    },

    InvokeWorkflow(InvokeWorkflowActivity),

    Receive(MessageExchangeActivity),

    Send(MessageExchangeActivity),

    Suspend {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    Terminate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Element with no dedicated handler, with any activities nested in it
    Unknown {
        element: String,
        #[serde(default, skip_serializing_if = "WorkflowActivityContainer::is_empty")]
        body: WorkflowActivityContainer,
    },
}

/// One activity of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowActivity {
    #[serde(flatten)]
    pub object: WorkflowObject,

    /// Object id of the source element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    pub kind: ActivityKind,
}

impl WorkflowActivity {
    pub fn new(object: WorkflowObject, object_id: Option<String>, kind: ActivityKind) -> Self {
        Self {
            object,
            object_id,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn key(&self) -> &str {
        &self.object.key
    }

    /// The nested container of a grouping activity.
    pub fn container(&self) -> Option<&WorkflowActivityContainer> {
        match &self.kind {
            ActivityKind::Group(container) => Some(container),
            ActivityKind::MessageConstruction { body, .. } | ActivityKind::Unknown { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }

    pub fn container_mut(&mut self) -> Option<&mut WorkflowActivityContainer> {
        match &mut self.kind {
            ActivityKind::Group(container) => Some(container),
            ActivityKind::MessageConstruction { body, .. } | ActivityKind::Unknown { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }

    /// Receive or send data.
    pub fn message_exchange(&self) -> Option<&MessageExchangeActivity> {
        match &self.kind {
            ActivityKind::Receive(exchange) | ActivityKind::Send(exchange) => Some(exchange),
            _ => None,
        }
    }

    pub fn message_exchange_mut(&mut self) -> Option<&mut MessageExchangeActivity> {
        match &mut self.kind {
            ActivityKind::Receive(exchange) | ActivityKind::Send(exchange) => Some(exchange),
            _ => None,
        }
    }

    /// Name of the message this activity works on, if any.
    pub fn message_name(&self) -> Option<&str> {
        match &self.kind {
            ActivityKind::Receive(exchange) | ActivityKind::Send(exchange) => {
                Some(exchange.message_name.as_str())
            }
            ActivityKind::MessageConstruction {
                constructed_messages,
                ..
            } => constructed_messages.first().map(String::as_str),
            _ => None,
        }
    }
}
