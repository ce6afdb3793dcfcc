// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Workflow messages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{WorkflowObject, WorkflowObjectType};

/// Role of a message in the exchange it takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowMessageType {
    Request,
    Response,
    Fault,
}

/// A message declared in a workflow scope.
///
/// A composite message owns an ordered list of parts, each itself a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMessage {
    #[serde(flatten)]
    pub object: WorkflowObject,

    /// Declared fully-qualified type name
    pub declared_type: String,

    /// Resolved message type (`namespace#root`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,

    /// Set during channel binding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_message_type: Option<WorkflowMessageType>,

    /// Correlation property types required on this message
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub correlation_properties: BTreeSet<String>,

    /// Parts of a composite message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<WorkflowMessage>,
}

impl WorkflowMessage {
    /// Create a single-part message.
    pub fn new(
        name: impl Into<String>,
        key: impl Into<String>,
        declared_type: impl Into<String>,
    ) -> Self {
        Self {
            object: WorkflowObject::new(name, key, WorkflowObjectType::Message),
            declared_type: declared_type.into(),
            message_type: None,
            workflow_message_type: None,
            correlation_properties: BTreeSet::new(),
            parts: Vec::new(),
        }
    }

    /// Create a composite message from its parts.
    pub fn composite(
        name: impl Into<String>,
        key: impl Into<String>,
        declared_type: impl Into<String>,
        parts: Vec<WorkflowMessage>,
    ) -> Self {
        let mut message = Self::new(name, key, declared_type);
        message.object.object_type = WorkflowObjectType::CompositeMessage;
        message.parts = parts;
        message
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn key(&self) -> &str {
        &self.object.key
    }

    pub fn is_composite(&self) -> bool {
        self.object.object_type == WorkflowObjectType::CompositeMessage
    }

    /// Classify the message; the classification propagates to every part.
    ///
    /// An existing classification is kept. Returns the effective value.
    pub fn classify(&mut self, kind: WorkflowMessageType) -> WorkflowMessageType {
        let effective = *self.workflow_message_type.get_or_insert(kind);
        for part in &mut self.parts {
            part.classify(effective);
        }
        effective
    }

    /// Body part message type of a composite message, or the message type.
    pub fn effective_message_type(&self) -> Option<&str> {
        if let Some(mt) = self.message_type.as_deref() {
            return Some(mt);
        }
        self.parts.iter().find_map(|p| p.message_type.as_deref())
    }
}
