// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Workflow variables and correlation variables.

use serde::{Deserialize, Serialize};

use super::{WorkflowObject, WorkflowObjectType};

/// A recorded reference from a correlation to an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReference {
    /// Object id of the referenced activity element
    pub object_id: String,

    /// The activity initializes the correlation values
    pub initializes: bool,
}

/// Correlation state of a correlation variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationBinding {
    /// Correlation type name
    pub correlation_type: String,

    /// Correlation property types
    #[serde(default)]
    pub properties: Vec<String>,

    /// Activity references recorded on the declaration
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activity_refs: Vec<ActivityReference>,

    /// Key of the activity that initializes the correlation.
    ///
    /// A back-reference only; the activity is owned by its container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initializing_activity: Option<String>,

    /// Keys of the activities that follow the correlation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub following_activities: Vec<String>,
}

/// A variable declared in a workflow scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowVariable {
    #[serde(flatten)]
    pub object: WorkflowObject,

    /// Declared type name
    pub variable_type: String,

    /// Present on correlation variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation: Option<CorrelationBinding>,
}

impl WorkflowVariable {
    pub fn new(
        name: impl Into<String>,
        key: impl Into<String>,
        variable_type: impl Into<String>,
    ) -> Self {
        Self {
            object: WorkflowObject::new(name, key, WorkflowObjectType::Variable),
            variable_type: variable_type.into(),
            correlation: None,
        }
    }

    pub fn correlation(
        name: impl Into<String>,
        key: impl Into<String>,
        binding: CorrelationBinding,
    ) -> Self {
        let variable_type = binding.correlation_type.clone();
        Self {
            object: WorkflowObject::new(name, key, WorkflowObjectType::CorrelationVariable),
            variable_type,
            correlation: Some(binding),
        }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn key(&self) -> &str {
        &self.object.key
    }

    pub fn is_correlation(&self) -> bool {
        self.correlation.is_some()
    }
}
