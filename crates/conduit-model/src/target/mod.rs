// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Target messaging model and its key-indexed registry.
//!
//! The [`TargetModel`] owns one message bus; the bus owns applications; each
//! application owns its endpoints, intermediaries, channels and messages.
//! Every cross reference between produced objects is a key string resolved
//! through [`TargetModel::find_messaging_object`].

pub mod objects;
pub mod report;
pub mod subscription;

pub use objects::{
    Channel, ChannelKind, Endpoint, EndpointDirection, Intermediary, IntermediaryKind, Message,
    MessagingObjectCommon, MessagingObjectMut, MessagingObjectRef,
};
pub use report::{ConversionRating, ReportMessage, Severity};
pub use subscription::{Filter, FilterGroup, FilterGroupOperation, Subscription, SubscriptionFilter};

use serde::{Deserialize, Serialize};

/// A target application: the unit produced objects are grouped in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(flatten)]
    pub common: MessagingObjectCommon,

    #[serde(default)]
    pub endpoints: Vec<Endpoint>,

    #[serde(default)]
    pub intermediaries: Vec<Intermediary>,

    #[serde(default)]
    pub channels: Vec<Channel>,

    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Application {
    pub fn new(common: MessagingObjectCommon) -> Self {
        Self {
            common,
            endpoints: Vec::new(),
            intermediaries: Vec::new(),
            channels: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.common.key
    }

    /// Find an object owned by this application.
    pub fn find(&self, key: &str) -> Option<MessagingObjectRef<'_>> {
        if let Some(e) = self.endpoints.iter().find(|e| e.common.key == key) {
            return Some(MessagingObjectRef::Endpoint(e));
        }
        if let Some(i) = self.intermediaries.iter().find(|i| i.common.key == key) {
            return Some(MessagingObjectRef::Intermediary(i));
        }
        if let Some(c) = self.channels.iter().find(|c| c.common.key == key) {
            return Some(MessagingObjectRef::Channel(c));
        }
        self.messages
            .iter()
            .find(|m| m.common.key == key)
            .map(MessagingObjectRef::Message)
    }

    /// Find an object owned by this application, mutably.
    pub fn find_mut(&mut self, key: &str) -> Option<MessagingObjectMut<'_>> {
        if let Some(e) = self.endpoints.iter_mut().find(|e| e.common.key == key) {
            return Some(MessagingObjectMut::Endpoint(e));
        }
        if let Some(i) = self.intermediaries.iter_mut().find(|i| i.common.key == key) {
            return Some(MessagingObjectMut::Intermediary(i));
        }
        if let Some(c) = self.channels.iter_mut().find(|c| c.common.key == key) {
            return Some(MessagingObjectMut::Channel(c));
        }
        self.messages
            .iter_mut()
            .find(|m| m.common.key == key)
            .map(MessagingObjectMut::Message)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn intermediary_mut(&mut self, key: &str) -> Option<&mut Intermediary> {
        self.intermediaries.iter_mut().find(|i| i.common.key == key)
    }

    pub fn channel_mut(&mut self, key: &str) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.common.key == key)
    }

    pub fn endpoint_mut(&mut self, key: &str) -> Option<&mut Endpoint> {
        self.endpoints.iter_mut().find(|e| e.common.key == key)
    }

    /// Process managers of this application in insertion order.
    pub fn process_managers(&self) -> impl Iterator<Item = &Intermediary> {
        self.intermediaries
            .iter()
            .filter(|i| matches!(i.kind, IntermediaryKind::ProcessManager(_)))
    }
}

/// The message bus: root of the target model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBus {
    #[serde(flatten)]
    pub common: MessagingObjectCommon,

    #[serde(default)]
    pub applications: Vec<Application>,
}

impl MessageBus {
    pub fn new(common: MessagingObjectCommon) -> Self {
        Self {
            common,
            applications: Vec::new(),
        }
    }
}

/// Registry of produced messaging objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_bus: Option<MessageBus>,
}

impl TargetModel {
    pub fn new(message_bus: MessageBus) -> Self {
        Self {
            message_bus: Some(message_bus),
        }
    }

    pub fn bus_key(&self) -> Option<&str> {
        self.message_bus.as_ref().map(|b| b.common.key.as_str())
    }

    pub fn applications(&self) -> impl Iterator<Item = &Application> {
        self.message_bus
            .iter()
            .flat_map(|b| b.applications.iter())
    }

    pub fn find_application(&self, key: &str) -> Option<&Application> {
        self.applications().find(|a| a.key() == key)
    }

    pub fn find_application_mut(&mut self, key: &str) -> Option<&mut Application> {
        self.message_bus
            .as_mut()?
            .applications
            .iter_mut()
            .find(|a| a.key() == key)
    }

    /// Resolve a key to its owning application and the object.
    pub fn find_messaging_object(
        &self,
        key: &str,
    ) -> Option<(&Application, MessagingObjectRef<'_>)> {
        self.applications()
            .find_map(|app| app.find(key).map(|object| (app, object)))
    }

    /// Resolve a key to the object, mutably.
    pub fn find_messaging_object_mut(&mut self, key: &str) -> Option<MessagingObjectMut<'_>> {
        self.message_bus
            .as_mut()?
            .applications
            .iter_mut()
            .find_map(|app| app.find_mut(key))
    }

    /// Key of the application owning an object.
    pub fn owning_application_key(&self, key: &str) -> Option<&str> {
        self.find_messaging_object(key).map(|(app, _)| app.key())
    }
}
