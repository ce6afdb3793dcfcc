// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Analysis context threaded through every stage.
//!
//! Owns the source registry, the target model being built, the diagnostics
//! list and the recorded scenarios. Passed `&mut` so there is exactly one
//! writer at a time.

use conduit_model::key::{format_key, join_key};
use conduit_model::source::ResourceRegistry;
use conduit_model::target::{
    Application, Channel, ConversionRating, Endpoint, Intermediary, ReportMessage, TargetModel,
};

use crate::config::AnalysisConfig;
use crate::diagnostics::Diagnostics;
use crate::error::AnalysisError;
use crate::scenario::Scenario;

/// State of one analysis run.
#[derive(Debug)]
pub struct AnalysisContext {
    pub config: AnalysisConfig,

    /// Parsed source application (read-only)
    pub resources: ResourceRegistry,

    /// Produced messaging model
    pub target: TargetModel,

    pub diagnostics: Diagnostics,

    /// Routes recorded by the scenario builders
    pub scenarios: Vec<Scenario>,
}

impl AnalysisContext {
    pub fn new(config: AnalysisConfig, resources: ResourceRegistry, target: TargetModel) -> Self {
        Self {
            config,
            resources,
            target,
            diagnostics: Diagnostics::new(),
            scenarios: Vec::new(),
        }
    }

    /// Record an error, attaching it to a produced entity when given.
    ///
    /// The entity gets an error report message and, when configured, its
    /// rating is lowered to at most partial conversion.
    pub fn record_error(&mut self, err: AnalysisError, entity_key: Option<&str>) {
        if let Some(key) = entity_key {
            self.attach_error(&err, key);
        }
        self.diagnostics.record(err);
    }

    /// Attach errors already recorded since `mark` to an entity.
    pub fn attach_errors_since(&mut self, mark: usize, entity_key: &str) {
        let errors = self.diagnostics.since(mark).to_vec();
        for err in &errors {
            self.attach_error(err, entity_key);
        }
    }

    fn attach_error(&mut self, err: &AnalysisError, entity_key: &str) {
        let downgrade = self.config.downgrade_rating_on_error;
        if let Some(mut object) = self.target.find_messaging_object_mut(entity_key) {
            let common = object.common_mut();
            common.report_messages.push(ReportMessage::error(err.to_string()));
            if downgrade {
                common.rating = common.rating.downgrade_to(ConversionRating::PartialConversion);
            }
        }
    }

    // ===== Shared channels =====

    fn system_key(&self, leaf: &str) -> Option<String> {
        let bus = self.target.bus_key()?;
        Some(join_key(&[
            bus,
            &format_key(&self.config.system_application),
            &format_key(leaf),
        ]))
    }

    /// Key of the message box topic channel.
    pub fn message_box_key(&self) -> Option<String> {
        self.system_key(&self.config.message_box_channel)
    }

    /// Key of the suspend queue channel.
    pub fn suspend_queue_key(&self) -> Option<String> {
        self.system_key(&self.config.suspend_queue_channel)
    }

    /// Key of the interchange queue channel.
    pub fn interchange_queue_key(&self) -> Option<String> {
        self.system_key(&self.config.interchange_queue_channel)
    }

    /// Resolve the key of a shared channel, recording a missing reference.
    pub fn require_shared_channel(&mut self, key: Option<String>, owner: &str) -> Option<String> {
        match key {
            Some(key) if self.target.find_messaging_object(&key).is_some() => Some(key),
            Some(key) => {
                self.record_error(AnalysisError::missing_target(owner, key), Some(owner));
                None
            }
            None => {
                self.record_error(AnalysisError::missing_target(owner, "message bus"), None);
                None
            }
        }
    }

    /// Target application key for a source application name.
    pub fn target_application_key(&self, application_name: &str) -> Option<String> {
        let bus = self.target.bus_key()?;
        Some(join_key(&[bus, &format_key(application_name)]))
    }

    // ===== Target objects =====

    /// Add an intermediary to an application unless its key already exists.
    ///
    /// Returns the key, or `None` when the application is missing.
    pub fn add_intermediary(
        &mut self,
        app_key: &str,
        intermediary: Intermediary,
    ) -> Option<String> {
        let key = intermediary.common.key.clone();
        self.insert_object(app_key, &key, |app| app.intermediaries.push(intermediary))
    }

    /// Add a channel to an application unless its key already exists.
    pub fn add_channel(&mut self, app_key: &str, channel: Channel) -> Option<String> {
        let key = channel.common.key.clone();
        self.insert_object(app_key, &key, |app| app.channels.push(channel))
    }

    /// Add an endpoint to an application unless its key already exists.
    pub fn add_endpoint(&mut self, app_key: &str, endpoint: Endpoint) -> Option<String> {
        let key = endpoint.common.key.clone();
        self.insert_object(app_key, &key, |app| app.endpoints.push(endpoint))
    }

    fn insert_object(
        &mut self,
        app_key: &str,
        key: &str,
        insert: impl FnOnce(&mut Application),
    ) -> Option<String> {
        if self.target.find_messaging_object(key).is_some() {
            return Some(key.to_string());
        }
        match self.target.find_application_mut(app_key) {
            Some(app) => {
                insert(app);
                Some(key.to_string())
            }
            None => {
                self.record_error(AnalysisError::missing_target(key, app_key), None);
                None
            }
        }
    }

    /// Scenario step name of an object, falling back to its name.
    pub fn step_name(&self, key: &str) -> Option<String> {
        let (_, object) = self.target.find_messaging_object(key)?;
        let common = object.common();
        Some(
            common
                .scenario_step_name
                .clone()
                .unwrap_or_else(|| common.name.clone()),
        )
    }

    /// Add a help link to an entity.
    pub fn add_help_link(&mut self, entity_key: &str, url: Option<String>) {
        if let Some(url) = url
            && let Some(mut object) = self.target.find_messaging_object_mut(entity_key)
        {
            object.common_mut().add_report_link(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_model::target::{ChannelKind, IntermediaryKind, MessageBus, MessagingObjectCommon};

    fn context() -> AnalysisContext {
        let mut bus = MessageBus::new(MessagingObjectCommon::new("bus", "Message Bus"));
        let mut system = Application::new(MessagingObjectCommon::new(
            "bus:systemapplication",
            "System Application",
        ));
        system.channels.push(Channel::new(
            MessagingObjectCommon::new("bus:systemapplication:messageboxtopic", "Message Box"),
            ChannelKind::Topic {
                subscriptions: Vec::new(),
            },
        ));
        let mut app = Application::new(MessagingObjectCommon::new("bus:orders", "Orders"));
        app.intermediaries.push(Intermediary::new(
            MessagingObjectCommon::new("bus:orders:step", "Step")
                .with_rating(ConversionRating::FullConversion),
            IntermediaryKind::MessagePublisher,
        ));
        bus.applications.push(system);
        bus.applications.push(app);
        AnalysisContext::new(
            AnalysisConfig::default(),
            ResourceRegistry::new(),
            TargetModel::new(bus),
        )
    }

    #[test]
    fn test_shared_channel_keys() {
        let ctx = context();
        assert_eq!(
            ctx.message_box_key().as_deref(),
            Some("bus:systemapplication:messageboxtopic")
        );
        assert_eq!(
            ctx.interchange_queue_key().as_deref(),
            Some("bus:systemapplication:interchangequeue")
        );
        assert_eq!(ctx.target_application_key("Orders").as_deref(), Some("bus:orders"));
    }

    #[test]
    fn test_record_error_attaches_and_downgrades() {
        let mut ctx = context();
        ctx.record_error(AnalysisError::missing("Step", "map"), Some("bus:orders:step"));
        let (_, object) = ctx.target.find_messaging_object("bus:orders:step").unwrap();
        assert_eq!(object.common().rating, ConversionRating::PartialConversion);
        assert_eq!(object.common().report_messages.len(), 1);
        assert_eq!(ctx.diagnostics.len(), 1);
    }

    #[test]
    fn test_record_error_without_downgrade() {
        let mut ctx = context();
        ctx.config = ctx.config.clone().with_downgrade_rating_on_error(false);
        ctx.record_error(AnalysisError::missing("Step", "map"), Some("bus:orders:step"));
        let (_, object) = ctx.target.find_messaging_object("bus:orders:step").unwrap();
        assert_eq!(object.common().rating, ConversionRating::FullConversion);
    }

    #[test]
    fn test_add_object_is_find_or_create() {
        let mut ctx = context();
        let publisher = || {
            Intermediary::new(
                MessagingObjectCommon::new("bus:orders:publisher", "Publisher")
                    .with_scenario("orders", "Publish"),
                IntermediaryKind::MessagePublisher,
            )
        };
        assert!(ctx.add_intermediary("bus:orders", publisher()).is_some());
        assert!(ctx.add_intermediary("bus:orders", publisher()).is_some());
        let app = ctx.target.find_application("bus:orders").unwrap();
        assert_eq!(app.intermediaries.len(), 2);
        assert_eq!(ctx.step_name("bus:orders:publisher").as_deref(), Some("Publish"));
        assert_eq!(ctx.step_name("bus:orders:step").as_deref(), Some("Step"));

        assert!(ctx.add_intermediary("bus:missing", publisher()).is_some());
        let other = Intermediary::new(
            MessagingObjectCommon::new("bus:missing:x", "X"),
            IntermediaryKind::Splitter,
        );
        assert!(ctx.add_intermediary("bus:missing", other).is_none());
        assert_eq!(ctx.diagnostics.len(), 1);
    }

    #[test]
    fn test_require_shared_channel() {
        let mut ctx = context();
        let key = ctx.message_box_key();
        assert!(ctx.require_shared_channel(key, "bus:orders:step").is_some());
        let missing = ctx.suspend_queue_key();
        assert!(ctx.require_shared_channel(missing, "bus:orders:step").is_none());
        assert_eq!(ctx.diagnostics.len(), 1);
    }
}
