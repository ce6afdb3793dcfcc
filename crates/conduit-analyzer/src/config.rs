// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Analysis configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Help link URLs attached to produced objects for the migration report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HelpLinks {
    /// Attached to every process manager
    pub process_manager: Option<String>,
    /// Attached to every routing slip router
    pub routing_slip_router: Option<String>,
    /// Attached to custom pipeline components
    pub custom_component: Option<String>,
}

/// Settings for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Application owning the shared channels (default: "systemapplication")
    pub system_application: String,
    /// Message box topic channel name (default: "messageboxtopic")
    pub message_box_channel: String,
    /// Suspend queue channel name (default: "suspendqueue")
    pub suspend_queue_channel: String,
    /// Interchange queue channel name (default: "interchangequeue")
    pub interchange_queue_channel: String,
    /// Prefix of router trigger URLs (default: "/routingManager/route")
    pub routing_manager_path: String,
    /// Source properties never copied onto workflow objects
    pub ignored_properties: Vec<String>,
    /// Lower the rating of an entity an error is recorded against (default: true)
    pub downgrade_rating_on_error: bool,
    /// Subscriptions are durable (default: true)
    pub durable_subscriptions: bool,
    /// Subscriptions deliver in order (default: false)
    pub ordered_subscriptions: bool,
    pub help_links: HelpLinks,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            system_application: "systemapplication".to_string(),
            message_box_channel: "messageboxtopic".to_string(),
            suspend_queue_channel: "suspendqueue".to_string(),
            interchange_queue_channel: "interchangequeue".to_string(),
            routing_manager_path: "/routingManager/route".to_string(),
            ignored_properties: [
                "ReportToAnalyst",
                "AnalystComments",
                "Signal",
                "Layout",
                "ShapeLocation",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            downgrade_rating_on_error: true,
            durable_subscriptions: true,
            ordered_subscriptions: false,
            help_links: HelpLinks::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from a JSON string; missing settings take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a JSON value; missing settings take defaults.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_value(value.clone())?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty names and paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("systemApplication", &self.system_application),
            ("messageBoxChannel", &self.message_box_channel),
            ("suspendQueueChannel", &self.suspend_queue_channel),
            ("interchangeQueueChannel", &self.interchange_queue_channel),
            ("routingManagerPath", &self.routing_manager_path),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }
        if !self.routing_manager_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "routingManagerPath must start with '/', got '{}'",
                self.routing_manager_path
            )));
        }
        Ok(())
    }

    /// Whether a source property is skipped by the walker.
    pub fn is_ignored_property(&self, name: &str) -> bool {
        self.ignored_properties.iter().any(|p| p == name)
    }

    /// Set the system application name.
    pub fn with_system_application(mut self, name: impl Into<String>) -> Self {
        self.system_application = name.into();
        self
    }

    /// Set the router trigger URL prefix.
    pub fn with_routing_manager_path(mut self, path: impl Into<String>) -> Self {
        self.routing_manager_path = path.into();
        self
    }

    /// Enable or disable rating downgrade on recorded errors.
    pub fn with_downgrade_rating_on_error(mut self, enabled: bool) -> Self {
        self.downgrade_rating_on_error = enabled;
        self
    }

    /// Set the help links.
    pub fn with_help_links(mut self, help_links: HelpLinks) -> Self {
        self.help_links = help_links;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.routing_manager_path, "/routingManager/route");
        assert!(config.is_ignored_property("ShapeLocation"));
        assert!(!config.is_ignored_property("Name"));
        assert!(config.durable_subscriptions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = AnalysisConfig::from_value(&json!({
            "systemApplication": "shared",
            "helpLinks": { "processManager": "https://docs/pm" }
        }))
        .unwrap();
        assert_eq!(config.system_application, "shared");
        assert_eq!(config.message_box_channel, "messageboxtopic");
        assert_eq!(config.help_links.process_manager.as_deref(), Some("https://docs/pm"));
    }

    #[test]
    fn test_invalid_config() {
        let err = AnalysisConfig::from_json(r#"{ "routingManagerPath": "route" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = AnalysisConfig::from_json(r#"{ "messageBoxChannel": " " }"#).unwrap_err();
        assert!(err.to_string().contains("messageBoxChannel"));

        assert!(matches!(
            AnalysisConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
