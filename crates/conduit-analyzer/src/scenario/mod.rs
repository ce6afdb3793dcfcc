// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Port scenarios.
//!
//! A scenario is one end-to-end message path through the target model.
//! Receive locations and send ports each produce a request scenario, and a
//! second response scenario when they are two-way. The builders in this
//! module create the steps of a scenario and hand them to the route binder.

pub mod receive_port;
pub mod send_port;

pub use receive_port::build_receive_port_scenarios;
pub use send_port::build_send_port_scenarios;

use serde::Serialize;

use conduit_model::key::{format_key, join_key};
use conduit_model::source::{ComponentKind, PipelineDefinition};
use conduit_model::target::{
    ConversionRating, FilterGroup, Intermediary, IntermediaryKind, MessagingObjectCommon,
    Subscription, SubscriptionFilter,
};

use crate::binding::channels::attach_to_topic;
use crate::context::AnalysisContext;
use crate::error::AnalysisError;
use crate::route::{set_input, set_output};

/// What produced a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioKind {
    ReceivePort,
    SendPort,
    Orchestration,
}

/// A recorded route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub name: String,

    pub kind: ScenarioKind,

    /// Keys of the bound route in order, routers included
    pub route: Vec<String>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, kind: ScenarioKind, route: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            route,
        }
    }
}

/// Which side of a scenario a transformer sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransformSide {
    Request,
    Response,
}

impl TransformSide {
    fn leaf(&self) -> &'static str {
        match self {
            TransformSide::Request => "messagetransformer",
            TransformSide::Response => "responsetransformer",
        }
    }
}

/// Resolve a pipeline referenced by resource key.
///
/// Records a missing construct when the reference is unset or does not name
/// a pipeline resource.
pub(crate) fn resolve_pipeline(
    ctx: &mut AnalysisContext,
    owner: &str,
    construct: &str,
    pipeline_key: Option<&str>,
) -> Option<PipelineDefinition> {
    let Some(pipeline_key) = pipeline_key else {
        ctx.record_error(AnalysisError::missing(owner, construct), None);
        return None;
    };
    let pipeline = ctx
        .resources
        .find_resource_by_key(pipeline_key)
        .and_then(|r| r.as_pipeline())
        .cloned();
    if pipeline.is_none() {
        ctx.record_error(AnalysisError::unresolved(owner, construct, pipeline_key), None);
    }
    pipeline
}

/// Add one message processor per pipeline component.
pub(crate) fn add_components(
    ctx: &mut AnalysisContext,
    app_key: &str,
    scenario: &str,
    scenario_key: &str,
    pipeline: &PipelineDefinition,
) -> Vec<String> {
    let pipeline_segment = format_key(&pipeline.name);
    let mut keys = Vec::with_capacity(pipeline.components.len());
    for component in &pipeline.components {
        let key = join_key(&[scenario_key, &pipeline_segment, &format_key(&component.name)]);
        let rating = match component.kind {
            ComponentKind::Custom => ConversionRating::PartialConversion,
            _ => ConversionRating::FullConversion,
        };
        let common = MessagingObjectCommon::new(&key, &component.name)
            .with_description(format!(
                "{} component of pipeline '{}'",
                component.kind, pipeline.name
            ))
            .with_rating(rating)
            .with_scenario(scenario, &component.name);
        let processor = Intermediary::new(
            common,
            IntermediaryKind::MessageProcessor {
                component: component.name.clone(),
                component_kind: Some(component.kind.to_string()),
            },
        )
        .with_handles_batches(component.handles_batches);

        let Some(key) = ctx.add_intermediary(app_key, processor) else {
            continue;
        };
        if component.kind == ComponentKind::Custom {
            let help_link = ctx.config.help_links.custom_component.clone();
            ctx.add_help_link(&key, help_link);
        }
        keys.push(key);
    }
    keys
}

/// Add a transformer applying `maps`, or nothing when there are none.
pub(crate) fn add_transformer(
    ctx: &mut AnalysisContext,
    app_key: &str,
    scenario: &str,
    scenario_key: &str,
    maps: &[String],
    side: TransformSide,
) -> Option<String> {
    if maps.is_empty() {
        return None;
    }
    let key = join_key(&[scenario_key, side.leaf()]);
    let common = MessagingObjectCommon::new(key, "Message Transformer")
        .with_description(format!("Applies {}", maps.join(", ")))
        .with_rating(ConversionRating::FullConversion)
        .with_scenario(scenario, "MessageTransformer");
    let transformer = Intermediary::new(
        common,
        IntermediaryKind::MessageTransformer {
            maps: maps.to_vec(),
        },
    );
    ctx.add_intermediary(app_key, transformer)
}

/// Add a publisher writing to the message box.
///
/// The publisher is keyed after its scenario step name. It is created even
/// when the message box is missing; the missing channel is recorded against
/// it.
pub(crate) fn add_publisher(
    ctx: &mut AnalysisContext,
    app_key: &str,
    scenario: &str,
    scenario_key: &str,
    step: &str,
) -> Option<String> {
    let key = join_key(&[scenario_key, &format_key(step)]);
    let common = MessagingObjectCommon::new(key, "Message Publisher")
        .with_description("Publishes messages to the message box")
        .with_rating(ConversionRating::FullConversion)
        .with_scenario(scenario, step);
    let publisher = Intermediary::new(common, IntermediaryKind::MessagePublisher);
    let key = ctx.add_intermediary(app_key, publisher)?;
    let topic = ctx.message_box_key();
    if let Some(topic_key) = ctx.require_shared_channel(topic, &key) {
        set_output(ctx, &key, &topic_key);
    }
    Some(key)
}

/// Add an activator subscriber reading from the message box.
///
/// A subscription named after the subscriber's key is attached to the topic.
/// Returns `None` when the message box is missing.
pub(crate) fn add_subscriber(
    ctx: &mut AnalysisContext,
    app_key: &str,
    scenario: &str,
    scenario_key: &str,
    step: &str,
    filter: FilterGroup,
    ordered: bool,
) -> Option<String> {
    let key = join_key(&[scenario_key, &format_key(step)]);
    let topic = ctx.message_box_key();
    let topic_key = ctx.require_shared_channel(topic, &key)?;

    let common = MessagingObjectCommon::new(&key, "Message Subscriber")
        .with_description("Receives messages from the message box")
        .with_rating(ConversionRating::FullConversion)
        .with_scenario(scenario, step);
    let subscriber = Intermediary::new(
        common,
        IntermediaryKind::MessageSubscriber {
            topic_channel_key: topic_key.clone(),
        },
    )
    .with_activator(true);
    let key = ctx.add_intermediary(app_key, subscriber)?;
    set_input(ctx, &key, &topic_key);
    let subscription = Subscription::new(&key, ctx.config.durable_subscriptions, ordered)
        .with_filter(SubscriptionFilter::new(filter));
    attach_to_topic(ctx, &topic_key, subscription);
    Some(key)
}
