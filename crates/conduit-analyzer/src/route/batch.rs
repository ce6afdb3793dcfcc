// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Batch (interchange) routes.
//!
//! When a step handles batches the route is split in two. The upstream
//! segment ends at that step and its terminal router writes to the shared
//! interchange queue. An activator aggregator reads the queue, a splitter
//! breaks the interchange apart and ordinary route binding continues with the
//! remaining steps.

use tracing::debug;

use conduit_model::key::{format_key, join_key};
use conduit_model::target::{
    ConversionRating, Intermediary, IntermediaryKind, MessagingObjectCommon,
};

use super::{RouteDirection, bind_route_with_channels, set_input, set_output};
use crate::context::AnalysisContext;

/// Index of the first step flagged as handling batches.
fn batch_step(ctx: &AnalysisContext, steps: &[String]) -> Option<usize> {
    steps.iter().position(|key| {
        ctx.target
            .find_messaging_object(key)
            .and_then(|(_, object)| object.as_intermediary())
            .is_some_and(|i| i.handles_batches)
    })
}

/// Bind a request route, splitting it at the first batch-handling step.
///
/// Without such a step this is ordinary route binding. Returns every key of
/// the bound route in order, the interchange queue included.
pub fn bind_batch_route(
    ctx: &mut AnalysisContext,
    app_key: &str,
    scenario: &str,
    steps: &[String],
) -> Vec<String> {
    let Some(split) = batch_step(ctx, steps) else {
        return bind_route_with_channels(ctx, app_key, scenario, steps, RouteDirection::Request);
    };
    debug!(scenario = %scenario, step = %steps[split], "Splitting route at batch step");

    let mut route =
        bind_route_with_channels(ctx, app_key, scenario, &steps[..=split], RouteDirection::Request);

    let queue = ctx.interchange_queue_key();
    let owner = steps[split].clone();
    let Some(queue_key) = ctx.require_shared_channel(queue, &owner) else {
        return route;
    };
    if let Some(terminal) = route.last().cloned() {
        set_output(ctx, &terminal, &queue_key);
        let queue_name = ctx.config.interchange_queue_channel.clone();
        if let Some(router) = ctx
            .target
            .find_application_mut(app_key)
            .and_then(|app| app.intermediary_mut(&terminal))
            && let IntermediaryKind::RoutingSlipRouter { route_to } = &mut router.kind
        {
            *route_to = queue_name;
        }
    }
    route.push(queue_key.clone());

    let scenario_key = join_key(&[app_key, &format_key(scenario)]);
    let aggregator_key = join_key(&[&scenario_key, "aggregator"]);
    let aggregator = Intermediary::new(
        MessagingObjectCommon::new(aggregator_key, "Interchange Aggregator")
            .with_description("Collects the messages of one interchange")
            .with_rating(ConversionRating::FullConversion)
            .with_scenario(scenario, "Aggregator"),
        IntermediaryKind::Aggregator,
    )
    .with_activator(true);
    let splitter = Intermediary::new(
        MessagingObjectCommon::new(join_key(&[&scenario_key, "splitter"]), "Interchange Splitter")
            .with_description("Splits an interchange into its messages")
            .with_rating(ConversionRating::FullConversion)
            .with_scenario(scenario, "Splitter"),
        IntermediaryKind::Splitter,
    );
    let (Some(aggregator), Some(splitter)) = (
        ctx.add_intermediary(app_key, aggregator),
        ctx.add_intermediary(app_key, splitter),
    ) else {
        return route;
    };
    set_input(ctx, &aggregator, &queue_key);

    let mut downstream = vec![aggregator, splitter];
    downstream.extend(steps[split + 1..].iter().cloned());
    route.extend(bind_route_with_channels(
        ctx,
        app_key,
        scenario,
        &downstream,
        RouteDirection::Request,
    ));
    route
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::error::ErrorKind;
    use conduit_model::source::ResourceRegistry;
    use conduit_model::target::{Application, Channel, ChannelKind, MessageBus, TargetModel};

    fn context(with_queue: bool) -> AnalysisContext {
        let mut bus = MessageBus::new(MessagingObjectCommon::new("bus", "Message Bus"));
        let mut system = Application::new(MessagingObjectCommon::new(
            "bus:systemapplication",
            "System Application",
        ));
        if with_queue {
            system.channels.push(Channel::new(
                MessagingObjectCommon::new(
                    "bus:systemapplication:interchangequeue",
                    "Interchange Queue",
                ),
                ChannelKind::CorrelatingQueue,
            ));
        }
        let mut app = Application::new(MessagingObjectCommon::new("bus:orders", "Orders"));
        for (leaf, batches) in [("disassemble", true), ("map", false), ("publish", false)] {
            app.intermediaries.push(
                Intermediary::new(
                    MessagingObjectCommon::new(format!("bus:orders:in:{}", leaf), leaf),
                    IntermediaryKind::MessagePublisher,
                )
                .with_handles_batches(batches),
            );
        }
        bus.applications.push(system);
        bus.applications.push(app);
        AnalysisContext::new(
            AnalysisConfig::default(),
            ResourceRegistry::new(),
            TargetModel::new(bus),
        )
    }

    fn steps() -> Vec<String> {
        ["disassemble", "map", "publish"]
            .iter()
            .map(|leaf| format!("bus:orders:in:{}", leaf))
            .collect()
    }

    #[test]
    fn test_batch_route_goes_through_interchange_queue() {
        let mut ctx = context(true);
        let route = bind_batch_route(&mut ctx, "bus:orders", "In", &steps());
        assert!(ctx.diagnostics.is_ok(), "{:?}", ctx.diagnostics.messages());

        // disassemble, router, queue, aggregator, router, splitter, router,
        // map, router, publish, router
        assert_eq!(route.len(), 11);
        assert_eq!(route[2], "bus:systemapplication:interchangequeue");
        assert_eq!(route[3], "bus:orders:in:aggregator");
        assert_eq!(route[5], "bus:orders:in:splitter");

        let app = ctx.target.find_application("bus:orders").unwrap();
        let terminal = app.intermediaries.iter().find(|i| i.common.key == route[1]).unwrap();
        assert!(terminal.output_channel_key_refs.contains(&route[2]));
        let aggregator = app.intermediaries.iter().find(|i| i.common.key == route[3]).unwrap();
        assert!(aggregator.activator);
        assert!(aggregator.input_channel_key_refs.contains(&route[2]));
    }

    #[test]
    fn test_missing_interchange_queue() {
        let mut ctx = context(false);
        let route = bind_batch_route(&mut ctx, "bus:orders", "In", &steps());
        assert_eq!(route.len(), 2);
        assert_eq!(ctx.diagnostics.count(ErrorKind::MissingTargetReference), 1);
    }

    #[test]
    fn test_route_without_batch_step() {
        let mut ctx = context(true);
        let steps: Vec<String> = steps().into_iter().skip(1).collect();
        let route = bind_batch_route(&mut ctx, "bus:orders", "In", &steps);
        assert_eq!(route.len(), 4);
    }
}
