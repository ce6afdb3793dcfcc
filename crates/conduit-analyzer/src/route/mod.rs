// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Routing-slip route binding.
//!
//! A route is an ordered list of messaging object keys. Binding interleaves a
//! routing slip router after every step (`[s0, r0, s1, r1, ...]`), then
//! connects each adjacent pair with a trigger channel. Channels leaving a
//! router carry the URL of the step they route to.
//!
//! Routers and channels are found or created by key, so binding the same
//! route twice produces no duplicates.

pub mod batch;

use tracing::debug;

use conduit_model::key::{format_key, join_key};
use conduit_model::target::{
    Channel, ChannelKind, ConversionRating, Intermediary, IntermediaryKind, MessagingObjectCommon,
    MessagingObjectMut,
};

use crate::context::AnalysisContext;
use crate::error::AnalysisError;

/// Router name segment standing for the end of a route.
pub const END_OF_ROUTE: &str = "end";

/// Direction a route is walked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDirection {
    /// Steps are walked in the order given
    Request,
    /// Steps given in request order are walked in reverse
    Response,
}

impl RouteDirection {
    fn router_leaf(&self) -> &'static str {
        match self {
            RouteDirection::Request => "routingsliprouter",
            RouteDirection::Response => "responserouter",
        }
    }

    fn router_name(&self) -> &'static str {
        match self {
            RouteDirection::Request => "Routing Slip Router",
            RouteDirection::Response => "Response Router",
        }
    }
}

/// Interleave a routing slip router after every step.
///
/// For N steps the result has 2N entries alternating step and router. The
/// last router routes to the end of the route.
pub fn bind_route(
    ctx: &mut AnalysisContext,
    app_key: &str,
    scenario: &str,
    steps: &[String],
    direction: RouteDirection,
) -> Vec<String> {
    let ordered: Vec<&String> = match direction {
        RouteDirection::Request => steps.iter().collect(),
        RouteDirection::Response => steps.iter().rev().collect(),
    };

    let mut route = Vec::with_capacity(ordered.len() * 2);
    for (index, step) in ordered.iter().enumerate() {
        let to = ordered.get(index + 1).map(|next| step_name(ctx, next));
        route.push(step.to_string());
        if let Some(router) = add_router(ctx, app_key, scenario, step, to.as_deref(), direction) {
            route.push(router);
        }
    }
    debug!(scenario = %scenario, entries = route.len(), "Route bound");
    route
}

/// Connect every adjacent pair of a bound route with a trigger channel.
///
/// Returns the channel keys in route order; 2N-1 channels for a route of 2N
/// entries.
pub fn bind_channels(ctx: &mut AnalysisContext, app_key: &str, route: &[String]) -> Vec<String> {
    route
        .windows(2)
        .filter_map(|pair| connect(ctx, app_key, &pair[0], &pair[1], false))
        .collect()
}

/// Bind a route and its channels, returning the full list of keys.
pub fn bind_route_with_channels(
    ctx: &mut AnalysisContext,
    app_key: &str,
    scenario: &str,
    steps: &[String],
    direction: RouteDirection,
) -> Vec<String> {
    let route = bind_route(ctx, app_key, scenario, steps, direction);
    bind_channels(ctx, app_key, &route);
    route
}

/// Link a process manager to an invoked one through a router.
///
/// Returns `[router, channel to router, activator channel from router]`.
/// The invoked process manager must be an activator.
pub fn bind_invocation_hop(
    ctx: &mut AnalysisContext,
    app_key: &str,
    scenario: &str,
    from: &str,
    to: &str,
) -> Option<Vec<String>> {
    let is_activator = ctx
        .target
        .find_messaging_object(to)
        .map(|(_, object)| object.is_activator());
    match is_activator {
        None => {
            ctx.record_error(AnalysisError::missing_target(from, to), Some(from));
            return None;
        }
        Some(false) => {
            ctx.record_error(AnalysisError::NotActivator { key: to.to_string() }, Some(from));
            return None;
        }
        Some(true) => {}
    }

    let to_name = step_name(ctx, to);
    let router = add_router(ctx, app_key, scenario, from, Some(&to_name), RouteDirection::Request)?;
    let to_router = connect(ctx, app_key, from, &router, false)?;
    let from_router = connect(ctx, app_key, &router, to, true)?;
    Some(vec![router, to_router, from_router])
}

fn step_name(ctx: &AnalysisContext, key: &str) -> String {
    ctx.step_name(key)
        .unwrap_or_else(|| key.rsplit(':').next().unwrap_or(key).to_string())
}

fn is_router(ctx: &AnalysisContext, key: &str) -> bool {
    ctx.target
        .find_messaging_object(key)
        .and_then(|(_, object)| object.as_intermediary())
        .is_some_and(Intermediary::is_router)
}

/// Find or create the router after `from` routing to `to`.
fn add_router(
    ctx: &mut AnalysisContext,
    app_key: &str,
    scenario: &str,
    from: &str,
    to: Option<&str>,
    direction: RouteDirection,
) -> Option<String> {
    let segment = to.map(format_key).unwrap_or_else(|| END_OF_ROUTE.to_string());
    let key = join_key(&[from, direction.router_leaf(), &segment]);
    let route_to = to.unwrap_or(END_OF_ROUTE).to_string();

    let common = MessagingObjectCommon::new(&key, direction.router_name())
        .with_description(format!(
            "Routes messages from '{}' to '{}'",
            step_name(ctx, from),
            route_to
        ))
        .with_rating(ConversionRating::FullConversion)
        .with_scenario(scenario, format!("{} {}", direction.router_name(), segment));
    let router = Intermediary::new(common, IntermediaryKind::RoutingSlipRouter { route_to });
    let key = ctx.add_intermediary(app_key, router)?;
    let help_link = ctx.config.help_links.routing_slip_router.clone();
    ctx.add_help_link(&key, help_link);
    Some(key)
}

/// Find or create the trigger channel from `from` to `to` and reference it
/// from both ends.
fn connect(
    ctx: &mut AnalysisContext,
    app_key: &str,
    from: &str,
    to: &str,
    activator: bool,
) -> Option<String> {
    let to_name = step_name(ctx, to);
    let trigger_url =
        is_router(ctx, from).then(|| format!("{}/{}", ctx.config.routing_manager_path, to_name));
    let key = join_key(&[from, &format_key(&to_name), "triggerchannel"]);

    let description = format!("Carries messages from '{}' to '{}'", step_name(ctx, from), to_name);
    let common = MessagingObjectCommon::new(&key, "Trigger Channel")
        .with_description(description)
        .with_rating(ConversionRating::FullConversion);
    let mut channel = Channel::new(common, ChannelKind::Trigger { trigger_url });
    channel.activator = activator;
    let key = ctx.add_channel(app_key, channel)?;

    set_output(ctx, from, &key);
    set_input(ctx, to, &key);
    Some(key)
}

/// Reference a channel as the output of an endpoint or intermediary.
///
/// An endpoint keeps the first channel it is given.
pub fn set_output(ctx: &mut AnalysisContext, object_key: &str, channel_key: &str) {
    match ctx.target.find_messaging_object_mut(object_key) {
        Some(MessagingObjectMut::Endpoint(endpoint)) => {
            endpoint
                .output_channel_key_ref
                .get_or_insert_with(|| channel_key.to_string());
        }
        Some(MessagingObjectMut::Intermediary(intermediary)) => {
            intermediary.output_channel_key_refs.insert(channel_key.to_string());
        }
        Some(_) => {}
        None => ctx.record_error(AnalysisError::missing_target(channel_key, object_key), None),
    }
}

/// Reference a channel as the input of an endpoint or intermediary.
pub fn set_input(ctx: &mut AnalysisContext, object_key: &str, channel_key: &str) {
    match ctx.target.find_messaging_object_mut(object_key) {
        Some(MessagingObjectMut::Endpoint(endpoint)) => {
            endpoint
                .input_channel_key_ref
                .get_or_insert_with(|| channel_key.to_string());
        }
        Some(MessagingObjectMut::Intermediary(intermediary)) => {
            intermediary.input_channel_key_refs.insert(channel_key.to_string());
        }
        Some(_) => {}
        None => ctx.record_error(AnalysisError::missing_target(channel_key, object_key), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use conduit_model::source::ResourceRegistry;
    use conduit_model::target::{Application, Endpoint, EndpointDirection, MessageBus, TargetModel};

    fn context() -> AnalysisContext {
        let mut bus = MessageBus::new(MessagingObjectCommon::new("bus", "Message Bus"));
        let mut app = Application::new(MessagingObjectCommon::new("bus:orders", "Orders"));
        app.endpoints.push(Endpoint::new(
            MessagingObjectCommon::new("bus:orders:in:endpoint", "File In")
                .with_scenario("in", "FileIn"),
            "FILE",
            EndpointDirection::Inbound,
        ));
        for (leaf, step) in [("decode", "Decode"), ("publish", "Publish")] {
            app.intermediaries.push(Intermediary::new(
                MessagingObjectCommon::new(format!("bus:orders:in:{}", leaf), step)
                    .with_scenario("in", step),
                IntermediaryKind::MessagePublisher,
            ));
        }
        bus.applications.push(app);
        AnalysisContext::new(
            AnalysisConfig::default(),
            ResourceRegistry::new(),
            TargetModel::new(bus),
        )
    }

    fn steps() -> Vec<String> {
        ["bus:orders:in:endpoint", "bus:orders:in:decode", "bus:orders:in:publish"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_route_shape() {
        let mut ctx = context();
        let route = bind_route(&mut ctx, "bus:orders", "in", &steps(), RouteDirection::Request);
        assert_eq!(route.len(), 6);
        assert_eq!(route[0], "bus:orders:in:endpoint");
        assert_eq!(route[1], "bus:orders:in:endpoint:routingsliprouter:decode");
        assert_eq!(route[5], "bus:orders:in:publish:routingsliprouter:end");
        for router in route.iter().skip(1).step_by(2) {
            assert!(is_router(&ctx, router));
        }

        let channels = bind_channels(&mut ctx, "bus:orders", &route);
        assert_eq!(channels.len(), 5);
        assert!(ctx.diagnostics.is_ok());

        // channel i leaves route[i] and enters route[i + 1]
        for (index, channel) in channels.iter().enumerate() {
            let (_, from_outputs) = channel_refs(&ctx, &route[index]);
            let (to_inputs, _) = channel_refs(&ctx, &route[index + 1]);
            assert!(from_outputs.contains(channel), "{} does not leave {}", channel, route[index]);
            assert!(to_inputs.contains(channel), "{} does not enter {}", channel, route[index + 1]);
        }
        let (endpoint_inputs, _) = channel_refs(&ctx, &route[0]);
        assert!(endpoint_inputs.is_empty());
        let (_, end_outputs) = channel_refs(&ctx, &route[5]);
        assert!(end_outputs.is_empty());
    }

    /// Input and output channel references of a step or router.
    fn channel_refs(ctx: &AnalysisContext, key: &str) -> (Vec<String>, Vec<String>) {
        let app = ctx.target.find_application("bus:orders").unwrap();
        if let Some(endpoint) = app.endpoints.iter().find(|e| e.common.key == key) {
            return (
                endpoint.input_channel_key_ref.iter().cloned().collect(),
                endpoint.output_channel_key_ref.iter().cloned().collect(),
            );
        }
        let intermediary = app.intermediaries.iter().find(|i| i.common.key == key).unwrap();
        (
            intermediary.input_channel_key_refs.iter().cloned().collect(),
            intermediary.output_channel_key_refs.iter().cloned().collect(),
        )
    }

    #[test]
    fn test_router_channels_carry_urls() {
        let mut ctx = context();
        let route = bind_route_with_channels(
            &mut ctx,
            "bus:orders",
            "in",
            &steps(),
            RouteDirection::Request,
        );
        let app = ctx.target.find_application("bus:orders").unwrap();

        let endpoint = app.endpoints[0].output_channel_key_ref.clone().unwrap();
        let (_, plain) = ctx.target.find_messaging_object(&endpoint).unwrap();
        assert_eq!(plain.as_channel().unwrap().trigger_url(), None);

        let router = app.intermediaries.iter().find(|i| i.common.key == route[1]).unwrap();
        let out = router.output_channel_key_refs.iter().next().unwrap();
        let (_, routed) = ctx.target.find_messaging_object(out).unwrap();
        assert_eq!(
            routed.as_channel().unwrap().trigger_url(),
            Some("/routingManager/route/Decode")
        );
        let IntermediaryKind::RoutingSlipRouter { route_to } = &router.kind else {
            panic!("expected a router");
        };
        assert_eq!(route_to, "Decode");
    }

    #[test]
    fn test_rebinding_is_idempotent() {
        let mut ctx = context();
        bind_route_with_channels(&mut ctx, "bus:orders", "in", &steps(), RouteDirection::Request);
        bind_route_with_channels(&mut ctx, "bus:orders", "in", &steps(), RouteDirection::Request);
        let app = ctx.target.find_application("bus:orders").unwrap();
        assert_eq!(app.intermediaries.len(), 2 + 3);
        assert_eq!(app.channels.len(), 5);
    }

    #[test]
    fn test_response_route_is_reversed() {
        let mut ctx = context();
        let route = bind_route(&mut ctx, "bus:orders", "in", &steps(), RouteDirection::Response);
        assert_eq!(route[0], "bus:orders:in:publish");
        assert_eq!(route[1], "bus:orders:in:publish:responserouter:decode");
        assert_eq!(route[4], "bus:orders:in:endpoint");
        assert_eq!(route[5], "bus:orders:in:endpoint:responserouter:end");
    }

    #[test]
    fn test_invocation_hop_requires_activator() {
        let mut ctx = context();
        let decode = "bus:orders:in:decode";
        let publish = "bus:orders:in:publish";
        let hop = bind_invocation_hop(&mut ctx, "bus:orders", "in", decode, publish);
        assert!(hop.is_none());
        assert_eq!(ctx.diagnostics.len(), 1);

        ctx.target
            .find_application_mut("bus:orders")
            .and_then(|app| app.intermediary_mut(publish))
            .unwrap()
            .activator = true;
        let hop = bind_invocation_hop(&mut ctx, "bus:orders", "in", decode, publish).unwrap();
        assert_eq!(hop.len(), 3);
        let (_, activating) = ctx.target.find_messaging_object(&hop[2]).unwrap();
        let channel = activating.as_channel().unwrap();
        assert!(channel.activator);
        assert_eq!(channel.trigger_url(), Some("/routingManager/route/Publish"));
    }
}
