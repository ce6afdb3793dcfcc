// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Send port scenarios.
//!
//! A send port becomes the request route
//! `[subscriber, transformer, pipeline components..., adapter endpoint]`.
//! The subscriber matches the port's own filter or any message addressed to
//! the port by name. Two-way ports also get a response route from the
//! endpoint through the receive pipeline to a message box publisher.

use tracing::{debug, info};

use conduit_model::key::{format_key, join_key};
use conduit_model::source::SendPortDefinition;
use conduit_model::target::{
    ConversionRating, Endpoint, EndpointDirection, FilterGroup, MessagingObjectCommon,
};

use super::{
    Scenario, ScenarioKind, TransformSide, add_components, add_publisher, add_subscriber,
    add_transformer, resolve_pipeline,
};
use crate::binding::subscription::{SEND_PORT_NAME_PROPERTY, equals, predicate_group};
use crate::context::AnalysisContext;
use crate::route::{RouteDirection, bind_route_with_channels};

/// Subscription filter of a send port.
///
/// An OR of the port's filter groups and a port-name equality group.
fn port_filter(ctx: &mut AnalysisContext, port: &SendPortDefinition) -> FilterGroup {
    let mut any = FilterGroup::or();
    if let Some(predicate) = port.filter.as_ref().filter(|p| !p.is_empty()) {
        let mut errors = Vec::new();
        any = predicate_group(&port.name, predicate, &mut errors);
        for err in errors {
            ctx.record_error(err, None);
        }
    }
    any.groups
        .push(FilterGroup::and().with_filter(equals(SEND_PORT_NAME_PROPERTY, &port.name)));
    any
}

/// Build the scenarios of a send port.
///
/// A port without a resolvable transmit pipeline is reported and produces
/// nothing.
pub fn build_send_port_scenarios(
    ctx: &mut AnalysisContext,
    app_key: &str,
    port: &SendPortDefinition,
) {
    info!(port = %port.name, two_way = port.two_way, "Building send port scenarios");
    let scenario = port.name.as_str();
    let scenario_key = join_key(&[app_key, &format_key(&port.name)]);

    let Some(pipeline) = resolve_pipeline(
        ctx,
        scenario,
        "transmit pipeline",
        port.transmit_pipeline.as_deref(),
    ) else {
        return;
    };

    let filter = port_filter(ctx, port);
    let ordered = port.ordered_delivery || ctx.config.ordered_subscriptions;
    let Some(subscriber) = add_subscriber(
        ctx,
        app_key,
        scenario,
        &scenario_key,
        "MessageSubscriber",
        filter,
        ordered,
    ) else {
        return;
    };

    let common = MessagingObjectCommon::new(join_key(&[&scenario_key, "sendadapter"]), &port.name)
        .with_description(format!("{} send port", port.adapter))
        .with_rating(ConversionRating::FullConversion)
        .with_scenario(scenario, "SendAdapter");
    let mut endpoint = Endpoint::new(common, &port.adapter, EndpointDirection::Outbound);
    endpoint.two_way = port.two_way;
    let Some(endpoint_key) = ctx.add_endpoint(app_key, endpoint) else {
        return;
    };

    let mut steps = vec![subscriber];
    steps.extend(add_transformer(
        ctx,
        app_key,
        scenario,
        &scenario_key,
        &port.outbound_maps,
        TransformSide::Request,
    ));
    steps.extend(add_components(ctx, app_key, scenario, &scenario_key, &pipeline));
    steps.push(endpoint_key.clone());

    let route = bind_route_with_channels(ctx, app_key, scenario, &steps, RouteDirection::Request);
    debug!(scenario = %scenario, entries = route.len(), "Send scenario bound");
    ctx.scenarios.push(Scenario::new(scenario, ScenarioKind::SendPort, route));

    if port.two_way {
        build_response(ctx, app_key, port, &scenario_key, &endpoint_key);
    }
}

/// Response route of a two-way send port.
///
/// Messages travel endpoint, receive pipeline, publisher.
fn build_response(
    ctx: &mut AnalysisContext,
    app_key: &str,
    port: &SendPortDefinition,
    scenario_key: &str,
    endpoint_key: &str,
) {
    let Some(pipeline) = resolve_pipeline(
        ctx,
        &port.name,
        "response pipeline",
        port.receive_pipeline.as_deref(),
    ) else {
        return;
    };
    let response = format!("{} Response", port.name);
    let response_key = join_key(&[scenario_key, "response"]);

    let mut walk = vec![endpoint_key.to_string()];
    walk.extend(add_components(ctx, app_key, &response, &response_key, &pipeline));
    walk.extend(add_publisher(ctx, app_key, &response, &response_key, "MessagePublisher"));

    // The response binder walks its input backwards.
    walk.reverse();
    let route = bind_route_with_channels(ctx, app_key, &response, &walk, RouteDirection::Response);
    ctx.scenarios.push(Scenario::new(response, ScenarioKind::SendPort, route));
}
