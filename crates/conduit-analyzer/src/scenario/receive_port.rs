// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Receive port scenarios.
//!
//! Each receive location becomes one request route
//! `[adapter endpoint, pipeline components..., transformer, publisher]`.
//! Two-way ports also get a response route from a message box subscriber
//! back to the same endpoint.

use tracing::{debug, info};

use conduit_model::key::{format_key, join_key};
use conduit_model::source::{ReceiveLocationDefinition, ReceivePortDefinition};
use conduit_model::target::{
    ConversionRating, Endpoint, EndpointDirection, FilterGroup, MessagingObjectCommon,
};

use super::{
    Scenario, ScenarioKind, TransformSide, add_components, add_publisher, add_subscriber,
    add_transformer, resolve_pipeline,
};
use crate::binding::subscription::{
    RECEIVE_PORT_NAME_PROPERTY, RESPONSE_TOKEN_PROPERTY, equals, exists,
};
use crate::context::AnalysisContext;
use crate::route::batch::bind_batch_route;
use crate::route::{RouteDirection, bind_route_with_channels};

/// Build the scenarios of every location of a receive port.
///
/// A location without a resolvable receive pipeline is reported and produces
/// nothing; its siblings are still built.
pub fn build_receive_port_scenarios(
    ctx: &mut AnalysisContext,
    app_key: &str,
    port: &ReceivePortDefinition,
) {
    info!(port = %port.name, locations = port.locations.len(), "Building receive port scenarios");
    for location in &port.locations {
        build_location(ctx, app_key, port, location);
    }
}

fn build_location(
    ctx: &mut AnalysisContext,
    app_key: &str,
    port: &ReceivePortDefinition,
    location: &ReceiveLocationDefinition,
) {
    let scenario = format!("{}.{}", port.name, location.name);
    let scenario_key = join_key(&[app_key, &format_key(&port.name), &format_key(&location.name)]);

    let Some(pipeline) = resolve_pipeline(
        ctx,
        &scenario,
        "receive pipeline",
        location.receive_pipeline.as_deref(),
    ) else {
        return;
    };

    let key = join_key(&[&scenario_key, "receiveadapter"]);
    let description = format!("{} receive location of port '{}'", location.adapter, port.name);
    let common = MessagingObjectCommon::new(key, &location.name)
        .with_description(description)
        .with_rating(ConversionRating::FullConversion)
        .with_scenario(&scenario, "ReceiveAdapter");
    let mut endpoint = Endpoint::new(common, &location.adapter, EndpointDirection::Inbound);
    endpoint.two_way = port.two_way;
    endpoint.activator = true;
    let Some(endpoint_key) = ctx.add_endpoint(app_key, endpoint) else {
        return;
    };

    let mut steps = vec![endpoint_key.clone()];
    steps.extend(add_components(ctx, app_key, &scenario, &scenario_key, &pipeline));
    steps.extend(add_transformer(
        ctx,
        app_key,
        &scenario,
        &scenario_key,
        &port.inbound_maps,
        TransformSide::Request,
    ));
    steps.extend(add_publisher(ctx, app_key, &scenario, &scenario_key, "MessagePublisher"));

    let route = bind_batch_route(ctx, app_key, &scenario, &steps);
    debug!(scenario = %scenario, entries = route.len(), "Receive scenario bound");
    ctx.scenarios.push(Scenario::new(&scenario, ScenarioKind::ReceivePort, route));

    if port.two_way {
        build_response(ctx, app_key, port, location, &scenario, &endpoint_key);
    }
}

/// Response route of a two-way location.
///
/// Messages travel subscriber, transformer, send pipeline, endpoint.
fn build_response(
    ctx: &mut AnalysisContext,
    app_key: &str,
    port: &ReceivePortDefinition,
    location: &ReceiveLocationDefinition,
    scenario: &str,
    endpoint_key: &str,
) {
    let Some(pipeline) = resolve_pipeline(
        ctx,
        scenario,
        "send pipeline",
        location.send_pipeline.as_deref(),
    ) else {
        return;
    };
    let response = format!("{} Response", scenario);
    let response_key = join_key(&[
        app_key,
        &format_key(&port.name),
        &format_key(&location.name),
        "response",
    ]);

    let filter = FilterGroup::and()
        .with_filter(equals(RECEIVE_PORT_NAME_PROPERTY, &port.name))
        .with_filter(exists(RESPONSE_TOKEN_PROPERTY));
    let ordered = ctx.config.ordered_subscriptions;
    let Some(subscriber) = add_subscriber(
        ctx,
        app_key,
        &response,
        &response_key,
        "MessageSubscriber",
        filter,
        ordered,
    ) else {
        return;
    };

    let mut walk = vec![subscriber];
    walk.extend(add_transformer(
        ctx,
        app_key,
        &response,
        &response_key,
        &port.outbound_maps,
        TransformSide::Response,
    ));
    walk.extend(add_components(ctx, app_key, &response, &response_key, &pipeline));
    walk.push(endpoint_key.to_string());

    // The response binder walks its input backwards.
    walk.reverse();
    let route = bind_route_with_channels(ctx, app_key, &response, &walk, RouteDirection::Response);
    ctx.scenarios.push(Scenario::new(response, ScenarioKind::ReceivePort, route));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::error::ErrorKind;
    use conduit_model::source::{
        ComponentKind, PipelineComponent, PipelineDefinition, PipelineDirection, Resource,
        ResourceRegistry, SourceObject,
    };
    use conduit_model::target::{Application, Channel, ChannelKind, MessageBus, TargetModel};

    fn pipeline(key: &str, direction: PipelineDirection, components: &[&str]) -> Resource {
        Resource::new(
            key,
            key,
            SourceObject::Pipeline(PipelineDefinition {
                name: key.to_string(),
                direction,
                components: components
                    .iter()
                    .map(|name| PipelineComponent {
                        name: name.to_string(),
                        kind: ComponentKind::Decoder,
                        handles_batches: false,
                    })
                    .collect(),
            }),
        )
    }

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
        bus.applications.push(system);
        bus.applications
            .push(Application::new(MessagingObjectCommon::new("bus:orders", "Orders")));
        let resources = ResourceRegistry::from(vec![
            pipeline("rcv", PipelineDirection::Receive, &["Decode"]),
            pipeline("snd", PipelineDirection::Send, &["Encode", "Sign"]),
        ]);
        AnalysisContext::new(AnalysisConfig::default(), resources, TargetModel::new(bus))
    }

    fn location(
        name: &str,
        receive: Option<&str>,
        send: Option<&str>,
    ) -> ReceiveLocationDefinition {
        ReceiveLocationDefinition {
            name: name.to_string(),
            adapter: "FILE".to_string(),
            receive_pipeline: receive.map(str::to_string),
            send_pipeline: send.map(str::to_string),
        }
    }

    fn port(two_way: bool, locations: Vec<ReceiveLocationDefinition>) -> ReceivePortDefinition {
        ReceivePortDefinition {
            name: "OrdersIn".to_string(),
            two_way,
            locations,
            inbound_maps: vec!["OrderToCanonical".to_string()],
            outbound_maps: vec![],
        }
    }

    #[test]
    fn test_one_way_location_route() {
        let mut ctx = context();
        let port = port(false, vec![location("Drop", Some("rcv"), None)]);
        build_receive_port_scenarios(&mut ctx, "bus:orders", &port);
        assert!(ctx.diagnostics.is_ok(), "{:?}", ctx.diagnostics.messages());
        assert_eq!(ctx.scenarios.len(), 1);

        // endpoint, decode, transformer, publisher with a router after each
        let route = &ctx.scenarios[0].route;
        assert_eq!(route.len(), 8);
        assert_eq!(route[0], "bus:orders:ordersin:drop:receiveadapter");
        assert_eq!(route[6], "bus:orders:ordersin:drop:messagepublisher");

        let (_, publisher) = ctx.target.find_messaging_object(&route[6]).unwrap();
        assert!(
            publisher
                .as_intermediary()
                .unwrap()
                .output_channel_key_refs
                .contains("bus:systemapplication:messageboxtopic")
        );
        let (_, endpoint) = ctx.target.find_messaging_object(&route[0]).unwrap();
        assert!(endpoint.is_activator());
    }

    #[test]
    fn test_missing_pipeline_skips_only_that_location() {
        let mut ctx = context();
        let port = port(
            false,
            vec![location("Broken", None, None), location("Drop", Some("rcv"), None)],
        );
        build_receive_port_scenarios(&mut ctx, "bus:orders", &port);
        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(ctx.diagnostics.count(ErrorKind::MissingSourceConstruct), 1);
        assert_eq!(ctx.scenarios.len(), 1);
        assert!(
            ctx.target
                .find_messaging_object("bus:orders:ordersin:broken:receiveadapter")
                .is_none()
        );
    }

    #[test]
    fn test_two_way_location_adds_response_route() {
        let mut ctx = context();
        build_receive_port_scenarios(
            &mut ctx,
            "bus:orders",
            &port(true, vec![location("Http", Some("rcv"), Some("snd"))]),
        );
        assert!(ctx.diagnostics.is_ok(), "{:?}", ctx.diagnostics.messages());
        assert_eq!(ctx.scenarios.len(), 2);

        let response = &ctx.scenarios[1];
        assert_eq!(response.name, "OrdersIn.Http Response");
        // subscriber, encode, sign, endpoint with a router after each
        assert_eq!(response.route.len(), 8);
        assert_eq!(response.route[0], "bus:orders:ordersin:http:response:messagesubscriber");
        assert_eq!(response.route[2], "bus:orders:ordersin:http:response:snd:encode");
        assert_eq!(response.route[6], "bus:orders:ordersin:http:receiveadapter");
        assert!(response.route[1].contains(":responserouter:"));

        let (_, topic) = ctx
            .target
            .find_messaging_object("bus:systemapplication:messageboxtopic")
            .unwrap();
        let ChannelKind::Topic { subscriptions } = &topic.as_channel().unwrap().kind else {
            panic!("expected a topic");
        };
        assert_eq!(
            subscriptions[0].filters[0].group.render(),
            "BTS.ReceivePortName = 'OrdersIn' AND EXISTS ( BTS.EpmRRCorrelationToken )"
        );
    }
}
