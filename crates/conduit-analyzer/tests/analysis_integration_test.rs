// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! End-to-end analysis of small source applications.
//!
//! Each test builds a resource registry and a target bus, runs every stage
//! and checks the produced messaging objects, routes and diagnostics.

mod common;

use common::*;

use conduit_analyzer::{
    AnalysisConfig, AnalysisContext, AnalysisError, ErrorKind, ScenarioKind, analyze,
};
use conduit_model::source::{PipelineDirection, Resource, ResourceRegistry};
use conduit_model::target::{ChannelKind, ConversionRating};
use conduit_model::workflow::{ChannelDirection, WorkflowChannel};
use conduit_model::{parse_resource_registry, parse_target_model};

const W1_MANAGER: &str = "bus:orders:contoso-w1:processmanager";
const W2_MANAGER: &str = "bus:orders:contoso-w2:processmanager";

/// Register `resources` as children of the `Orders` application.
fn registry(resources: Vec<Resource>) -> ResourceRegistry {
    let children: Vec<&Resource> = resources.iter().collect();
    let app = application(&children);
    let mut all = vec![order_schema(), order_port_type(), app];
    all.extend(resources);
    ResourceRegistry::from(all)
}

fn run(resources: Vec<Resource>) -> AnalysisContext {
    init_tracing();
    analyze(AnalysisConfig::default(), registry(resources), target_model()).unwrap()
}

fn scenarios_of(ctx: &AnalysisContext, kind: ScenarioKind) -> Vec<&Vec<String>> {
    ctx.scenarios
        .iter()
        .filter(|s| s.kind == kind)
        .map(|s| &s.route)
        .collect()
}

fn topic_filters(ctx: &AnalysisContext) -> Vec<String> {
    let (_, topic) = ctx.target.find_messaging_object(MESSAGE_BOX_KEY).unwrap();
    let ChannelKind::Topic { subscriptions } = &topic.as_channel().unwrap().kind else {
        panic!("message box is not a topic");
    };
    subscriptions
        .iter()
        .flat_map(|s| s.filters.iter().map(|f| f.group.render()))
        .collect()
}

// ============================================================================
// Ports
// ============================================================================

#[test]
fn test_missing_pipeline_reports_once_and_routes_sibling() {
    let ctx = run(vec![
        pipeline("rcv", PipelineDirection::Receive, &[("Decode", false)]),
        receive_port("OrdersIn", vec![location("Broken", None), location("Drop", Some("rcv"))]),
    ]);

    assert_eq!(ctx.diagnostics.len(), 1, "{:?}", ctx.diagnostics.messages());
    assert_eq!(ctx.diagnostics.count(ErrorKind::MissingSourceConstruct), 1);
    assert!(ctx.diagnostics.messages()[0].contains("receive pipeline"));

    let routes = scenarios_of(&ctx, ScenarioKind::ReceivePort);
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0][0], "bus:orders:ordersin:drop:receiveadapter");
    assert!(
        ctx.target
            .find_messaging_object("bus:orders:ordersin:broken:receiveadapter")
            .is_none()
    );
}

#[test]
fn test_send_port_subscribes_by_port_name() {
    let ctx = run(vec![
        pipeline("snd", PipelineDirection::Send, &[("Encode", false)]),
        send_port("Shipping", "snd"),
    ]);
    assert!(ctx.diagnostics.is_ok(), "{:?}", ctx.diagnostics.messages());

    let routes = scenarios_of(&ctx, ScenarioKind::SendPort);
    assert_eq!(routes.len(), 1);
    // subscriber, encoder, endpoint with a router after each
    assert_eq!(routes[0].len(), 6);
    assert_eq!(routes[0][4], "bus:orders:shipping:sendadapter");
    assert!(
        topic_filters(&ctx)
            .iter()
            .any(|f| f.contains("BTS.SPName = 'Shipping'"))
    );
}

#[test]
fn test_batch_location_routes_through_interchange_queue() {
    let ctx = run(vec![
        pipeline(
            "batch",
            PipelineDirection::Receive,
            &[("Disassemble", true), ("Validate", false)],
        ),
        receive_port("Batches", vec![location("Drop", Some("batch"))]),
    ]);
    assert!(ctx.diagnostics.is_ok(), "{:?}", ctx.diagnostics.messages());

    let routes = scenarios_of(&ctx, ScenarioKind::ReceivePort);
    assert_eq!(routes.len(), 1);
    let route = routes[0];
    let queue = route
        .iter()
        .position(|k| k == INTERCHANGE_QUEUE_KEY)
        .expect("route passes the interchange queue");
    assert_eq!(route[queue + 1], "bus:orders:batches-drop:aggregator");
    assert_eq!(route[queue + 3], "bus:orders:batches-drop:splitter");
    assert_eq!(route.last().map(|k| k.contains("routingsliprouter")), Some(true));

    let (_, aggregator) = ctx.target.find_messaging_object(&route[queue + 1]).unwrap();
    assert!(aggregator.is_activator());
}

// ============================================================================
// Orchestrations
// ============================================================================

#[test]
fn test_invoked_workflow_is_wired_through_a_router() {
    let ctx = run(vec![
        orchestration("W1", vec![activating_receive(), call("Contoso.W2")]),
        orchestration("W2", vec![]),
    ]);
    assert!(ctx.diagnostics.is_ok(), "{:?}", ctx.diagnostics.messages());

    // W2 is activated by exactly one trigger named after it
    let (_, invoked) = ctx.target.find_messaging_object(W2_MANAGER).unwrap();
    let invoked = invoked.as_intermediary().unwrap();
    assert!(invoked.activator);
    let triggers: Vec<&WorkflowChannel> = invoked
        .workflow()
        .unwrap()
        .channels
        .iter()
        .filter(|c| c.is_trigger() && c.activator)
        .collect();
    assert_eq!(triggers.len(), 1);
    assert_eq!(triggers[0].name(), "W2");
    assert_eq!(triggers[0].direction, Some(ChannelDirection::ReceiveResponse));

    let routes = scenarios_of(&ctx, ScenarioKind::Orchestration);
    assert_eq!(routes.len(), 2);

    // message box subscriber feeding W1
    let inbound = routes[0];
    assert_eq!(inbound.len(), 4);
    assert_eq!(inbound[2], W1_MANAGER);
    assert!(
        topic_filters(&ctx)
            .iter()
            .any(|f| f == "BTS.MessageType = 'http://contoso#Order'")
    );

    // W1, router, channel to router, activator channel, W2
    let hop = routes[1];
    assert_eq!(hop.len(), 5);
    assert_eq!(hop[0], W1_MANAGER);
    assert_eq!(hop[4], W2_MANAGER);
    let (_, channel) = ctx.target.find_messaging_object(&hop[3]).unwrap();
    let channel = channel.as_channel().unwrap();
    assert!(channel.activator);
    assert_eq!(channel.trigger_url(), Some("/routingManager/route/W2"));
}

#[test]
fn test_process_managers_are_partial_conversions() {
    let ctx = run(vec![orchestration("W1", vec![activating_receive()])]);
    let (_, manager) = ctx.target.find_messaging_object(W1_MANAGER).unwrap();
    assert!(manager.is_activator());
    assert_eq!(manager.common().rating, ConversionRating::PartialConversion);
}

#[test]
fn test_invocation_cycle_is_reported_once() {
    let ctx = run(vec![
        orchestration("W1", vec![activating_receive(), call("Contoso.W2")]),
        orchestration("W2", vec![call("Contoso.W1")]),
    ]);

    let cycles: Vec<&AnalysisError> = ctx
        .diagnostics
        .errors
        .iter()
        .filter(|e| matches!(e, AnalysisError::InvocationCycle { .. }))
        .collect();
    assert_eq!(cycles.len(), 1, "{:?}", ctx.diagnostics.messages());
    assert_eq!(
        *cycles[0],
        AnalysisError::InvocationCycle {
            path: vec![
                W1_MANAGER.to_string(),
                W2_MANAGER.to_string(),
                W1_MANAGER.to_string()
            ],
        }
    );

    let (_, invoker) = ctx.target.find_messaging_object(W2_MANAGER).unwrap();
    assert_eq!(invoker.common().report_messages.len(), 1);
}

#[test]
fn test_unresolved_invokee_is_attached_to_manager() {
    let ctx = run(vec![orchestration(
        "W1",
        vec![activating_receive(), call("Contoso.Nowhere")],
    )]);
    assert_eq!(ctx.diagnostics.count(ErrorKind::MissingSourceConstruct), 1);
    let (_, manager) = ctx.target.find_messaging_object(W1_MANAGER).unwrap();
    assert_eq!(manager.common().report_messages.len(), 1);
}

// ============================================================================
// Fixtures
// ============================================================================

#[test]
fn test_analyze_fixture_application() {
    init_tracing();
    let fixture = load_fixture("orders_application.json");
    let resources = parse_resource_registry(&fixture["resources"]).unwrap();
    let target = parse_target_model(&fixture["target"]).unwrap();

    let ctx = analyze(AnalysisConfig::default(), resources, target).unwrap();
    assert!(ctx.diagnostics.is_ok(), "{:?}", ctx.diagnostics.messages());
    assert_eq!(scenarios_of(&ctx, ScenarioKind::ReceivePort).len(), 1);
    assert_eq!(scenarios_of(&ctx, ScenarioKind::SendPort).len(), 1);
    assert_eq!(scenarios_of(&ctx, ScenarioKind::Orchestration).len(), 1);
    assert!(ctx.target.find_messaging_object(W1_MANAGER).is_some());
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let config = AnalysisConfig::default().with_routing_manager_path("routingManager");
    let result = analyze(config, ResourceRegistry::new(), target_model());
    assert!(result.is_err());
}
