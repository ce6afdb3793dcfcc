// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Invocation wiring between process managers.
//!
//! Runs in two passes over the process managers of one application:
//!
//! 1. [`bind_invoked_workflows`] gives every invoked workflow an activator
//!    trigger channel and records who invokes whom in an
//!    [`InvocationGraph`].
//! 2. [`build_process_manager_routes`] walks the graph depth-first from every
//!    entry-point manager and binds the routes around each manager, hopping
//!    through a router into invoked managers.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use conduit_model::key::{child_key, short_name};
use conduit_model::target::{Application, FilterGroup, Intermediary};
use conduit_model::workflow::{
    ActivityKind, ChannelDirection, InvokeWorkflowActivity, WorkflowChannel, WorkflowDefinition,
    WorkflowParameter,
};

use crate::binding::subscription::{INSTANCE_ID_PROPERTY, OPERATION_PROPERTY, equals, exists};
use crate::context::AnalysisContext;
use crate::error::AnalysisError;
use crate::route::{RouteDirection, bind_invocation_hop, bind_route_with_channels, set_output};
use crate::scenario::{Scenario, ScenarioKind, add_publisher, add_subscriber};

// ============================================================================
// Invocation graph
// ============================================================================

/// One invocation of a process manager by another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationEdge {
    /// Key of the trigger channel on the invoking workflow
    pub trigger: String,
    /// Key of the invoked process manager
    pub target: String,
}

/// Who invokes whom, keyed by invoking process manager.
#[derive(Debug, Clone, Default)]
pub struct InvocationGraph {
    edges: HashMap<String, Vec<InvocationEdge>>,
}

impl InvocationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge unless it is already present.
    pub fn add_edge(&mut self, invoker: &str, edge: InvocationEdge) {
        let edges = self.edges.entry(invoker.to_string()).or_default();
        if !edges.contains(&edge) {
            edges.push(edge);
        }
    }

    /// Invocations made by a process manager, in discovery order.
    pub fn invoked_by(&self, invoker: &str) -> &[InvocationEdge] {
        self.edges.get(invoker).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of edges.
    pub fn len(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Pass 1: invoked workflows
// ============================================================================

/// Process manager an invokee resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Invoked {
    Found(String),
    Missing,
    /// Full names of every workflow sharing the invokee's short name
    Ambiguous(Vec<String>),
}

struct PendingInvocation {
    manager: String,
    activity: String,
    invoke: InvokeWorkflowActivity,
    target: Invoked,
}

/// Process manager hosting a workflow.
///
/// An exact full name match wins. Otherwise the short name is used, and only
/// when a single workflow carries it.
fn find_invoked(app: &Application, invokee: &str) -> Invoked {
    if let Some(manager) = app
        .process_managers()
        .find(|m| m.workflow().is_some_and(|d| d.full_name == invokee))
    {
        return Invoked::Found(manager.common.key.clone());
    }
    let candidates: Vec<(&str, &str)> = app
        .process_managers()
        .filter_map(|m| m.workflow().map(|d| (m.common.key.as_str(), d.full_name.as_str())))
        .filter(|(_, full_name)| short_name(full_name) == short_name(invokee))
        .collect();
    match candidates.as_slice() {
        [] => Invoked::Missing,
        [(key, _)] => Invoked::Found(key.to_string()),
        many => Invoked::Ambiguous(many.iter().map(|(_, name)| name.to_string()).collect()),
    }
}

fn collect_invocations(app: &Application) -> Vec<PendingInvocation> {
    let mut pending = Vec::new();
    for manager in app.process_managers() {
        let Some(definition) = manager.workflow() else {
            continue;
        };
        definition.for_each_activity(&mut |activity| {
            if let ActivityKind::InvokeWorkflow(invoke) = &activity.kind {
                pending.push(PendingInvocation {
                    manager: manager.common.key.clone(),
                    activity: activity.key().to_string(),
                    invoke: invoke.clone(),
                    target: find_invoked(app, &invoke.invokee),
                });
            }
        });
    }
    pending
}

/// Give every invoked workflow an activator trigger channel.
///
/// The channel is named after the invokee's short name and receives with a
/// response when the invocation is synchronous. The invoked process manager
/// becomes an activator. Returns the invocation graph of the application.
pub fn bind_invoked_workflows(ctx: &mut AnalysisContext, app_key: &str) -> InvocationGraph {
    let mut graph = InvocationGraph::new();
    let Some(app) = ctx.target.find_application(app_key) else {
        ctx.record_error(AnalysisError::missing_target("invoked workflows", app_key), None);
        return graph;
    };
    let pending = collect_invocations(app);
    info!(application = %app_key, invocations = pending.len(), "Binding invoked workflows");

    for invocation in pending {
        let target = match invocation.target {
            Invoked::Found(target) => target,
            Invoked::Missing => {
                let err = AnalysisError::unresolved(
                    &invocation.activity,
                    "workflow",
                    invocation.invoke.invokee.as_str(),
                );
                ctx.record_error(err, Some(&invocation.manager));
                continue;
            }
            Invoked::Ambiguous(full_names) => {
                let err = AnalysisError::mismatch(
                    &invocation.activity,
                    format!(
                        "workflow '{}' matches several workflows: {}",
                        invocation.invoke.invokee,
                        full_names.join(", ")
                    ),
                );
                ctx.record_error(err, Some(&invocation.manager));
                continue;
            }
        };
        let Some(trigger_key) = invocation.invoke.channel_key.clone() else {
            let err = AnalysisError::missing(&invocation.activity, "trigger channel");
            ctx.record_error(err, Some(&invocation.manager));
            continue;
        };
        let trigger = short_name(&invocation.invoke.invokee).to_string();
        let direction = if invocation.invoke.is_async {
            ChannelDirection::Receive
        } else {
            ChannelDirection::ReceiveResponse
        };
        if let Err(existing) = activate_invoked(
            ctx,
            app_key,
            &target,
            &trigger,
            direction,
            &invocation.invoke.parameters,
        ) {
            let err = AnalysisError::mismatch(
                &invocation.activity,
                format!(
                    "workflow '{}' is activated both as {} and as {}",
                    invocation.invoke.invokee, existing, direction
                ),
            );
            ctx.record_error(err, Some(&invocation.manager));
        }
        debug!(invoker = %invocation.manager, invoked = %target, "Invocation bound");
        let edge = InvocationEdge {
            trigger: trigger_key,
            target,
        };
        graph.add_edge(&invocation.manager, edge);
    }
    graph
}

/// Find or add the activator trigger channel on an invoked workflow.
fn activate_invoked(
    ctx: &mut AnalysisContext,
    app_key: &str,
    target: &str,
    trigger: &str,
    direction: ChannelDirection,
    parameters: &[WorkflowParameter],
) -> Result<(), ChannelDirection> {
    let Some(manager) = ctx
        .target
        .find_application_mut(app_key)
        .and_then(|app| app.intermediary_mut(target))
    else {
        return Ok(());
    };
    manager.activator = true;
    let Some(definition) = manager.workflow_mut() else {
        return Ok(());
    };

    let key = child_key(&child_key(definition.key(), trigger), "activate");
    let index = match definition.channels.iter().position(|c| c.key() == key) {
        Some(index) => index,
        None => {
            let mut channel = WorkflowChannel::trigger(trigger, &key);
            channel.activator = true;
            definition.channels.push(channel);
            definition.channels.len() - 1
        }
    };
    let channel = &mut definition.channels[index];
    if channel.parameters.is_empty() {
        channel.parameters = parameters.to_vec();
    }
    channel.set_direction(direction)
}

// ============================================================================
// Pass 2: process manager routes
// ============================================================================

/// What to bind for one channel of a workflow.
enum ChannelRoute {
    Subscribe { label: String, filter: FilterGroup },
    Publish { label: String },
    Suspend,
    Invoke { trigger: String },
}

fn channel_label(channel: &WorkflowChannel) -> String {
    if channel.operation_name.is_empty() {
        channel.name().to_string()
    } else {
        format!("{}.{}", channel.name(), channel.operation_name)
    }
}

/// Subscriber filter for an inbound channel.
///
/// Uses the channel's own subscription when it has one. Otherwise the
/// channel only receives messages addressed to a running instance.
fn subscriber_filter(channel: &WorkflowChannel) -> FilterGroup {
    let filters = channel
        .subscription
        .as_ref()
        .map(|s| s.filters.as_slice())
        .unwrap_or_default();
    match filters {
        [] => FilterGroup::and()
            .with_filter(exists(INSTANCE_ID_PROPERTY))
            .with_filter(equals(OPERATION_PROPERTY, &channel.operation_name)),
        [single] => single.group.clone(),
        many => many
            .iter()
            .fold(FilterGroup::or(), |any, f| any.with_group(f.group.clone())),
    }
}

fn plan_channels(definition: &WorkflowDefinition) -> Vec<ChannelRoute> {
    definition
        .channels
        .iter()
        .filter_map(|channel| {
            if channel.is_publish_subscribe() {
                return Some(ChannelRoute::Suspend);
            }
            let direction = channel.direction?;
            match (channel.is_trigger(), direction.is_inbound()) {
                // Fed by the invoking manager's hop
                (true, true) => None,
                (true, false) => Some(ChannelRoute::Invoke {
                    trigger: channel.key().to_string(),
                }),
                (false, true) => Some(ChannelRoute::Subscribe {
                    label: channel_label(channel),
                    filter: subscriber_filter(channel),
                }),
                (false, false) => Some(ChannelRoute::Publish {
                    label: channel_label(channel),
                }),
            }
        })
        .collect()
}

/// A manager starts scenarios on its own when an activating channel is not
/// an invocation trigger.
fn is_entry_point(manager: &Intermediary) -> bool {
    manager
        .workflow()
        .is_some_and(|d| d.channels.iter().any(|c| c.activator && !c.is_trigger()))
}

/// Bind the routes of every process manager reachable from an entry point.
pub fn build_process_manager_routes(
    ctx: &mut AnalysisContext,
    app_key: &str,
    graph: &InvocationGraph,
) {
    let Some(app) = ctx.target.find_application(app_key) else {
        let err = AnalysisError::missing_target("process manager routes", app_key);
        ctx.record_error(err, None);
        return;
    };
    let entries: Vec<String> = app
        .process_managers()
        .filter(|m| is_entry_point(m))
        .map(|m| m.common.key.clone())
        .collect();
    info!(application = %app_key, entries = entries.len(), "Building process manager routes");

    let mut visited = HashSet::new();
    for entry in entries {
        let mut path = Vec::new();
        route_manager(ctx, app_key, graph, &entry, &mut path, &mut visited);
    }
}

/// Depth-first route binding.
///
/// `path` holds the managers of the current invocation chain; `visited`
/// holds managers whose routes are complete.
fn route_manager(
    ctx: &mut AnalysisContext,
    app_key: &str,
    graph: &InvocationGraph,
    manager: &str,
    path: &mut Vec<String>,
    visited: &mut HashSet<String>,
) {
    if visited.contains(manager) {
        return;
    }
    let Some((scenario, plan)) = ctx
        .target
        .find_messaging_object(manager)
        .and_then(|(_, object)| object.as_intermediary())
        .and_then(Intermediary::workflow)
        .map(|d| (d.full_name.clone(), plan_channels(d)))
    else {
        return;
    };
    debug!(manager = %manager, channels = plan.len(), "Routing process manager");
    path.push(manager.to_string());

    for item in plan {
        match item {
            ChannelRoute::Subscribe { label, filter } => {
                route_inbound(ctx, app_key, &scenario, manager, &label, filter)
            }
            ChannelRoute::Publish { label } => {
                route_outbound(ctx, app_key, &scenario, manager, &label)
            }
            ChannelRoute::Suspend => route_suspend(ctx, &scenario, manager),
            ChannelRoute::Invoke { trigger } => {
                let edges = graph.invoked_by(manager).iter().filter(|e| e.trigger == trigger);
                for edge in edges {
                    route_invocation(ctx, app_key, graph, &scenario, manager, edge, path, visited);
                }
            }
        }
    }

    path.pop();
    visited.insert(manager.to_string());
}

/// Hop from a manager into the one it invokes, then route the invoked one.
///
/// A target already on `path` closes a cycle: it is reported and not bound.
#[allow(clippy::too_many_arguments)]
fn route_invocation(
    ctx: &mut AnalysisContext,
    app_key: &str,
    graph: &InvocationGraph,
    scenario: &str,
    manager: &str,
    edge: &InvocationEdge,
    path: &mut Vec<String>,
    visited: &mut HashSet<String>,
) {
    if let Some(start) = path.iter().position(|k| *k == edge.target) {
        let mut cycle = path[start..].to_vec();
        cycle.push(edge.target.clone());
        ctx.record_error(AnalysisError::InvocationCycle { path: cycle }, Some(manager));
        return;
    }
    let Some(hop) = bind_invocation_hop(ctx, app_key, scenario, manager, &edge.target) else {
        return;
    };
    let mut route = vec![manager.to_string()];
    route.extend(hop);
    route.push(edge.target.clone());
    ctx.scenarios
        .push(Scenario::new(scenario, ScenarioKind::Orchestration, route));
    route_manager(ctx, app_key, graph, &edge.target, path, visited);
}

fn route_inbound(
    ctx: &mut AnalysisContext,
    app_key: &str,
    scenario: &str,
    manager: &str,
    label: &str,
    filter: FilterGroup,
) {
    let ordered = ctx.config.ordered_subscriptions;
    let step = format!("{} Subscriber", label);
    let Some(subscriber) =
        add_subscriber(ctx, app_key, scenario, manager, &step, filter, ordered)
    else {
        return;
    };
    let steps = [subscriber, manager.to_string()];
    let route = bind_route_with_channels(ctx, app_key, scenario, &steps, RouteDirection::Request);
    ctx.scenarios
        .push(Scenario::new(scenario, ScenarioKind::Orchestration, route));
}

fn route_outbound(
    ctx: &mut AnalysisContext,
    app_key: &str,
    scenario: &str,
    manager: &str,
    label: &str,
) {
    let step = format!("{} Publisher", label);
    let Some(publisher) = add_publisher(ctx, app_key, scenario, manager, &step) else {
        return;
    };
    let steps = [manager.to_string(), publisher];
    let route = bind_route_with_channels(ctx, app_key, scenario, &steps, RouteDirection::Request);
    ctx.scenarios
        .push(Scenario::new(scenario, ScenarioKind::Orchestration, route));
}

fn route_suspend(ctx: &mut AnalysisContext, scenario: &str, manager: &str) {
    let queue = ctx.suspend_queue_key();
    let Some(queue_key) = ctx.require_shared_channel(queue, manager) else {
        return;
    };
    set_output(ctx, manager, &queue_key);
    ctx.scenarios.push(Scenario::new(
        scenario,
        ScenarioKind::Orchestration,
        vec![manager.to_string(), queue_key],
    ));
}
