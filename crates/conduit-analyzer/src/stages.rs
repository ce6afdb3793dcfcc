// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Ordered analysis stages.
//!
//! Each source application is analyzed in stages. A stage may only run after
//! the stages it depends on; the execution order is derived from the declared
//! dependencies.

use std::collections::HashSet;

use tracing::{info, warn};

use conduit_model::source::{RelationshipKind, Resource, ResourceKind};

use crate::context::AnalysisContext;
use crate::error::AnalysisError;
use crate::process::{
    InvocationGraph, bind_invoked_workflows, build_process_manager_routes, build_process_managers,
};
use crate::scenario::{build_receive_port_scenarios, build_send_port_scenarios};

/// One stage of analyzing a source application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisStage {
    /// Receive locations become inbound routes
    ReceivePorts,
    /// Send ports become outbound routes
    SendPorts,
    /// Orchestrations become bound workflows hosted by process managers
    Orchestrations,
    /// Invoked workflows get activating triggers
    InvokedWorkflows,
    /// Routes around process managers and invocation hops
    ProcessManagerRoutes,
}

impl AnalysisStage {
    pub const ALL: [AnalysisStage; 5] = [
        AnalysisStage::ReceivePorts,
        AnalysisStage::SendPorts,
        AnalysisStage::Orchestrations,
        AnalysisStage::InvokedWorkflows,
        AnalysisStage::ProcessManagerRoutes,
    ];

    /// Stages that must have run before this one.
    ///
    /// Port subscriptions are attached to the message box before workflow
    /// subscriptions, and invocation wiring needs every process manager.
    pub fn depends_on(&self) -> &'static [AnalysisStage] {
        match self {
            AnalysisStage::ReceivePorts => &[],
            AnalysisStage::SendPorts => &[AnalysisStage::ReceivePorts],
            AnalysisStage::Orchestrations => &[AnalysisStage::SendPorts],
            AnalysisStage::InvokedWorkflows => &[AnalysisStage::Orchestrations],
            AnalysisStage::ProcessManagerRoutes => &[AnalysisStage::InvokedWorkflows],
        }
    }

    /// Every stage ordered after its dependencies.
    pub fn execution_order() -> Vec<AnalysisStage> {
        let mut order = Vec::with_capacity(Self::ALL.len());
        let mut visited = HashSet::new();
        for stage in Self::ALL {
            stage.visit(&mut visited, &mut order);
        }
        order
    }

    fn visit(self, visited: &mut HashSet<AnalysisStage>, order: &mut Vec<AnalysisStage>) {
        if !visited.insert(self) {
            return;
        }
        for dependency in self.depends_on() {
            dependency.visit(visited, order);
        }
        order.push(self);
    }
}

/// Runs every stage for every source application.
#[derive(Debug, Clone)]
pub struct Analyzer {
    stages: Vec<AnalysisStage>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            stages: AnalysisStage::execution_order(),
        }
    }

    pub fn stages(&self) -> &[AnalysisStage] {
        &self.stages
    }

    /// Analyze every application resource of the registry.
    ///
    /// An application without a counterpart in the target model is reported
    /// and skipped.
    pub fn run(&self, ctx: &mut AnalysisContext) {
        let applications: Vec<(String, String)> = ctx
            .resources
            .find_resources_by_type(ResourceKind::Application)
            .map(|r| {
                let name = r.as_application().map(|a| a.name.clone());
                (r.key.clone(), name.unwrap_or_else(|| r.name.clone()))
            })
            .collect();
        info!(applications = applications.len(), "Starting analysis");

        for (resource_key, name) in applications {
            let expected = ctx.target_application_key(&name);
            let Some(app_key) = expected
                .clone()
                .filter(|key| ctx.target.find_application(key).is_some())
            else {
                warn!(application = %name, "No target application");
                let key = expected.unwrap_or_else(|| name.clone());
                ctx.record_error(AnalysisError::missing_target(&name, key), None);
                continue;
            };
            self.run_application(ctx, &resource_key, &app_key);
        }

        info!(
            errors = ctx.diagnostics.len(),
            scenarios = ctx.scenarios.len(),
            "Analysis finished"
        );
    }

    fn run_application(&self, ctx: &mut AnalysisContext, resource_key: &str, app_key: &str) {
        let mut graph = InvocationGraph::new();
        for stage in &self.stages {
            info!(application = %app_key, stage = ?stage, "Running analysis stage");
            match stage {
                AnalysisStage::ReceivePorts => {
                    let kind = ResourceKind::ReceivePort;
                    for port in related(ctx, resource_key, kind, Resource::as_receive_port) {
                        build_receive_port_scenarios(ctx, app_key, &port);
                    }
                }
                AnalysisStage::SendPorts => {
                    let kind = ResourceKind::SendPort;
                    for port in related(ctx, resource_key, kind, Resource::as_send_port) {
                        build_send_port_scenarios(ctx, app_key, &port);
                    }
                }
                AnalysisStage::Orchestrations => {
                    let orchestrations = related(
                        ctx,
                        resource_key,
                        ResourceKind::Orchestration,
                        Resource::as_orchestration,
                    );
                    build_process_managers(ctx, app_key, &orchestrations);
                }
                AnalysisStage::InvokedWorkflows => {
                    graph = bind_invoked_workflows(ctx, app_key);
                }
                AnalysisStage::ProcessManagerRoutes => {
                    build_process_manager_routes(ctx, app_key, &graph);
                }
            }
        }
    }
}

/// Typed children of an application resource, cloned out of the registry.
fn related<T: Clone>(
    ctx: &AnalysisContext,
    resource_key: &str,
    kind: ResourceKind,
    select: impl Fn(&Resource) -> Option<&T>,
) -> Vec<T> {
    let Some(resource) = ctx.resources.find_resource_by_key(resource_key) else {
        return Vec::new();
    };
    ctx.resources
        .find_related_resources_by_type(resource, RelationshipKind::Child, kind)
        .into_iter()
        .filter_map(select)
        .cloned()
        .collect()
}
