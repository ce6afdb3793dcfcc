// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Process managers.
//!
//! Every orchestration is built into a workflow definition, bound and hosted
//! by one process manager intermediary. Invocations between process managers
//! are wired in [`invocation`].

pub mod invocation;

pub use invocation::{
    InvocationEdge, InvocationGraph, bind_invoked_workflows, build_process_manager_routes,
};

use tracing::info;

use conduit_model::key::{format_key, join_key};
use conduit_model::source::OrchestrationDefinition;
use conduit_model::target::{
    ConversionRating, Intermediary, IntermediaryKind, MessagingObjectCommon,
};
use conduit_model::workflow::WorkflowDefinition;

use crate::binding::bind_workflow;
use crate::context::AnalysisContext;
use crate::error::AnalysisError;
use crate::walker::build_workflow_model;

/// Key of the process manager hosting a workflow.
pub fn process_manager_key(app_key: &str, definition: &WorkflowDefinition) -> String {
    join_key(&[app_key, &format_key(definition.key()), "processmanager"])
}

/// Host a workflow definition in a new process manager.
///
/// The manager is an activator when any channel of the workflow is. Its
/// rating is always partial conversion since workflow logic is carried over
/// for review. Returns the key, or `None` when the application is missing or
/// another workflow already owns the key.
pub fn create_process_manager(
    ctx: &mut AnalysisContext,
    app_key: &str,
    definition: WorkflowDefinition,
) -> Option<String> {
    let key = process_manager_key(app_key, &definition);
    if ctx.target.find_messaging_object(&key).is_some() {
        let err = AnalysisError::mismatch(
            &definition.full_name,
            format!("process manager '{}' is already hosting another workflow", key),
        );
        ctx.record_error(err, None);
        return None;
    }
    let common = MessagingObjectCommon::new(&key, definition.name())
        .with_description(format!("Hosts workflow '{}'", definition.full_name))
        .with_rating(ConversionRating::PartialConversion)
        .with_scenario(&definition.full_name, definition.name());
    let activator = definition.is_activator();
    let manager = Intermediary::new(common, IntermediaryKind::ProcessManager(Box::new(definition)))
        .with_activator(activator);

    let key = ctx.add_intermediary(app_key, manager)?;
    let help_link = ctx.config.help_links.process_manager.clone();
    ctx.add_help_link(&key, help_link);
    Some(key)
}

/// Build, bind and host every orchestration of an application.
///
/// Errors found while building one orchestration are attached to its process
/// manager. Returns the keys of the created managers.
pub fn build_process_managers(
    ctx: &mut AnalysisContext,
    app_key: &str,
    orchestrations: &[OrchestrationDefinition],
) -> Vec<String> {
    let mut keys = Vec::with_capacity(orchestrations.len());
    for orchestration in orchestrations {
        let mark = ctx.diagnostics.len();
        let mut definition = build_workflow_model(ctx, orchestration);
        bind_workflow(ctx, &mut definition);
        let Some(key) = create_process_manager(ctx, app_key, definition) else {
            continue;
        };
        ctx.attach_errors_since(mark, &key);
        info!(workflow = %orchestration.full_name, key = %key, "Process manager created");
        keys.push(key);
    }
    keys
}
