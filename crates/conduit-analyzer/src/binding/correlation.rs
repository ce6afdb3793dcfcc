// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Binding of correlation variables to the activities that use them.

use tracing::debug;

use conduit_model::workflow::{ActivityKind, WorkflowDefinition};

use crate::context::AnalysisContext;
use crate::error::AnalysisError;

/// A resolved activity reference.
struct ResolvedReference {
    activity_key: String,
    message_name: Option<String>,
    is_send: bool,
    initializes: bool,
}

/// Bind every correlation variable of a definition.
///
/// Each recorded activity reference is resolved by object id. The first
/// initializing reference becomes the initializing activity, the others
/// become followers. Correlation properties are added to every referenced
/// activity's message and promoted on sends.
pub fn bind_correlation_variables(ctx: &mut AnalysisContext, definition: &mut WorkflowDefinition) {
    for variable_key in definition.correlation_variable_keys() {
        bind_variable(ctx, definition, &variable_key);
    }
}

fn bind_variable(
    ctx: &mut AnalysisContext,
    definition: &mut WorkflowDefinition,
    variable_key: &str,
) {
    let Some(binding) = definition
        .find_variable_by_key_mut(variable_key)
        .and_then(|v| v.correlation.clone())
    else {
        return;
    };

    let mut resolved = Vec::new();
    for reference in &binding.activity_refs {
        let Some(activity) = definition.find_activity_by_object_id(&reference.object_id) else {
            ctx.record_error(
                AnalysisError::mismatch(
                    variable_key,
                    format!("referenced activity '{}' does not exist", reference.object_id),
                ),
                None,
            );
            continue;
        };
        resolved.push(ResolvedReference {
            activity_key: activity.key().to_string(),
            message_name: activity.message_name().map(str::to_string),
            is_send: matches!(activity.kind, ActivityKind::Send(_)),
            initializes: reference.initializes,
        });
    }

    let mut initializing = binding.initializing_activity.clone();
    let mut following = binding.following_activities.clone();
    for reference in &resolved {
        if reference.initializes {
            match &initializing {
                None => initializing = Some(reference.activity_key.clone()),
                Some(existing) if *existing == reference.activity_key => {}
                Some(existing) => ctx.record_error(
                    AnalysisError::mismatch(
                        variable_key,
                        format!(
                            "correlation already initialized by '{}', '{}' cannot initialize it",
                            existing, reference.activity_key
                        ),
                    ),
                    None,
                ),
            }
        } else if !following.contains(&reference.activity_key) {
            following.push(reference.activity_key.clone());
        }

        let Some(message_name) = &reference.message_name else {
            continue;
        };
        let message_key = definition
            .resolve_message(&reference.activity_key, message_name)
            .map(|m| m.key().to_string());
        if let Some(message_key) = message_key
            && let Some(message) = definition.find_message_by_key_mut(&message_key)
        {
            message
                .correlation_properties
                .extend(binding.properties.iter().cloned());
        }
        if reference.is_send
            && let Some(exchange) = definition
                .find_activity_mut(&reference.activity_key)
                .and_then(|a| a.message_exchange_mut())
        {
            for property in &binding.properties {
                exchange
                    .promoted_properties
                    .entry(property.clone())
                    .or_default();
            }
        }
    }

    debug!(
        correlation = %variable_key,
        initializing = ?initializing,
        following = following.len(),
        "Correlation bound"
    );
    if let Some(correlation) = definition
        .find_variable_by_key_mut(variable_key)
        .and_then(|v| v.correlation.as_mut())
    {
        correlation.initializing_activity = initializing;
        correlation.following_activities = following;
    }
}
