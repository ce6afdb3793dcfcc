// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Workflow binding passes.
//!
//! - `channels`: receive, send, invoke and suspend activities to channels
//! - `correlation`: correlation variables to their activities and messages
//! - `subscription`: filter predicate translation

pub mod channels;
pub mod correlation;
pub mod subscription;

pub use channels::bind_channels;
pub use correlation::bind_correlation_variables;

use conduit_model::workflow::WorkflowDefinition;

use crate::context::AnalysisContext;

/// Run both binding passes on a freshly built definition.
///
/// Channels are bound first so that messages are classified before
/// correlation properties are added to them.
pub fn bind_workflow(ctx: &mut AnalysisContext, definition: &mut WorkflowDefinition) {
    bind_channels(ctx, definition);
    bind_correlation_variables(ctx, definition);
}
