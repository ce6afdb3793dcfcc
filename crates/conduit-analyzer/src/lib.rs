// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Conduit Analyzer - Integration Application Analysis
//!
//! This crate turns a parsed integration application into a messaging target
//! model. Orchestrations become typed workflows hosted by process managers,
//! ports become routing-slip routes, and everything is wired together through
//! trigger channels and message box subscriptions.
//!
//! # Analysis Pipeline
//!
//! ```text
//!     ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//!     │  Resource   │      │  Workflow   │      │   Target    │
//!     │  Registry   │─────▶│ Definitions │─────▶│   Model     │
//!     │  (source)   │      │  (bound)    │      │  (routes)   │
//!     └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! 1. **Ports**: receive locations and send ports become routes
//! 2. **Orchestrations**: element trees are walked into workflow definitions,
//!    activities are bound to channels and correlation sets
//! 3. **Invocations**: invoked workflows get activating triggers
//! 4. **Process manager routes**: subscribers, publishers and invocation hops
//!
//! Problems in the source are recorded in [`Diagnostics`] and attached to the
//! produced objects; analysis always runs to the end.
//!
//! # Usage
//!
//! ```ignore
//! use conduit_analyzer::{AnalysisConfig, analyze};
//!
//! let ctx = analyze(AnalysisConfig::default(), resources, target)?;
//! for message in ctx.diagnostics.messages() {
//!     println!("{}", message);
//! }
//! ```
//!
//! # Modules
//!
//! - [`walker`]: element tree to workflow definition
//! - [`binding`]: channel, correlation and subscription binding
//! - [`route`]: routing-slip routes and invocation hops
//! - [`scenario`]: receive and send port scenarios
//! - [`process`]: process managers and invocation wiring
//! - [`stages`]: ordered analysis stages

pub mod binding;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod process;
pub mod route;
pub mod scenario;
pub mod stages;
pub mod walker;

pub use config::{AnalysisConfig, HelpLinks};
pub use context::AnalysisContext;
pub use diagnostics::Diagnostics;
pub use error::{AnalysisError, ConfigError, ErrorKind};
pub use scenario::{Scenario, ScenarioKind};
pub use stages::{AnalysisStage, Analyzer};

use conduit_model::source::ResourceRegistry;
use conduit_model::target::TargetModel;

/// Analyze a source application into a target model.
///
/// The configuration is validated first. Analysis errors do not fail the
/// call; they are collected in the returned context's diagnostics.
pub fn analyze(
    config: AnalysisConfig,
    resources: ResourceRegistry,
    target: TargetModel,
) -> Result<AnalysisContext, ConfigError> {
    config.validate()?;
    let mut ctx = AnalysisContext::new(config, resources, target);
    Analyzer::new().run(&mut ctx);
    Ok(ctx)
}
