// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Analysis error types.
//!
//! Every data-driven problem found while analyzing an application is an
//! [`AnalysisError`]. Errors are recorded and analysis continues with the next
//! sibling unit of work; nothing here aborts a run.

use thiserror::Error;

/// Broad category of an analysis error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required source element is absent or unresolved
    MissingSourceConstruct,
    /// An expected target object cannot be found by key
    MissingTargetReference,
    /// Cross-reference data is internally inconsistent
    StructuralMismatch,
    /// A recognized but unhandled variant
    UnsupportedConstruct,
}

/// Errors found while analyzing an application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// A required source construct is not set.
    #[error("[A101] {construct} is not set on '{owner}'")]
    MissingSourceConstruct {
        /// Name of the element lacking the construct
        owner: String,
        /// What is missing
        construct: String,
    },

    /// A reference to another source construct could not be resolved.
    #[error("[A102] '{owner}' references {kind} '{name}' which could not be found")]
    UnresolvedReference {
        /// Name of the referring element
        owner: String,
        /// Kind of the referenced construct
        kind: String,
        /// Referenced name
        name: String,
    },

    /// A target model object expected by key does not exist.
    #[error("[A201] '{owner}' requires target object '{key}' which could not be found")]
    MissingTargetReference {
        /// Key or name of the dependent object
        owner: String,
        /// Missing key
        key: String,
    },

    /// Cross-reference data does not line up.
    #[error("[A301] {message} (in '{owner}')")]
    StructuralMismatch {
        /// Element the inconsistency was found in
        owner: String,
        /// Description
        message: String,
    },

    /// A recognized construct the analyzer cannot convert.
    #[error("[A401] Unsupported {construct} '{value}' in '{owner}'")]
    UnsupportedConstruct {
        /// Element carrying the construct
        owner: String,
        /// What kind of construct
        construct: String,
        /// The offending value
        value: String,
    },

    /// A workflow transitively invokes itself.
    #[error("[A501] Invocation cycle detected: {}", .path.join(" -> "))]
    InvocationCycle {
        /// Process manager keys along the cycle, first repeated last
        path: Vec<String>,
    },

    /// An activating channel targets an object that cannot start a scenario.
    #[error("[A502] '{key}' is the target of an activating channel but is not an activator")]
    NotActivator {
        /// Key of the target object
        key: String,
    },
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::MissingSourceConstruct { .. }
            | AnalysisError::UnresolvedReference { .. } => ErrorKind::MissingSourceConstruct,
            AnalysisError::MissingTargetReference { .. } => ErrorKind::MissingTargetReference,
            AnalysisError::StructuralMismatch { .. }
            | AnalysisError::InvocationCycle { .. }
            | AnalysisError::NotActivator { .. } => ErrorKind::StructuralMismatch,
            AnalysisError::UnsupportedConstruct { .. } => ErrorKind::UnsupportedConstruct,
        }
    }

    pub fn missing(owner: impl Into<String>, construct: impl Into<String>) -> Self {
        AnalysisError::MissingSourceConstruct {
            owner: owner.into(),
            construct: construct.into(),
        }
    }

    pub fn unresolved(
        owner: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        AnalysisError::UnresolvedReference {
            owner: owner.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn missing_target(owner: impl Into<String>, key: impl Into<String>) -> Self {
        AnalysisError::MissingTargetReference {
            owner: owner.into(),
            key: key.into(),
        }
    }

    pub fn mismatch(owner: impl Into<String>, message: impl Into<String>) -> Self {
        AnalysisError::StructuralMismatch {
            owner: owner.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(
        owner: impl Into<String>,
        construct: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        AnalysisError::UnsupportedConstruct {
            owner: owner.into(),
            construct: construct.into(),
            value: value.into(),
        }
    }
}

/// Errors loading or validating an [`AnalysisConfig`](crate::AnalysisConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed
    #[error("failed to parse analysis configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A setting has an invalid value
    #[error("invalid analysis configuration: {0}")]
    Invalid(String),
}
