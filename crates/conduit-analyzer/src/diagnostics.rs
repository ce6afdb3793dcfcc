// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared ordered error list of an analysis run.

use tracing::error;

use crate::error::{AnalysisError, ErrorKind};

/// Errors recorded during analysis, in detection order.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Recorded errors.
    pub errors: Vec<AnalysisError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and append an error.
    pub fn record(&mut self, err: AnalysisError) {
        error!(kind = ?err.kind(), "{}", err);
        self.errors.push(err);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if there are any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors recorded after a mark taken with [`Diagnostics::len`].
    pub fn since(&self, mark: usize) -> &[AnalysisError] {
        self.errors.get(mark..).unwrap_or(&[])
    }

    /// Number of errors of a kind.
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind() == kind).count()
    }

    /// Formatted error messages.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Merge another error list into this one.
    pub fn merge(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
    }
}
