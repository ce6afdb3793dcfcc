// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Disjunctive-normal-form predicates.
//!
//! Used by activatable receives and by send port filters: an OR of
//! AND-groups of comparisons.

use serde::{Deserialize, Serialize};

/// A single comparison (`left operator right`).
///
/// The operator is kept as written in the source (`Equals`, `Exists`, ...);
/// unsupported operators are detected when the predicate is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub left: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
}

impl Comparison {
    pub fn new(left: impl Into<String>, operator: impl Into<String>, right: Option<&str>) -> Self {
        Self {
            left: left.into(),
            operator: operator.into(),
            right: right.map(str::to_string),
        }
    }
}

/// An AND-group of comparisons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateGroup {
    #[serde(default)]
    pub comparisons: Vec<Comparison>,
}

/// An OR of AND-groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnfPredicate {
    #[serde(default)]
    pub groups: Vec<PredicateGroup>,
}

impl DnfPredicate {
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.comparisons.is_empty())
    }
}
