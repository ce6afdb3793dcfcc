// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Subscriptions and filter trees on topic channels.

use serde::{Deserialize, Serialize};

/// Boolean combinator of a filter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterGroupOperation {
    /// All filters and sub-groups must match
    And,
    /// Any filter or sub-group matches
    Or,
}

/// A leaf filter holding a literal expression (`BTS.MessageType = 'x'`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub expression: String,
}

impl Filter {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }
}

/// An AND- or OR-group of filters and nested groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterGroup {
    pub operation: FilterGroupOperation,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<FilterGroup>,
}

impl FilterGroup {
    pub fn and() -> Self {
        Self {
            operation: FilterGroupOperation::And,
            filters: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn or() -> Self {
        Self {
            operation: FilterGroupOperation::Or,
            filters: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_group(mut self, group: FilterGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// A group with no leaves anywhere below it.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.groups.iter().all(FilterGroup::is_empty)
    }

    /// Render the group as a single expression string.
    ///
    /// Nested groups are parenthesized; an empty group renders as an empty
    /// string.
    pub fn render(&self) -> String {
        let joiner = match self.operation {
            FilterGroupOperation::And => " AND ",
            FilterGroupOperation::Or => " OR ",
        };
        let mut parts: Vec<String> = self.filters.iter().map(|f| f.expression.clone()).collect();
        parts.extend(
            self.groups
                .iter()
                .filter(|g| !g.is_empty())
                .map(|g| format!("({})", g.render())),
        );
        parts.join(joiner)
    }
}

/// One filter tree of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFilter {
    pub group: FilterGroup,
}

impl SubscriptionFilter {
    pub fn new(group: FilterGroup) -> Self {
        Self { group }
    }
}

/// A named registration on a topic channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub name: String,

    #[serde(default)]
    pub durable: bool,

    #[serde(default)]
    pub ordered: bool,

    #[serde(default)]
    pub filters: Vec<SubscriptionFilter>,
}

impl Subscription {
    pub fn new(name: impl Into<String>, durable: bool, ordered: bool) -> Self {
        Self {
            name: name.into(),
            durable,
            ordered,
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: SubscriptionFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a filter unless an identical one is already present.
    ///
    /// Returns `true` when added.
    pub fn add_filter(&mut self, filter: SubscriptionFilter) -> bool {
        if self.filters.contains(&filter) {
            return false;
        }
        self.filters.push(filter);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested_groups() {
        let group = FilterGroup::or()
            .with_group(
                FilterGroup::and()
                    .with_filter(Filter::new("A = '1'"))
                    .with_filter(Filter::new("B != '2'")),
            )
            .with_group(FilterGroup::and().with_filter(Filter::new("EXISTS ( C )")))
            .with_group(FilterGroup::and());
        assert_eq!(group.render(), "(A = '1' AND B != '2') OR (EXISTS ( C ))");
        assert!(FilterGroup::or().with_group(FilterGroup::and()).is_empty());
    }

    #[test]
    fn test_add_filter_deduplicates() {
        let filter =
            SubscriptionFilter::new(FilterGroup::and().with_filter(Filter::new("A = '1'")));
        let mut subscription = Subscription::new("sub", true, false);
        assert!(subscription.add_filter(filter.clone()));
        assert!(!subscription.add_filter(filter));
        assert_eq!(subscription.filters.len(), 1);
    }
}
