// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Translation of filter predicates into subscription filter trees.

use conduit_model::source::{Comparison, DnfPredicate};
use conduit_model::target::{Filter, FilterGroup};

use crate::error::AnalysisError;

/// Promoted property holding the message type.
pub const MESSAGE_TYPE_PROPERTY: &str = "BTS.MessageType";

/// Promoted property holding the id of the receive port a message came from.
pub const RECEIVE_PORT_ID_PROPERTY: &str = "BTS.ReceivePortID";

/// Promoted property holding the name of the send port a message is routed to.
pub const SEND_PORT_NAME_PROPERTY: &str = "BTS.SPName";

/// Promoted property holding the name of the receive port a message came from.
pub const RECEIVE_PORT_NAME_PROPERTY: &str = "BTS.ReceivePortName";

/// Context property present on responses to a two-way receive.
pub const RESPONSE_TOKEN_PROPERTY: &str = "BTS.EpmRRCorrelationToken";

/// Context property naming the port operation a message was sent on.
pub const OPERATION_PROPERTY: &str = "BTS.Operation";

/// Context property addressing a message to a running workflow instance.
pub const INSTANCE_ID_PROPERTY: &str = "BTS.InstanceID";

/// Textual form of a comparison operator, `None` for `Exists` and unknowns.
fn operator_symbol(operator: &str) -> Option<&'static str> {
    match operator {
        "Equals" => Some("="),
        "LessThan" => Some("<"),
        "LessThanEqualTo" => Some("<="),
        "GreaterThan" => Some(">"),
        "GreaterThanEqualTo" => Some(">="),
        "NotEquals" => Some("!="),
        _ => None,
    }
}

/// Equality filter on a property.
pub fn equals(property: &str, value: &str) -> Filter {
    Filter::new(format!("{} = '{}'", property, value))
}

/// Existence filter on a property.
pub fn exists(property: &str) -> Filter {
    Filter::new(format!("EXISTS ( {} )", property))
}

/// Render one comparison as a filter expression.
///
/// `Exists` ignores the right-hand value.
pub fn render_comparison(owner: &str, comparison: &Comparison) -> Result<String, AnalysisError> {
    if comparison.operator == "Exists" {
        return Ok(format!("EXISTS ( {} )", comparison.left));
    }
    let symbol = operator_symbol(&comparison.operator).ok_or_else(|| {
        AnalysisError::unsupported(owner, "filter operator", comparison.operator.as_str())
    })?;
    Ok(format!(
        "{} {} '{}'",
        comparison.left,
        symbol,
        comparison.right.as_deref().unwrap_or_default()
    ))
}

/// Translate a DNF predicate into an OR group of AND groups.
///
/// Comparisons with unsupported operators are reported and left out.
pub fn predicate_group(
    owner: &str,
    predicate: &DnfPredicate,
    errors: &mut Vec<AnalysisError>,
) -> FilterGroup {
    let mut any = FilterGroup::or();
    for group in &predicate.groups {
        let mut all = FilterGroup::and();
        for comparison in &group.comparisons {
            match render_comparison(owner, comparison) {
                Ok(expression) => all.filters.push(Filter::new(expression)),
                Err(e) => errors.push(e),
            }
        }
        if !all.is_empty() {
            any.groups.push(all);
        }
    }
    any
}
