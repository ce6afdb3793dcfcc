// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Key formatting utilities.
//!
//! Workflow objects use hierarchical dotted keys (`parent.child`), produced
//! messaging objects use colon separated keys
//! (`<messageBus>:<application>:<scenario>:<leaf>`). Both are built from
//! slug-formatted segments.

/// Separator between segments of a workflow object key.
pub const WORKFLOW_KEY_SEPARATOR: char = '.';

/// Separator between segments of a messaging object key.
pub const MESSAGING_KEY_SEPARATOR: char = ':';

/// Format a name into a key segment.
///
/// Lower-cases ASCII letters, keeps digits, and collapses every run of other
/// characters into a single `-`. Leading and trailing separators are trimmed.
pub fn format_key(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !result.is_empty() {
                result.push('-');
            }
            pending_dash = false;
            result.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if result.is_empty() {
        result.push_str("unnamed");
    }
    result
}

/// Append a formatted segment to a workflow object key.
pub fn child_key(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        return format_key(segment);
    }
    format!("{}{}{}", parent, WORKFLOW_KEY_SEPARATOR, format_key(segment))
}

/// Join already formatted segments into a messaging object key.
pub fn join_key(parts: &[&str]) -> String {
    let mut key = String::new();
    for part in parts.iter().filter(|p| !p.is_empty()) {
        if !key.is_empty() {
            key.push(MESSAGING_KEY_SEPARATOR);
        }
        key.push_str(part);
    }
    key
}

/// Extend a messaging object key with one formatted segment.
pub fn extend_key(parent: &str, segment: &str) -> String {
    join_key(&[parent, &format_key(segment)])
}

/// Return the last segment of a dotted, fully-qualified type name.
///
/// `"Contoso.Orchestrations.ProcessOrder"` becomes `"ProcessOrder"`.
pub fn short_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_key() {
        assert_eq!(format_key("hello"), "hello");
        assert_eq!(format_key("Receive Order"), "receive-order");
        assert_eq!(format_key("Port_1.Operation"), "port-1-operation");
        assert_eq!(format_key("  --Trim--  "), "trim");
        assert_eq!(format_key(""), "unnamed");
        assert_eq!(format_key("***"), "unnamed");
    }

    #[test]
    fn test_child_key() {
        assert_eq!(child_key("", "Order Process"), "order-process");
        assert_eq!(child_key("order-process", "Receive 1"), "order-process.receive-1");
    }

    #[test]
    fn test_join_key() {
        assert_eq!(join_key(&["bus", "app", "", "endpoint"]), "bus:app:endpoint");
        assert_eq!(extend_key("bus:app", "Receive Port"), "bus:app:receive-port");
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("Contoso.Orchestrations.ProcessOrder"), "ProcessOrder");
        assert_eq!(short_name("ProcessOrder"), "ProcessOrder");
    }
}
