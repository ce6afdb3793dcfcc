// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Insertion-ordered, insert-once property bag.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered mapping of property names to loosely typed values.
///
/// Each key is inserted at most once. Later inserts of an existing key are
/// ignored, which keeps repeated binding passes idempotent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag {
    entries: Vec<(String, Value)>,
}

impl PropertyBag {
    /// Create an empty property bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property if the key is absent.
    ///
    /// Returns `true` when the value was inserted, `false` when the key was
    /// already present (the existing value is kept).
    pub fn insert_once(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, value.into()));
        true
    }

    /// Whether a property with this key exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Get a property value as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Iterate over properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Property names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_once_keeps_first_value() {
        let mut bag = PropertyBag::new();
        assert!(bag.insert_once("Activate", true));
        assert!(!bag.insert_once("Activate", false));
        assert_eq!(bag.get("Activate"), Some(&Value::Bool(true)));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_insertion_order() {
        let mut bag = PropertyBag::new();
        bag.insert_once("b", "2");
        bag.insert_once("a", "1");
        bag.insert_once("c", "3");
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(bag.get_str("a"), Some("1"));
    }
}
