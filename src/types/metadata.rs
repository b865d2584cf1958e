use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved metadata key holding the user's notification webhook URL.
pub const WEBHOOK_URL_KEY: &str = "webhook_url";

/// Free-form structured metadata attached to a user.
///
/// Insertion order is preserved, so round-tripping through the store keeps
/// keys stable for clients that diff responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(serde_json::Map<String, Value>);

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow merge: incoming keys overwrite, everything else survives.
    pub fn merge(&mut self, incoming: Metadata) {
        for (key, value) in incoming.0 {
            self.0.insert(key, value);
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: serde_json::Value) -> Metadata {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_merge_overlays_incoming_keys() {
        let mut existing = metadata(json!({"b": 2}));
        existing.merge(metadata(json!({"a": 1})));

        assert_eq!(existing, metadata(json!({"b": 2, "a": 1})));
    }

    #[test]
    fn test_merge_overwrites_on_key_collision() {
        let mut existing = metadata(json!({"role": "user", "plan": "free"}));
        existing.merge(metadata(json!({"role": "admin"})));

        assert_eq!(existing.get("role"), Some(&json!("admin")));
        assert_eq!(existing.get("plan"), Some(&json!("free")));
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut existing = metadata(json!({"nested": {"a": 1, "b": 2}}));
        existing.merge(metadata(json!({"nested": {"a": 9}})));

        // Nested maps are replaced wholesale, not merged.
        assert_eq!(existing.get("nested"), Some(&json!({"a": 9})));
    }

    #[test]
    fn test_merge_empty_incoming_is_noop() {
        let mut existing = metadata(json!({"a": 1}));
        let before = existing.clone();
        existing.merge(Metadata::new());

        assert_eq!(existing, before);
    }

    #[test]
    fn test_insert_and_get() {
        let mut m = Metadata::new();
        assert!(m.is_empty());

        m.insert(WEBHOOK_URL_KEY, json!("https://example.com/hook"));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(WEBHOOK_URL_KEY), Some(&json!("https://example.com/hook")));
    }

    #[test]
    fn test_serialization_preserves_insertion_order() {
        let mut m = Metadata::new();
        m.insert("zebra", json!(1));
        m.insert("apple", json!(2));

        assert_eq!(serde_json::to_string(&m).unwrap(), r#"{"zebra":1,"apple":2}"#);
    }
}
