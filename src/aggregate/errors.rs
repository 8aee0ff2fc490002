//! Error history accumulated across retries

use std::collections::HashMap;

use super::keys::TestKey;

/// Errors per logical test, in the order they were merged
///
/// A retried test shows up once per attempt, each record carrying only that
/// attempt's errors. Merging them here keeps the full history instead of the
/// last attempt's view. One log lives for exactly one aggregation pass.
#[derive(Clone, Debug, Default)]
pub struct ErrorLog {
    entries: HashMap<TestKey, Vec<serde_json::Value>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `errors` to the history for `key`, creating it if absent
    pub fn merge<I>(&mut self, key: &TestKey, errors: I)
    where
        I: IntoIterator<Item = serde_json::Value>,
    {
        self.entries.entry(key.clone()).or_default().extend(errors);
    }

    /// Current history for `key`; empty if never merged
    pub fn errors(&self, key: &TestKey) -> &[serde_json::Value] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &TestKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of tests with a history, including empty ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(title: &str) -> TestKey {
        TestKey::new(Some("0-0"), "a.js", &json!({}), "suite", title)
    }

    #[test]
    fn test_merge_concatenates_in_order() {
        let mut log = ErrorLog::new();
        let k = key("t");

        log.merge(&k, vec![json!("e1"), json!("e2")]);
        log.merge(&k, vec![json!("e3")]);

        assert_eq!(log.errors(&k), &[json!("e1"), json!("e2"), json!("e3")]);
    }

    #[test]
    fn test_empty_merge_creates_history() {
        let mut log = ErrorLog::new();
        let k = key("t");

        log.merge(&k, Vec::new());

        assert!(log.contains(&k));
        assert!(log.errors(&k).is_empty());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut log = ErrorLog::new();
        log.merge(&key("a"), vec![json!("a")]);
        log.merge(&key("b"), vec![json!("b")]);

        assert_eq!(log.errors(&key("a")), &[json!("a")]);
        assert_eq!(log.errors(&key("b")), &[json!("b")]);
        assert!(log.errors(&key("c")).is_empty());
    }
}
