//! Suite and test identity
//!
//! Keys are length-prefixed field concatenations, base64 encoded. Length
//! prefixes keep `("a:b", "c")` and `("a", "b:c")` apart.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

use crate::models::ResultFragment;

/// Identity of one suite execution on one worker
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiteKey(String);

/// Identity of one logical test within a suite execution
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestKey(String);

impl SuiteKey {
    pub fn new(
        worker_id: Option<&str>,
        spec_file: &str,
        capabilities: &serde_json::Value,
        suite_title: &str,
    ) -> Self {
        Self(encode(&suite_fields(
            worker_id,
            spec_file,
            capabilities,
            suite_title,
        )))
    }

    pub fn for_fragment(fragment: &ResultFragment) -> Self {
        Self::new(
            fragment.worker_id.as_deref(),
            &fragment.spec_file,
            &fragment.capabilities,
            &fragment.title,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TestKey {
    pub fn new(
        worker_id: Option<&str>,
        spec_file: &str,
        capabilities: &serde_json::Value,
        suite_title: &str,
        test_title: &str,
    ) -> Self {
        let mut fields = suite_fields(worker_id, spec_file, capabilities, suite_title);
        fields.push(Some(test_title.to_string()));
        Self(encode(&fields))
    }

    pub fn for_test(fragment: &ResultFragment, test_title: &str) -> Self {
        Self::new(
            fragment.worker_id.as_deref(),
            &fragment.spec_file,
            &fragment.capabilities,
            &fragment.title,
            test_title,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SuiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn suite_fields(
    worker_id: Option<&str>,
    spec_file: &str,
    capabilities: &serde_json::Value,
    suite_title: &str,
) -> Vec<Option<String>> {
    // serde_json objects are sorted maps, so this is stable for equal values
    let capabilities = capabilities.to_string();
    vec![
        worker_id.map(str::to_string),
        Some(spec_file.to_string()),
        Some(capabilities),
        Some(suite_title.to_string()),
    ]
}

fn encode(fields: &[Option<String>]) -> String {
    let mut raw = String::new();
    for field in fields {
        match field {
            Some(value) => {
                raw.push_str(&value.len().to_string());
                raw.push(':');
                raw.push_str(value);
            }
            // absent worker id, distinct from an empty one
            None => raw.push('~'),
        }
    }
    STANDARD.encode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_suite_key_is_stable() {
        let caps = json!({ "browserName": "chrome", "platformName": "linux" });
        let a = SuiteKey::new(Some("0-1"), "a.js", &caps, "login");
        let b = SuiteKey::new(Some("0-1"), "a.js", &caps, "login");
        assert_eq!(a, b);
    }

    #[test]
    fn test_capability_key_order_does_not_matter() {
        let a: serde_json::Value =
            serde_json::from_str(r#"{"browserName":"chrome","version":"120"}"#).unwrap();
        let b: serde_json::Value =
            serde_json::from_str(r#"{"version":"120","browserName":"chrome"}"#).unwrap();
        assert_eq!(
            SuiteKey::new(Some("0-0"), "a.js", &a, "s"),
            SuiteKey::new(Some("0-0"), "a.js", &b, "s")
        );
    }

    #[test]
    fn test_workers_are_distinct() {
        let caps = json!({});
        assert_ne!(
            SuiteKey::new(Some("0-0"), "a.js", &caps, "s"),
            SuiteKey::new(Some("0-1"), "a.js", &caps, "s")
        );
        assert_ne!(
            SuiteKey::new(None, "a.js", &caps, "s"),
            SuiteKey::new(Some(""), "a.js", &caps, "s")
        );
    }

    #[test]
    fn test_separator_collisions() {
        let caps = json!(null);
        assert_ne!(
            SuiteKey::new(None, "a:b", &caps, "c"),
            SuiteKey::new(None, "a", &caps, "b:c")
        );
        assert_ne!(
            TestKey::new(None, "a.js", &caps, "suite:x", "y"),
            TestKey::new(None, "a.js", &caps, "suite", "x:y")
        );
    }

    #[test]
    fn test_test_key_differs_from_suite_key() {
        let caps = json!({});
        let suite = SuiteKey::new(Some("0-0"), "a.js", &caps, "s");
        let test = TestKey::new(Some("0-0"), "a.js", &caps, "s", "t");
        assert_ne!(suite.as_str(), test.as_str());
        assert_eq!(test, TestKey::new(Some("0-0"), "a.js", &caps, "s", "t"));
    }
}
