//! Result fragment models
//!
//! A fragment is one worker's on-disk result file. Suite-level fields are
//! parsed eagerly; test records are kept raw so that one malformed record
//! can be skipped without losing the rest of the fragment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of test-like unit reported by the runner
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    /// Lifecycle hook (before/after all/each)
    Hook,
    /// Ordinary test; unknown tags fall back here
    #[default]
    #[serde(other)]
    Test,
}

impl TestType {
    pub fn is_hook(&self) -> bool {
        matches!(self, TestType::Hook)
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestType::Hook => write!(f, "hook"),
            TestType::Test => write!(f, "test"),
        }
    }
}

/// One parsed worker result file
#[derive(Clone, Debug, Deserialize)]
pub struct ResultFragment {
    /// Worker identifier taken from the file name, not the body
    #[serde(skip)]
    pub worker_id: Option<String>,

    /// Suite title
    pub title: String,

    /// Spec file the suite was declared in
    pub spec_file: String,

    /// Capabilities the worker ran with
    #[serde(default)]
    pub capabilities: serde_json::Value,

    /// Suite start time
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,

    /// Suite duration in milliseconds
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: u64,

    /// Retry attempt that produced this fragment
    #[serde(default, deserialize_with = "null_as_default")]
    pub retries: u32,

    #[serde(default, deserialize_with = "count")]
    pub passed: u64,

    #[serde(default, deserialize_with = "count")]
    pub failed: u64,

    #[serde(default, deserialize_with = "count")]
    pub skipped: u64,

    /// Raw test records, validated one at a time
    #[serde(default, deserialize_with = "null_as_default")]
    pub tests: Vec<serde_json::Value>,
}

impl ResultFragment {
    /// Parse a fragment body, attaching the worker id from its file name
    pub fn from_json(body: &str, worker_id: Option<String>) -> serde_json::Result<Self> {
        let mut fragment: Self = serde_json::from_str(body)?;
        fragment.worker_id = worker_id;
        Ok(fragment)
    }

    /// A suite with any failed test is failed, whatever else passed
    pub fn is_failed(&self) -> bool {
        self.failed > 0
    }

    /// Passed outright: at least one passed test and no failures
    pub fn is_passed(&self) -> bool {
        self.passed > 0 && !self.is_failed()
    }

    /// Parse the raw test records in fragment order
    pub fn test_records(&self) -> impl Iterator<Item = Result<TestRecord, RecordError>> + '_ {
        self.tests.iter().enumerate().map(move |(index, raw)| {
            TestRecord::deserialize(raw).map_err(|source| RecordError {
                index,
                suite: self.title.clone(),
                spec_file: self.spec_file.clone(),
                source,
            })
        })
    }
}

/// Raw test record as found inside a fragment
#[derive(Clone, Debug, Deserialize)]
pub struct TestRecord {
    pub title: String,

    #[serde(default)]
    pub start: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: u64,

    #[serde(default, deserialize_with = "flag")]
    pub passed: bool,

    #[serde(default, deserialize_with = "flag")]
    pub failed: bool,

    #[serde(default, deserialize_with = "flag")]
    pub skipped: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub retries: u32,

    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub test_type: TestType,

    /// Errors from this attempt only; message/stack are not interpreted
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<serde_json::Value>,
}

/// A test record that could not be parsed
#[derive(Error, Debug)]
#[error("malformed test record #{index} in suite '{suite}' ({spec_file}): {source}")]
pub struct RecordError {
    pub index: usize,
    pub suite: String,
    pub spec_file: String,
    #[source]
    pub source: serde_json::Error,
}

/// Runners emit either counts or booleans for pass/fail indicators
#[derive(Deserialize)]
#[serde(untagged)]
enum CountOrFlag {
    Count(u64),
    Flag(bool),
}

impl CountOrFlag {
    fn as_count(&self) -> u64 {
        match self {
            CountOrFlag::Count(n) => *n,
            CountOrFlag::Flag(b) => u64::from(*b),
        }
    }
}

fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<CountOrFlag>::deserialize(deserializer)?;
    Ok(value.map(|v| v.as_count()).unwrap_or(0))
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    count(deserializer).map(|n| n > 0)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
