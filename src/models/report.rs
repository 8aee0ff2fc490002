//! Aggregated report models
//!
//! The payload submitted to the collection endpoint.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::fragment::{ResultFragment, TestRecord, TestType};

/// One aggregated test occurrence
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TestEntry {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,

    pub duration: u64,

    #[serde(serialize_with = "as_flag")]
    pub passed: bool,

    #[serde(serialize_with = "as_flag")]
    pub failed: bool,

    #[serde(serialize_with = "as_flag")]
    pub skipped: bool,

    pub retries: u32,

    #[serde(rename = "type")]
    pub test_type: TestType,

    /// Every error recorded for this logical test during the run
    pub errors: Vec<serde_json::Value>,
}

impl TestEntry {
    /// Build an entry from a raw record; errors are attached separately
    pub fn from_record(record: &TestRecord) -> Self {
        Self {
            title: record.title.clone(),
            start: record.start,
            duration: record.duration,
            passed: record.passed,
            failed: record.failed,
            skipped: record.skipped,
            retries: record.retries,
            test_type: record.test_type,
            errors: Vec::new(),
        }
    }

    pub fn is_hook(&self) -> bool {
        self.test_type.is_hook()
    }
}

/// One aggregated suite execution
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SuiteRecord {
    pub title: String,
    pub spec_file: String,
    pub capabilities: serde_json::Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,

    pub duration: u64,
    pub retries: u32,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,

    /// Normal tests in encounter order, followed by hooks in encounter order
    pub tests: Vec<TestEntry>,
}

impl SuiteRecord {
    /// Seed a suite record from a fragment's suite metadata
    pub fn from_fragment(fragment: &ResultFragment) -> Self {
        let mut suite = Self {
            title: fragment.title.clone(),
            spec_file: fragment.spec_file.clone(),
            capabilities: fragment.capabilities.clone(),
            start: fragment.start,
            duration: 0,
            retries: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
            tests: Vec::new(),
        };
        suite.refresh_outcome(fragment);
        suite
    }

    /// Take duration, retries and counts from a later attempt of the same suite
    pub fn refresh_outcome(&mut self, fragment: &ResultFragment) {
        self.duration = fragment.duration;
        self.retries = fragment.retries;
        self.passed = fragment.passed;
        self.failed = fragment.failed;
        self.skipped = fragment.skipped;
        if self.start.is_none() {
            self.start = fragment.start;
        }
    }

    /// Same rule as [`ResultFragment::is_failed`]
    pub fn is_failed(&self) -> bool {
        self.failed > 0
    }
}

/// Run-level metadata supplied by configuration and environment
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunMetadata {
    pub project_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_uuid: Option<String>,

    pub title: String,

    /// RFC 3339 start timestamp, millisecond precision
    pub run_date: String,

    /// Run duration in milliseconds
    pub duration: u64,

    pub version: String,
    pub suites_ran: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub flaky: Option<bool>,
}

/// Final run report
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub metadata: RunMetadata,

    #[serde(serialize_with = "as_flag")]
    pub passed: bool,

    #[serde(serialize_with = "as_flag")]
    pub failed: bool,

    pub suites: Vec<SuiteRecord>,
}

impl Report {
    pub fn test_count(&self) -> usize {
        self.suites.iter().map(|s| s.tests.len()).sum()
    }
}

/// The collection endpoint expects `1`/`0` for run and test flags
fn as_flag<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}
