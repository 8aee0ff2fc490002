//! Suite aggregation
//!
//! Folds fragments into one record per suite execution. Test errors are
//! attached in [`SuiteAggregator::finish`], after every fragment has been
//! merged, so all entries of one logical test carry the same full history.

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::debug;

use super::errors::ErrorLog;
use super::keys::{SuiteKey, TestKey};
use crate::diagnostics::{DiagnosticsSink, Phase};
use crate::models::{ResultFragment, SuiteRecord, TestEntry};

/// Entry waiting for its error history
#[derive(Clone, Debug)]
struct PendingEntry {
    key: TestKey,
    entry: TestEntry,
}

/// Working state for one suite
///
/// Normal tests and hooks are buffered separately; the published test list
/// is rebuilt from both, so hooks contributed by later fragments never
/// duplicate or reorder earlier ones.
#[derive(Clone, Debug)]
struct SuiteBuilder {
    record: SuiteRecord,
    tests: Vec<PendingEntry>,
    hooks: Vec<PendingEntry>,
}

impl SuiteBuilder {
    fn new(fragment: &ResultFragment) -> Self {
        Self {
            record: SuiteRecord::from_fragment(fragment),
            tests: Vec::new(),
            hooks: Vec::new(),
        }
    }

    fn push(&mut self, pending: PendingEntry) {
        if pending.entry.is_hook() {
            self.hooks.push(pending);
        } else {
            self.tests.push(pending);
        }
    }

    fn entries(&self) -> impl Iterator<Item = &PendingEntry> {
        self.tests.iter().chain(self.hooks.iter())
    }

    fn build(&self, errors: &ErrorLog) -> SuiteRecord {
        let mut record = self.record.clone();
        record.tests = self
            .entries()
            .map(|pending| {
                let mut entry = pending.entry.clone();
                entry.errors = errors.errors(&pending.key).to_vec();
                entry
            })
            .collect();
        record
    }
}

/// Aggregation counters, for logging
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub fragments: usize,
    pub skipped_passed: usize,
    pub tests: usize,
    pub malformed_records: usize,
}

/// Merges fragments into suite records
pub struct SuiteAggregator<'a> {
    skip_passed: bool,
    suites: IndexMap<SuiteKey, SuiteBuilder>,
    errors: ErrorLog,
    diagnostics: &'a dyn DiagnosticsSink,
    stats: AggregateStats,
}

impl<'a> SuiteAggregator<'a> {
    /// Create an aggregator with a fresh error log
    pub fn new(diagnostics: &'a dyn DiagnosticsSink) -> Self {
        Self {
            skip_passed: false,
            suites: IndexMap::new(),
            errors: ErrorLog::new(),
            diagnostics,
            stats: AggregateStats::default(),
        }
    }

    /// Drop fragments whose suite passed with no failures
    pub fn skip_passed(mut self, skip: bool) -> Self {
        self.skip_passed = skip;
        self
    }

    /// Fold one fragment in; returns false if it was filtered out
    pub fn add_fragment(&mut self, fragment: &ResultFragment) -> bool {
        if self.skip_passed && fragment.is_passed() {
            debug!(
                "Skipping passed suite '{}' ({})",
                fragment.title, fragment.spec_file
            );
            self.stats.skipped_passed += 1;
            return false;
        }
        self.stats.fragments += 1;

        let suite_key = SuiteKey::for_fragment(fragment);
        let suite = match self.suites.entry(suite_key) {
            Entry::Occupied(entry) => {
                let suite = entry.into_mut();
                suite.record.refresh_outcome(fragment);
                suite
            }
            Entry::Vacant(entry) => entry.insert(SuiteBuilder::new(fragment)),
        };

        for record in fragment.test_records() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    self.stats.malformed_records += 1;
                    self.diagnostics.record(Phase::Record, &e.to_string());
                    continue;
                }
            };

            let key = TestKey::for_test(fragment, &record.title);
            self.errors.merge(&key, record.errors.iter().cloned());
            suite.push(PendingEntry {
                key,
                entry: TestEntry::from_record(&record),
            });
            self.stats.tests += 1;
        }

        true
    }

    pub fn suite_count(&self) -> usize {
        self.suites.len()
    }

    pub fn stats(&self) -> AggregateStats {
        self.stats
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.errors
    }

    /// Current suite records, in first-seen order
    pub fn snapshot(&self) -> Vec<SuiteRecord> {
        self.suites
            .values()
            .map(|suite| suite.build(&self.errors))
            .collect()
    }

    /// Finish the pass, attaching full error histories
    pub fn finish(self) -> Vec<SuiteRecord> {
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ReportAssembler;
    use crate::diagnostics::MemoryDiagnostics;
    use crate::models::RunMetadata;
    use serde_json::json;

    fn fragment(
        worker: &str,
        title: &str,
        passed: u64,
        failed: u64,
        tests: serde_json::Value,
    ) -> ResultFragment {
        let body = json!({
            "title": title,
            "spec_file": format!("/specs/{title}.js"),
            "capabilities": { "browserName": "chrome" },
            "duration": 100,
            "retries": 0,
            "passed": passed,
            "failed": failed,
            "skipped": 0,
            "tests": tests
        })
        .to_string();
        ResultFragment::from_json(&body, Some(worker.to_string())).unwrap()
    }

    #[test]
    fn test_retry_merges_errors() {
        let diagnostics = MemoryDiagnostics::new();
        let mut aggregator = SuiteAggregator::new(&diagnostics);

        let first = fragment(
            "0-0",
            "login",
            0,
            1,
            json!([{ "title": "submits", "failed": 1, "retries": 0, "errors": ["timeout"] }]),
        );
        let mut retry = fragment(
            "0-0",
            "login",
            1,
            0,
            json!([{ "title": "submits", "passed": 1, "retries": 1, "errors": [] }]),
        );
        retry.retries = 1;

        aggregator.add_fragment(&first);
        aggregator.add_fragment(&retry);
        let suites = aggregator.finish();

        assert_eq!(suites.len(), 1);
        let suite = &suites[0];
        assert!(!suite.is_failed());
        assert_eq!(suite.retries, 1);

        let latest = suite.tests.last().unwrap();
        assert_eq!(latest.errors, vec![json!("timeout")]);
        assert!(latest.passed);
        assert_eq!(latest.retries, 1);
        assert!(suite.tests.iter().all(|t| t.errors == vec![json!("timeout")]));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_hooks_follow_tests() {
        let diagnostics = MemoryDiagnostics::new();
        let mut aggregator = SuiteAggregator::new(&diagnostics);

        aggregator.add_fragment(&fragment(
            "0-0",
            "cart",
            1,
            0,
            json!([
                { "title": "before all", "type": "hook" },
                { "title": "adds", "passed": 1 },
                { "title": "after each", "type": "hook" },
                { "title": "removes", "passed": 1 }
            ]),
        ));
        aggregator.add_fragment(&fragment(
            "0-0",
            "cart",
            1,
            0,
            json!([
                { "title": "after all", "type": "hook" },
                { "title": "empties", "passed": 1 }
            ]),
        ));

        let suites = aggregator.finish();
        let titles: Vec<_> = suites[0].tests.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["adds", "removes", "empties", "before all", "after each", "after all"]
        );
    }

    #[test]
    fn test_snapshot_does_not_duplicate_hooks() {
        let diagnostics = MemoryDiagnostics::new();
        let mut aggregator = SuiteAggregator::new(&diagnostics);
        let frag = fragment("0-0", "s", 1, 0, json!([{ "title": "h", "type": "hook" }]));

        aggregator.add_fragment(&frag);
        assert_eq!(aggregator.snapshot()[0].tests.len(), 1);
        assert_eq!(aggregator.snapshot()[0].tests.len(), 1);

        aggregator.add_fragment(&frag);
        assert_eq!(aggregator.finish()[0].tests.len(), 2);
    }

    #[test]
    fn test_workers_produce_separate_suites() {
        let diagnostics = MemoryDiagnostics::new();
        let mut aggregator = SuiteAggregator::new(&diagnostics);

        let tests_a = json!([{ "title": "t", "errors": ["a"] }]);
        let tests_b = json!([{ "title": "t", "errors": ["b"] }]);
        aggregator.add_fragment(&fragment("0-0", "s", 1, 0, tests_a));
        aggregator.add_fragment(&fragment("0-1", "s", 1, 0, tests_b));

        let suites = aggregator.finish();
        assert_eq!(suites.len(), 2);
        assert_eq!(suites[0].tests[0].errors, vec![json!("a")]);
        assert_eq!(suites[1].tests[0].errors, vec![json!("b")]);
    }

    #[test]
    fn test_skip_passed() {
        let diagnostics = MemoryDiagnostics::new();
        let mut aggregator = SuiteAggregator::new(&diagnostics).skip_passed(true);

        assert!(!aggregator.add_fragment(&fragment("0-0", "green", 3, 0, json!([]))));
        assert!(aggregator.add_fragment(&fragment("0-1", "red", 2, 1, json!([]))));

        let stats = aggregator.stats();
        assert_eq!(stats.skipped_passed, 1);
        assert_eq!(stats.fragments, 1);

        let suites = aggregator.finish();
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].title, "red");
    }

    #[test]
    fn test_skip_passed_keeps_partially_failed_suite() {
        let diagnostics = MemoryDiagnostics::new();
        let mut aggregator = SuiteAggregator::new(&diagnostics).skip_passed(true);

        let tests = json!([
            { "title": "adds item", "passed": 1 },
            { "title": "removes item", "passed": 1 },
            { "title": "applies coupon", "failed": 1, "errors": ["bad code"] }
        ]);
        assert!(aggregator.add_fragment(&fragment("0-0", "cart", 2, 1, tests)));

        let suites = aggregator.finish();
        assert_eq!(suites.len(), 1);
        assert!(suites[0].is_failed());
        assert_eq!(suites[0].tests.len(), 3);

        let report = ReportAssembler::assemble(RunMetadata::default(), suites);
        assert!(report.failed);
        assert!(!report.passed);
    }

    #[test]
    fn test_skip_passed_keeps_failed_attempt_before_passing_retry() {
        let diagnostics = MemoryDiagnostics::new();
        let mut aggregator = SuiteAggregator::new(&diagnostics).skip_passed(true);

        let first = fragment(
            "0-0",
            "login",
            0,
            1,
            json!([{ "title": "submits", "failed": 1, "errors": ["timeout"] }]),
        );
        let mut retry = fragment(
            "0-0",
            "login",
            1,
            0,
            json!([{ "title": "submits", "passed": 1, "retries": 1 }]),
        );
        retry.retries = 1;

        assert!(aggregator.add_fragment(&first));
        assert!(!aggregator.add_fragment(&retry));
        assert_eq!(aggregator.stats().skipped_passed, 1);

        let suites = aggregator.finish();
        assert_eq!(suites.len(), 1);

        // The passing retry was filtered before touching the suite
        let suite = &suites[0];
        assert!(suite.is_failed());
        assert_eq!(suite.retries, 0);
        assert_eq!(suite.tests.len(), 1);
        assert!(suite.tests[0].failed);
        assert_eq!(suite.tests[0].errors, vec![json!("timeout")]);

        let report = ReportAssembler::assemble(RunMetadata::default(), suites);
        assert!(report.failed);
    }

    #[test]
    fn test_malformed_record_is_isolated() {
        let diagnostics = MemoryDiagnostics::new();
        let mut aggregator = SuiteAggregator::new(&diagnostics);

        aggregator.add_fragment(&fragment(
            "0-0",
            "s",
            1,
            0,
            json!([{ "title": "ok" }, { "passed": 1 }, { "title": "also ok" }]),
        ));

        assert_eq!(aggregator.stats().malformed_records, 1);
        assert_eq!(diagnostics.count(Phase::Record), 1);

        let suites = aggregator.finish();
        assert_eq!(suites[0].tests.len(), 2);
    }

    #[test]
    fn test_first_seen_order() {
        let diagnostics = MemoryDiagnostics::new();
        let mut aggregator = SuiteAggregator::new(&diagnostics);

        aggregator.add_fragment(&fragment("0-0", "b", 1, 0, json!([])));
        aggregator.add_fragment(&fragment("0-0", "a", 1, 0, json!([])));
        aggregator.add_fragment(&fragment("0-0", "b", 1, 0, json!([])));

        assert_eq!(aggregator.suite_count(), 2);
        let titles: Vec<_> = aggregator.finish().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["b", "a"]);
    }
}
