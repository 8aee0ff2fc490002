//! Aggregation engine
//!
//! Merges per-worker result fragments into suite records and rolls them up
//! into a run report. Everything here is synchronous and performs no I/O;
//! each pass owns its own state.

mod errors;
mod keys;
mod rollup;
mod suite;

pub use errors::ErrorLog;
pub use keys::{SuiteKey, TestKey};
pub use rollup::{ReportAssembler, RunOutcome};
pub use suite::{AggregateStats, SuiteAggregator};

use tracing::debug;

use crate::diagnostics::DiagnosticsSink;
use crate::models::{ResultFragment, SuiteRecord};

/// Run one aggregation pass over `fragments`, in order
pub fn aggregate_fragments(
    fragments: &[ResultFragment],
    skip_passed: bool,
    diagnostics: &dyn DiagnosticsSink,
) -> Vec<SuiteRecord> {
    let mut aggregator = SuiteAggregator::new(diagnostics).skip_passed(skip_passed);
    for fragment in fragments {
        aggregator.add_fragment(fragment);
    }

    let stats = aggregator.stats();
    debug!(
        "Aggregated {} fragments into {} suites ({} tests, {} skipped as passed, {} malformed)",
        stats.fragments,
        aggregator.suite_count(),
        stats.tests,
        stats.skipped_passed,
        stats.malformed_records
    );

    aggregator.finish()
}
