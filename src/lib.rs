//! Run Reporter - merges distributed test results into one run report
//!
//! Parallel test workers each write result fragments into a shared output
//! directory. Once the run finishes, the fragments are merged into one
//! report per run and submitted to the collection endpoint.
//!
//! ## Features
//!
//! - Per-worker suite identity, so parallel workers never overwrite each other
//! - Error history merged across retries of the same test
//! - Hooks reported after the tests of their suite
//! - Run-level pass/fail rolled up from suite outcomes
//! - Corrupt or unreadable fragments isolated and recorded, never fatal
//!
//! ## Usage
//!
//! ```no_run
//! use run_reporter::{Launcher, LauncherOptions, RunConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let options = LauncherOptions::new("./reports", "ci-user", "api-token", "42");
//! let mut launcher = Launcher::new(options)?;
//!
//! launcher.prepare()?;
//! // ... workers run and write wdio-<n>-<m>-test-reporter.log files ...
//! let report = launcher
//!     .complete(&RunConfig::new().with_suites(["smoke"]))
//!     .await?;
//! println!("{} suites, failed: {}", report.suites.len(), report.failed);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod diagnostics;
pub mod http;
pub mod launcher;
pub mod models;
pub mod results;
pub mod utils;

pub use aggregate::{
    aggregate_fragments, ErrorLog, ReportAssembler, RunOutcome, SuiteAggregator, SuiteKey, TestKey,
};
pub use config::{ConfigError, EnvConfig, LauncherOptions, RunConfig};
pub use diagnostics::{DiagnosticsSink, FileDiagnostics, MemoryDiagnostics, Phase};
pub use http::{ReportClient, SubmitError};
pub use launcher::Launcher;
pub use models::{Report, ResultFragment, RunMetadata, SuiteRecord, TestEntry};
pub use results::{FragmentReader, ReadError, WorkerIdPolicy};
