//! Run lifecycle
//!
//! `prepare` runs once before any test executes; `complete` runs once after
//! all workers finished, aggregates their fragments and submits the report.

use anyhow::Result;
use tracing::{info, warn};

use crate::aggregate::{aggregate_fragments, ReportAssembler};
use crate::config::{ConfigError, EnvConfig, LauncherOptions, RunConfig};
use crate::diagnostics::{DiagnosticsSink, FileDiagnostics, Phase};
use crate::http::{ReportClient, SubmitError, SubmitResponse};
use crate::models::{Report, RunMetadata};
use crate::results::{FragmentReader, ReadError};
use crate::utils::{init_logger, RunTimer};

/// Host-facing entry point
pub struct Launcher {
    options: LauncherOptions,
    env: EnvConfig,
    reader: FragmentReader,
    diagnostics: FileDiagnostics,
    timer: RunTimer,
}

impl Launcher {
    /// Validate options and read the environment
    pub fn new(options: LauncherOptions) -> std::result::Result<Self, ConfigError> {
        options.validate()?;

        let env = EnvConfig::load();
        if let Some(level) = env.log_level() {
            init_logger(level);
        }

        let reader = FragmentReader::new(&options.reporter_output_dir)
            .with_policy(options.worker_id_policy);
        let diagnostics = FileDiagnostics::new(&options.reporter_output_dir);

        Ok(Self {
            options,
            env,
            reader,
            diagnostics,
            timer: RunTimer::start(),
        })
    }

    /// Replace the environment read at construction
    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.env = env;
        self
    }

    pub fn options(&self) -> &LauncherOptions {
        &self.options
    }

    pub fn env(&self) -> &EnvConfig {
        &self.env
    }

    /// Clear fragments left by a previous run and start the run clock
    pub fn prepare(&mut self) -> Result<()> {
        self.reader.clear()?;
        self.timer = RunTimer::start();
        info!(
            "Prepared run in {} at {}",
            self.reader.dir().display(),
            self.timer.run_date()
        );
        Ok(())
    }

    /// Aggregate the fragments on disk into a report, without submitting it
    pub fn build_report(&self, run: &RunConfig) -> std::result::Result<Report, ReadError> {
        let fragments = self.reader.read_all(&self.diagnostics)?;
        let suites = aggregate_fragments(&fragments, self.env.skip_passed(), &self.diagnostics);
        let metadata = RunMetadata::resolve(&self.options, &self.env, run, &self.timer);

        Ok(ReportAssembler::assemble(metadata, suites))
    }

    /// Aggregate and submit
    ///
    /// Submission failures are written to the diagnostics directory and do
    /// not change the returned report. Only an unreadable output directory
    /// is an error.
    pub async fn complete(&self, run: &RunConfig) -> std::result::Result<Report, ReadError> {
        let report = match self.build_report(run) {
            Ok(report) => report,
            Err(e) => {
                self.diagnostics.record(Phase::Read, &e.to_string());
                return Err(e);
            }
        };

        info!(
            "Assembled report: {} suites, {} tests, {}",
            report.suites.len(),
            report.test_count(),
            if report.failed { "failed" } else { "passed" }
        );

        match self.submit(&report).await {
            Ok(response) => info!(
                "Submitted report ({} in {}ms)",
                response.status_code, response.duration_ms
            ),
            Err(e) => {
                warn!("Report submission failed");
                self.diagnostics.record(Phase::Submit, &e.to_string());
            }
        }

        Ok(report)
    }

    async fn submit(&self, report: &Report) -> std::result::Result<SubmitResponse, SubmitError> {
        ReportClient::from_options(&self.options)?
            .submit(report)
            .await
    }
}
