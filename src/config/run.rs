//! Host run configuration and run metadata resolution

use serde::{Deserialize, Serialize};

use super::env::EnvConfig;
use super::LauncherOptions;
use crate::models::RunMetadata;
use crate::utils::RunTimer;

/// Reported in place of suite names when suites were picked by repetition
pub const MULTI_RUN_MARKER: &str = "multi-run";

/// Version reported when nothing else sets one
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Run configuration handed over by the host at completion
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    /// Named suite selectors
    #[serde(default)]
    pub suite: Vec<String>,

    /// Repeat count when specs ran in multi-run mode
    #[serde(default)]
    pub multi_run: Option<u32>,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suites<I, S>(mut self, suites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suite = suites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_multi_run(mut self, repeat: u32) -> Self {
        self.multi_run = Some(repeat);
        self
    }

    /// Display string for the suites that ran
    pub fn suites_ran(&self) -> String {
        if self.multi_run.is_some() {
            MULTI_RUN_MARKER.to_string()
        } else {
            self.suite.join(", ")
        }
    }
}

impl RunMetadata {
    /// Resolve run metadata from options, environment and host configuration
    pub fn resolve(
        options: &LauncherOptions,
        env: &EnvConfig,
        run: &RunConfig,
        timer: &RunTimer,
    ) -> Self {
        let run_date = timer.run_date();
        let version = env
            .version()
            .or(options.code_version.as_deref())
            .unwrap_or(DEFAULT_VERSION)
            .to_string();

        Self {
            project_id: options.project_id.clone(),
            uuid: env.run_uuid.clone(),
            group_uuid: env.group_uuid.clone(),
            title: env.run_title.clone().unwrap_or_else(|| run_date.clone()),
            run_date,
            duration: timer.elapsed_ms(),
            version,
            suites_ran: run.suites_ran(),
            issue_user: env.issue_user.clone(),
            issue_summary: env.issue_summary.clone(),
            flaky: env.flaky_test_handling,
        }
    }
}
