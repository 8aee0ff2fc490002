//! Configuration module
//!
//! Launcher options, environment overrides and the host's run configuration.

mod env;
mod run;

pub use env::{vars, EnvBuilder, EnvConfig, EnvGuard};
pub use run::{RunConfig, DEFAULT_VERSION, MULTI_RUN_MARKER};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::results::WorkerIdPolicy;

/// Default collection endpoint
pub const DEFAULT_API_URL: &str = "https://api.testreporter.io";

/// Invalid launcher options; fatal at startup
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No reporterOutputDir specified")]
    MissingOutputDir,

    #[error("No username specified")]
    MissingUsername,

    #[error("No apiToken specified")]
    MissingApiToken,

    #[error("No projectId specified")]
    MissingProjectId,

    #[error("Invalid apiUrl: {0}")]
    InvalidApiUrl(String),

    #[error("timeoutSecs must be greater than 0")]
    InvalidTimeout,
}

/// Options the host passes to the launcher
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherOptions {
    /// Directory workers write their result fragments to
    #[serde(default)]
    pub reporter_output_dir: PathBuf,

    /// Collection endpoint user
    #[serde(default)]
    pub username: String,

    /// Collection endpoint token
    #[serde(default)]
    pub api_token: String,

    /// Project the run is reported under
    #[serde(default)]
    pub project_id: String,

    /// Version reported when the environment sets none
    #[serde(default)]
    pub code_version: Option<String>,

    /// Collection endpoint base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Submission timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Handling of fragments without a worker id in their file name
    #[serde(default)]
    pub worker_id_policy: WorkerIdPolicy,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl LauncherOptions {
    /// Create options with the required fields
    pub fn new(
        reporter_output_dir: impl Into<PathBuf>,
        username: impl Into<String>,
        api_token: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            reporter_output_dir: reporter_output_dir.into(),
            username: username.into(),
            api_token: api_token.into(),
            project_id: project_id.into(),
            code_version: None,
            api_url: default_api_url(),
            timeout_secs: default_timeout(),
            worker_id_policy: WorkerIdPolicy::default(),
        }
    }

    pub fn with_code_version(mut self, version: impl Into<String>) -> Self {
        self.code_version = Some(version.into());
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_worker_id_policy(mut self, policy: WorkerIdPolicy) -> Self {
        self.worker_id_policy = policy;
        self
    }

    /// Load options from a YAML or JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read options file")?;

        let options: Self = if path
            .as_ref()
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            serde_yaml::from_str(&content).context("Failed to parse YAML options")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON options")?
        };

        options.validate()?;
        Ok(options)
    }

    /// Check required options
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.reporter_output_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutputDir);
        }
        if self.username.is_empty() {
            return Err(ConfigError::MissingUsername);
        }
        if self.api_token.is_empty() {
            return Err(ConfigError::MissingApiToken);
        }
        if self.project_id.is_empty() {
            return Err(ConfigError::MissingProjectId);
        }
        if reqwest::Url::parse(&self.api_url).is_err() {
            return Err(ConfigError::InvalidApiUrl(self.api_url.clone()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}
