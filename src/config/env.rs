//! Environment variable configuration
//!
//! Run-level metadata the CI job supplies through the environment.

use std::env;

use crate::utils::LogLevel;

/// Environment variable names
pub mod vars {
    pub const RUN_UUID: &str = "RUN_UUID";
    pub const RUN_GROUP_UUID: &str = "RUN_GROUP_UUID";
    pub const RUN_TITLE: &str = "RUN_TITLE";
    pub const APP_VERSION: &str = "APP_VERSION";
    pub const CODE_VERSION: &str = "CODE_VERSION";
    pub const SKIP_PASSED_UPLOADS: &str = "SKIP_PASSED_UPLOADS";
    pub const FLAKY_TEST_HANDLING: &str = "FLAKY_TEST_HANDLING";
    pub const ISSUE_USER: &str = "ISSUE_USER";
    pub const ISSUE_SUMMARY: &str = "ISSUE_SUMMARY";
    pub const LOG_LEVEL: &str = "REPORTER_LOG_LEVEL";
}

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Run UUID from RUN_UUID
    pub run_uuid: Option<String>,
    /// Group UUID for sharded runs from RUN_GROUP_UUID
    pub group_uuid: Option<String>,
    /// Run title from RUN_TITLE
    pub run_title: Option<String>,
    /// Application version from APP_VERSION
    pub app_version: Option<String>,
    /// Generic code version from CODE_VERSION
    pub code_version: Option<String>,
    /// Skip uploading passed suites, from SKIP_PASSED_UPLOADS
    pub skip_passed_uploads: Option<bool>,
    /// Flaky test handling from FLAKY_TEST_HANDLING
    pub flaky_test_handling: Option<bool>,
    /// Issue tracker user from ISSUE_USER
    pub issue_user: Option<String>,
    /// Issue tracker summary from ISSUE_SUMMARY
    pub issue_summary: Option<String>,
    /// Log level from REPORTER_LOG_LEVEL
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // empty values count as unset
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let get_bool = |name: &str| get(name).map(|v| parse_bool(&v));

        Self {
            run_uuid: get(vars::RUN_UUID),
            group_uuid: get(vars::RUN_GROUP_UUID),
            run_title: get(vars::RUN_TITLE),
            app_version: get(vars::APP_VERSION),
            code_version: get(vars::CODE_VERSION),
            skip_passed_uploads: get_bool(vars::SKIP_PASSED_UPLOADS),
            flaky_test_handling: get_bool(vars::FLAKY_TEST_HANDLING),
            issue_user: get(vars::ISSUE_USER),
            issue_summary: get(vars::ISSUE_SUMMARY),
            log_level: get(vars::LOG_LEVEL),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        *self != Self::default()
    }

    pub fn skip_passed(&self) -> bool {
        self.skip_passed_uploads.unwrap_or(false)
    }

    /// First version override set in the environment
    pub fn version(&self) -> Option<&str> {
        self.app_version
            .as_deref()
            .or(self.code_version.as_deref())
    }

    /// Parsed log level, if set and recognised
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level.as_deref().and_then(LogLevel::from_str)
    }
}

/// Parse a boolean environment value
fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    /// Create a new environment builder
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Set an arbitrary variable
    pub fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((name.to_string(), value.into()));
        self
    }

    pub fn run_uuid(self, uuid: impl Into<String>) -> Self {
        self.var(vars::RUN_UUID, uuid)
    }

    pub fn run_title(self, title: impl Into<String>) -> Self {
        self.var(vars::RUN_TITLE, title)
    }

    pub fn code_version(self, version: impl Into<String>) -> Self {
        self.var(vars::CODE_VERSION, version)
    }

    pub fn skip_passed_uploads(self, skip: bool) -> Self {
        self.var(vars::SKIP_PASSED_UPLOADS, skip.to_string())
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}
