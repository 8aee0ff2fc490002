//! Result fragment discovery and parsing
//!
//! Reads per-worker result files from the reporter output directory.
//! Failures are isolated per file: a bad fragment is reported to the
//! diagnostics sink and the remaining files are still read.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::diagnostics::{DiagnosticsSink, Phase};
use crate::models::ResultFragment;

/// Substring identifying result fragment files
pub const RESULT_FILE_TOKEN: &str = "test-reporter.log";

/// Worker id (`<n>-<m>`) embedded in fragment file names
const WORKER_ID_PATTERN: &str = r"wdio-(\d+-\d+)-test-reporter\.log";

/// Fragment read errors
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Failed to list {}: {}", .path.display(), .source)]
    ListDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {}: {}", .path.display(), .source)]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("No worker id in file name {0}")]
    MissingWorkerId(String),
}

/// What to do with a fragment whose file name carries no worker id
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerIdPolicy {
    /// Report the file and leave it out of the run
    #[default]
    Reject,
    /// Read the file without a worker id
    Anonymous,
}

/// Whether a file name belongs to a result fragment
pub fn is_result_file(file_name: &str) -> bool {
    file_name.contains(RESULT_FILE_TOKEN)
}

/// Extract the worker id from a fragment file name
pub fn worker_id(file_name: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(WORKER_ID_PATTERN).expect("worker id pattern is valid"));

    pattern
        .captures(file_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Reads fragments from one output directory
#[derive(Clone, Debug)]
pub struct FragmentReader {
    dir: PathBuf,
    policy: WorkerIdPolicy,
}

impl FragmentReader {
    /// Create a reader for `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            policy: WorkerIdPolicy::default(),
        }
    }

    /// Set the missing worker id policy
    pub fn with_policy(mut self, policy: WorkerIdPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove everything left over from a previous run, creating the
    /// directory if needed
    pub fn clear(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("Failed to create {}", self.dir.display()))?;
            return Ok(());
        }

        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list {}", self.dir.display()))?
        {
            let path = entry?.path();
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.with_context(|| format!("Failed to remove {}", path.display()))?;
        }

        info!("Cleared reporter output directory {}", self.dir.display());
        Ok(())
    }

    /// Read every fragment in the directory, in listing order
    ///
    /// Only a directory that cannot be listed is an error; per-file failures
    /// go to `diagnostics`.
    pub fn read_all(
        &self,
        diagnostics: &dyn DiagnosticsSink,
    ) -> std::result::Result<Vec<ResultFragment>, ReadError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| ReadError::ListDir {
            path: self.dir.clone(),
            source,
        })?;

        let mut fragments = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    let e = ReadError::ListDir {
                        path: self.dir.clone(),
                        source,
                    };
                    diagnostics.record(Phase::Read, &e.to_string());
                    continue;
                }
            };

            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !is_result_file(&file_name) {
                continue;
            }

            match self.read_fragment(&entry.path(), &file_name) {
                Ok(Some(fragment)) => fragments.push(fragment),
                Ok(None) => debug!("Skipping empty fragment {}", file_name),
                Err(e) => diagnostics.record(Phase::Read, &e.to_string()),
            }
        }

        debug!(
            "Read {} fragments from {}",
            fragments.len(),
            self.dir.display()
        );
        Ok(fragments)
    }

    /// Read one fragment; `None` for an empty file
    pub fn read_fragment(
        &self,
        path: &Path,
        file_name: &str,
    ) -> std::result::Result<Option<ResultFragment>, ReadError> {
        let body = fs::read_to_string(path).map_err(|source| ReadError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        if body.is_empty() {
            return Ok(None);
        }

        let worker = worker_id(file_name);
        if worker.is_none() && self.policy == WorkerIdPolicy::Reject {
            return Err(ReadError::MissingWorkerId(file_name.to_string()));
        }

        let fragment = ResultFragment::from_json(&body, worker).map_err(|source| {
            ReadError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;

        debug!(
            "Loaded fragment '{}' from {}",
            fragment.title,
            path.display()
        );
        Ok(Some(fragment))
    }
}
