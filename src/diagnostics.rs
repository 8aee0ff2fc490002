//! Failure diagnostics
//!
//! Best-effort recording of isolated failures for later inspection. Nothing
//! here may fail the run: a diagnostic that cannot be written is logged and
//! dropped.

use chrono::{SecondsFormat, Utc};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Phase a diagnostic belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Listing, reading or parsing a fragment file
    Read,
    /// Parsing a single test record inside a fragment
    Record,
    /// Submitting the report
    Submit,
}

impl Phase {
    /// File the phase is written to inside the output directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Phase::Read => "read-error.txt",
            Phase::Record => "record-error.txt",
            Phase::Submit => "post-error.txt",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Read => write!(f, "read"),
            Phase::Record => write!(f, "record"),
            Phase::Submit => write!(f, "submit"),
        }
    }
}

/// Destination for failure text
pub trait DiagnosticsSink {
    fn record(&self, phase: Phase, message: &str);
}

/// Appends diagnostics to per-phase files in a directory
#[derive(Clone, Debug)]
pub struct FileDiagnostics {
    dir: PathBuf,
}

impl FileDiagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path a phase's diagnostics are written to
    pub fn path(&self, phase: Phase) -> PathBuf {
        self.dir.join(phase.file_name())
    }

    fn append(path: &Path, message: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        writeln!(file, "[{stamp}] {message}")
    }
}

impl DiagnosticsSink for FileDiagnostics {
    fn record(&self, phase: Phase, message: &str) {
        warn!("{} error: {}", phase, message);

        let path = self.path(phase);
        if let Err(e) = Self::append(&path, message) {
            warn!("Failed to write diagnostic to {}: {}", path.display(), e);
        }
    }
}

/// Keeps diagnostics in memory
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    entries: Mutex<Vec<(Phase, String)>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Phase, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, phase: Phase) -> usize {
        self.entries().iter().filter(|(p, _)| *p == phase).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl DiagnosticsSink for MemoryDiagnostics {
    fn record(&self, phase: Phase, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((phase, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_diagnostics_append() {
        let dir = TempDir::new().unwrap();
        let sink = FileDiagnostics::new(dir.path());

        sink.record(Phase::Submit, "connection refused");
        sink.record(Phase::Submit, "server said 500");

        let content = std::fs::read_to_string(dir.path().join("post-error.txt")).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("connection refused"));
        assert!(content.contains("server said 500"));
    }

    #[test]
    fn test_file_diagnostics_missing_dir_is_ignored() {
        let dir = TempDir::new().unwrap();
        let sink = FileDiagnostics::new(dir.path().join("gone"));

        sink.record(Phase::Read, "unreadable");

        assert!(!sink.path(Phase::Read).exists());
    }

    #[test]
    fn test_memory_diagnostics() {
        let sink = MemoryDiagnostics::new();
        assert!(sink.is_empty());

        sink.record(Phase::Read, "a");
        sink.record(Phase::Record, "b");
        sink.record(Phase::Read, "c");

        assert_eq!(sink.count(Phase::Read), 2);
        assert_eq!(sink.count(Phase::Record), 1);
        assert_eq!(sink.entries()[1], (Phase::Record, "b".to_string()));
    }

    #[test]
    fn test_phase_file_names() {
        assert_eq!(Phase::Submit.file_name(), "post-error.txt");
        assert_eq!(Phase::Read.to_string(), "read");
    }
}
