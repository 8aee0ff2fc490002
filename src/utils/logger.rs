//! Subscriber setup for hosts that embed the reporter
//!
//! The reporter only installs a subscriber when `REPORTER_LOG_LEVEL` is set,
//! and never replaces one the host already installed. Its filter covers the
//! `run_reporter` target alone, so host crates keep their own verbosity.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Verbosity accepted from `REPORTER_LOG_LEVEL`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Filter directive scoped to this crate's target
pub fn filter_directive(level: LogLevel) -> String {
    format!("{}={}", env!("CARGO_CRATE_NAME"), level.to_tracing_level())
}

/// Install a compact subscriber for the reporter's own events
///
/// Does nothing if a global subscriber is already installed.
pub fn init_logger(level: LogLevel) {
    let filter = EnvFilter::new(filter_directive(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
