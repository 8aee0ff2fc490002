//! Run timing
//!
//! Wall-clock start for reporting, monotonic clock for duration.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::{Duration, Instant};

/// Clock started when a run is prepared
#[derive(Clone, Copy, Debug)]
pub struct RunTimer {
    started_at: DateTime<Utc>,
    start: Instant,
}

impl RunTimer {
    /// Create and start a new timer
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    /// Wall-clock start time
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Start time as RFC 3339 with millisecond precision
    pub fn run_date(&self) -> String {
        self.started_at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }
}

impl Default for RunTimer {
    fn default() -> Self {
        Self::start()
    }
}
