//! Data models for run reporting
//!
//! Fragments as read from disk, and the aggregated report built from them.

mod fragment;
mod report;

pub use fragment::{RecordError, ResultFragment, TestRecord, TestType};
pub use report::{Report, RunMetadata, SuiteRecord, TestEntry};
