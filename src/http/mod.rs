//! HTTP module for report submission
//!
//! Provides the client that delivers reports to the collection endpoint.

mod client;

pub use client::{ReportClient, SubmitError, SubmitResponse};
