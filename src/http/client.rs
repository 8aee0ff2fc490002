//! Report submission client
//!
//! Posts the assembled report to the collection endpoint.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{header, Client};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use crate::config::LauncherOptions;
use crate::models::Report;

/// Submission errors
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection refused to {0}")]
    ConnectionRefused(String),

    #[error("Report rejected with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Response to an accepted submission
#[derive(Clone, Debug)]
pub struct SubmitResponse {
    pub status_code: u16,
    pub body: String,
    pub duration_ms: u64,
}

/// Client for the collection endpoint
#[derive(Clone)]
pub struct ReportClient {
    client: Client,
    base_url: String,
    auth_token: String,
    timeout_secs: u64,
}

impl ReportClient {
    /// Create a client for `base_url` with basic credentials
    pub fn new(
        base_url: impl Into<String>,
        username: &str,
        api_token: &str,
        timeout_secs: u64,
    ) -> Result<Self, SubmitError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SubmitError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            auth_token: Self::auth_token(username, api_token),
            timeout_secs,
        })
    }

    /// Create a client from launcher options
    pub fn from_options(options: &LauncherOptions) -> Result<Self, SubmitError> {
        Self::new(
            options.api_url.clone(),
            &options.username,
            &options.api_token,
            options.timeout_secs,
        )
    }

    /// `username:api_token`, base64 encoded
    pub fn auth_token(username: &str, api_token: &str) -> String {
        STANDARD.encode(format!("{username}:{api_token}"))
    }

    /// Endpoint runs are posted to
    pub fn runs_url(&self) -> String {
        format!("{}/runs", self.base_url.trim_end_matches('/'))
    }

    /// Submit a report
    pub async fn submit(&self, report: &Report) -> Result<SubmitResponse, SubmitError> {
        let url = self.runs_url();
        debug!(
            "Submitting report with {} suites to {}",
            report.suites.len(),
            url
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Basic {}", self.auth_token))
            .json(report)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubmitError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    SubmitError::ConnectionRefused(url.clone())
                } else {
                    SubmitError::RequestFailed(e.to_string())
                }
            })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SubmitError::RequestFailed(e.to_string()))?;

        debug!(
            "Response: {} {} in {}ms",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            duration_ms
        );

        if !status.is_success() {
            return Err(SubmitError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(SubmitResponse {
            status_code: status.as_u16(),
            body,
            duration_ms,
        })
    }
}
