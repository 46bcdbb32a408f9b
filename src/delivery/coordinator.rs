//! Report delivery over the configured protocol.
//!
//! Synchronous delivery returns the report on the still-open response of
//! the original request. Asynchronous delivery persists the report to a
//! deterministic path under the app's directory and then notifies the
//! caller's reporting endpoint with a fresh outbound request.

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::StatusCode;
use reqwest::multipart;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::report::{Report, VerificationStatus};

/// Connection timeout for the report callback.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall timeout for the report callback.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How a report reaches the original caller. Fixed at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryProtocol {
    /// Report body returned on the original HTTP response.
    #[default]
    Synchronous,
    /// Report persisted to disk, caller notified via a new HTTP request.
    Asynchronous,
}

/// Error type for delivery operations.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    /// The report could not be written to disk; the callback is not
    /// attempted, since it would reference a file that does not exist.
    #[error("Failed to persist report to {path}: {source}")]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The outbound report callback failed.
    #[error("Report callback failed: {0}")]
    Callback(#[from] reqwest::Error),
    /// Asynchronous delivery was requested without a reporting endpoint.
    #[error("No reporting endpoint configured for asynchronous delivery")]
    MissingEndpoint,
}

/// What the coordinator produced for a delivered report.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// Body and status to write on the still-open response.
    Inline { http_status: StatusCode, body: String },
    /// Report persisted and callback dispatched.
    Dispatched { report_path: PathBuf },
}

/// Sends a classified report back to the caller.
#[derive(Debug, Clone)]
pub struct DeliveryCoordinator {
    client: Client,
    endpoint: Option<Url>,
}

impl DeliveryCoordinator {
    /// Create a coordinator. `endpoint` is the caller's reporting URL,
    /// required only for asynchronous delivery.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed, which only
    /// happens when TLS initialization fails at startup.
    #[must_use]
    pub fn new(endpoint: Option<Url>) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self { client, endpoint }
    }

    /// Deliver a report over the given protocol.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Persistence` if the report file cannot be
    /// written, `DeliveryError::MissingEndpoint` if asynchronous delivery
    /// has no endpoint, and `DeliveryError::Callback` if the outbound
    /// notification fails.
    pub async fn deliver(
        &self,
        protocol: DeliveryProtocol,
        app_id: &str,
        report_path: &Path,
        report: &Report,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        match protocol {
            DeliveryProtocol::Synchronous => Ok(DeliveryOutcome::Inline {
                http_status: http_status_for(report.status),
                body: report.body.clone(),
            }),
            DeliveryProtocol::Asynchronous => {
                persist_report(report_path, &report.body).await?;
                self.send_report_callback(app_id, report_path, report)
                    .await?;
                Ok(DeliveryOutcome::Dispatched {
                    report_path: report_path.to_path_buf(),
                })
            }
        }
    }

    /// POST the persisted report to the caller's reporting endpoint,
    /// identifying the app, the report file path and the status name.
    async fn send_report_callback(
        &self,
        app_id: &str,
        report_path: &Path,
        report: &Report,
    ) -> Result<(), DeliveryError> {
        let endpoint = self.endpoint.as_ref().ok_or(DeliveryError::MissingEndpoint)?;

        let file_name = report_path
            .file_name()
            .map_or_else(|| "report".to_string(), |n| n.to_string_lossy().into_owned());
        let form = multipart::Form::new()
            .text("appid", app_id.to_string())
            .text("status", report.status.name())
            .text("filepath", report_path.to_string_lossy().into_owned())
            .part(
                "file",
                multipart::Part::bytes(report.body.clone().into_bytes()).file_name(file_name),
            );

        let response = self
            .client
            .post(endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(app_id, http_status = %status, "Report callback delivered");
        } else {
            tracing::warn!(app_id, http_status = %status, "Report callback rejected");
        }
        Ok(())
    }
}

/// Write the report body to its deterministic path, creating the parent
/// directory as needed.
///
/// # Errors
///
/// Returns `DeliveryError::Persistence` on any I/O failure.
pub async fn persist_report(report_path: &Path, body: &str) -> Result<(), DeliveryError> {
    let persist = |source| DeliveryError::Persistence {
        path: report_path.to_path_buf(),
        source,
    };

    if let Some(parent) = report_path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(&persist)?;
    }
    tokio::fs::write(report_path, body).await.map_err(&persist)?;
    tracing::debug!(path = %report_path.display(), "Report persisted");
    Ok(())
}

/// HTTP status written on an inline response for each verification status.
///
/// Verification outcomes, including unsigned artifacts, are successful
/// tool runs and map to 200; only processing errors map to 500.
#[must_use]
pub fn http_status_for(status: VerificationStatus) -> StatusCode {
    match status {
        VerificationStatus::SignedOk
        | VerificationStatus::Warning
        | VerificationStatus::UnsignedOrMissigned => StatusCode::OK,
        VerificationStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
