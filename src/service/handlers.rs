//! HTTP handlers for the verification endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::context::RequestContext;
use super::error::ServiceError;
use crate::config::BridgeConfig;
use crate::delivery::{
    DeliveryCoordinator, DeliveryOutcome, DeliveryProtocol, DeliveryState, DeliveryTracker,
};
use crate::exec::{CommandTemplate, ProcessSupervisor};
use crate::logs;
use crate::report::{ReportClassifier, ReportFormat, ReportRenderer, VerificationStatus};

/// Artifact extension accepted by the upload endpoint.
const ARTIFACT_EXTENSION: &str = ".apk";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BridgeConfig>,
    pub template: CommandTemplate,
    pub supervisor: ProcessSupervisor,
    pub classifier: ReportClassifier,
    pub renderer: ReportRenderer,
    pub coordinator: DeliveryCoordinator,
}

/// GET /healthz - service liveness and configuration summary.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "sigbridge",
        version: env!("CARGO_PKG_VERSION"),
        tool: state.config.tool_name.clone(),
        protocol: state.config.protocol,
    })
}

/// Health endpoint payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub tool: String,
    pub protocol: DeliveryProtocol,
}

/// POST /verify - accept an artifact upload and run verification.
///
/// Synchronous protocol: the report is written on this response.
/// Asynchronous protocol: a 202 acknowledgement is returned immediately
/// and the verification pipeline runs in a background task, reporting
/// back through the configured endpoint.
pub async fn post_verify(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match parse_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected upload");
            return e.into_response();
        }
    };

    let ctx = RequestContext::new(
        &state.config.apps_dir,
        &upload.app_id,
        &upload.file_name,
        state.config.report_format,
    );
    tracing::debug!(app_id = %ctx.app_id, path = %ctx.artifact_path.display(), "Saving artifact");
    if let Err(e) = save_artifact(&ctx, &upload.data).await {
        tracing::error!(app_id = %ctx.app_id, error = %e, "Failed to save artifact");
        return e.into_response();
    }

    let mut tracker = DeliveryTracker::new();
    match state.config.protocol {
        DeliveryProtocol::Asynchronous => {
            // The acknowledgement must reach the caller before the tool
            // runs; the run may outlive the caller's read timeout.
            tracker.transition(DeliveryState::AckSent);
            let ack = format!("Received app {} for processing.", ctx.app_id);
            tokio::spawn(async move {
                if let Err(e) = run_verification(&state, &ctx, &mut tracker).await {
                    tracker.transition(DeliveryState::DeliveryFailed);
                    tracing::error!(app_id = %ctx.app_id, error = %e, "Asynchronous delivery failed");
                }
            });
            (StatusCode::ACCEPTED, ack).into_response()
        }
        DeliveryProtocol::Synchronous => match run_verification(&state, &ctx, &mut tracker).await {
            Ok(DeliveryOutcome::Inline { http_status, body }) => {
                let content_type = match state.config.report_format {
                    ReportFormat::Html => "text/html; charset=utf-8",
                    _ => "text/plain; charset=utf-8",
                };
                (http_status, [(header::CONTENT_TYPE, content_type)], body).into_response()
            }
            Ok(DeliveryOutcome::Dispatched { .. }) => {
                // The coordinator only dispatches under the asynchronous
                // protocol.
                tracing::error!(app_id = %ctx.app_id, "Dispatched outcome on a synchronous request");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Err(e) => {
                tracker.transition(DeliveryState::DeliveryFailed);
                tracing::error!(app_id = %ctx.app_id, error = %e, "Synchronous delivery failed");
                e.into_response()
            }
        },
    }
}

/// A parsed and validated artifact upload.
#[derive(Debug)]
struct Upload {
    app_id: String,
    file_name: String,
    data: Bytes,
}

/// Extract the app ID and file from the multipart body.
async fn parse_upload(mut multipart: Multipart) -> Result<Upload, ServiceError> {
    let mut app_id: Option<String> = None;
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadUpload(e.to_string()))?
    {
        if let Some(name) = field.file_name() {
            let file_name = file_base_name(name);
            let data = field
                .bytes()
                .await
                .map_err(|e| ServiceError::BadUpload(e.to_string()))?;
            tracing::debug!(file = %file_name, bytes = data.len(), "Received file");
            file = Some((file_name, data));
        } else if field.name() == Some("appid") {
            let value = field
                .text()
                .await
                .map_err(|e| ServiceError::BadUpload(e.to_string()))?;
            app_id = Some(value);
        }
        // Other form fields are tool-specific and ignored here.
    }

    let app_id = app_id.ok_or(ServiceError::MissingAppId)?;
    validate_app_id(&app_id)?;
    let (file_name, data) = file.ok_or(ServiceError::MissingFile)?;
    validate_file_name(&file_name)?;

    Ok(Upload {
        app_id,
        file_name,
        data,
    })
}

/// Strip any directory components a client may have sent along.
fn file_base_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .to_string()
}

/// App IDs become path components, so only a safe alphabet is accepted.
fn validate_app_id(app_id: &str) -> Result<(), ServiceError> {
    if app_id.is_empty() {
        return Err(ServiceError::MissingAppId);
    }
    if !app_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ServiceError::InvalidAppId(app_id.to_string()));
    }
    Ok(())
}

fn validate_file_name(file_name: &str) -> Result<(), ServiceError> {
    if !file_name.ends_with(ARTIFACT_EXTENSION) || file_name == ARTIFACT_EXTENSION {
        return Err(ServiceError::InvalidFile(file_name.to_string()));
    }
    Ok(())
}

/// Write the uploaded artifact under its app directory.
async fn save_artifact(ctx: &RequestContext, data: &[u8]) -> Result<(), ServiceError> {
    tokio::fs::create_dir_all(&ctx.app_dir)
        .await
        .map_err(ServiceError::SaveFailed)?;
    tokio::fs::write(&ctx.artifact_path, data)
        .await
        .map_err(ServiceError::SaveFailed)?;
    Ok(())
}

/// Execute the tool, classify its output, render the report and deliver
/// it, then clean up the app directory and roll the monthly log.
async fn run_verification(
    state: &AppState,
    ctx: &RequestContext,
    tracker: &mut DeliveryTracker,
) -> Result<DeliveryOutcome, ServiceError> {
    let command = state
        .template
        .render(&ctx.artifact_path.to_string_lossy())?;

    tracker.transition(DeliveryState::Executing);
    let result = state.supervisor.execute(&command).await;
    let text = result.report_text(&state.config.tool_name);

    // A failed run is an ERROR report in its own right; only successful
    // runs have output worth classifying.
    let status = if result.succeeded {
        state.classifier.classify(&text)
    } else {
        tracing::error!(app_id = %ctx.app_id, timed_out = result.timed_out, "Tool run failed");
        VerificationStatus::Error
    };
    tracker.transition(DeliveryState::Classified);
    tracing::debug!(app_id = %ctx.app_id, status = status.name(), "Report classified");

    let report = state
        .renderer
        .render(state.config.report_format, &ctx.file_name, status, &text)?;
    let outcome = state
        .coordinator
        .deliver(
            state.config.protocol,
            &ctx.app_id,
            &ctx.report_path,
            &report,
        )
        .await?;
    tracker.transition(DeliveryState::Delivered);

    cleanup(state, ctx).await;
    Ok(outcome)
}

/// Post-delivery bookkeeping: app directory removal and log rollover.
async fn cleanup(state: &AppState, ctx: &RequestContext) {
    if !state.config.keep_apps {
        match tokio::fs::remove_dir_all(&ctx.app_dir).await {
            Ok(()) => tracing::debug!(path = %ctx.app_dir.display(), "Deleted app directory"),
            Err(e) => {
                tracing::warn!(path = %ctx.app_dir.display(), error = %e, "Could not delete app directory");
            }
        }
    }

    if let Some(logs_dir) = &state.config.logs_dir {
        let active = logs_dir.join(logs::ACTIVE_LOG_NAME);
        if let Err(e) = logs::archive_monthly(logs_dir, &active).await {
            tracing::warn!(error = %e, "Monthly log archive failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_base_name_strips_directories() {
        assert_eq!(file_base_name("app.apk"), "app.apk");
        assert_eq!(file_base_name("/home/user/app.apk"), "app.apk");
        assert_eq!(file_base_name("C:\\Users\\user\\app.apk"), "app.apk");
    }

    #[test]
    fn test_validate_app_id() {
        assert!(validate_app_id("app-42_x").is_ok());
        assert!(matches!(
            validate_app_id(""),
            Err(ServiceError::MissingAppId)
        ));
        assert!(matches!(
            validate_app_id("../escape"),
            Err(ServiceError::InvalidAppId(_))
        ));
        assert!(matches!(
            validate_app_id("a b"),
            Err(ServiceError::InvalidAppId(_))
        ));
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("demo.apk").is_ok());
        assert!(matches!(
            validate_file_name("demo.zip"),
            Err(ServiceError::InvalidFile(_))
        ));
        assert!(matches!(
            validate_file_name(".apk"),
            Err(ServiceError::InvalidFile(_))
        ));
    }
}
