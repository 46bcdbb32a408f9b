//! Service error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::delivery::DeliveryError;
use crate::exec::CommandError;
use crate::report::RenderError;

/// Errors surfaced by the verification endpoint.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    /// The multipart upload could not be parsed.
    #[error("Malformed upload: {0}")]
    BadUpload(String),

    /// The request did not carry an app ID.
    #[error("No app ID specified")]
    MissingAppId,

    /// The app ID contained characters outside [A-Za-z0-9_-].
    #[error("Invalid app ID: {0}")]
    InvalidAppId(String),

    /// The uploaded file name is not an accepted artifact.
    #[error("Invalid app file: {0}")]
    InvalidFile(String),

    /// The request carried no file part.
    #[error("No app was received")]
    MissingFile,

    /// The uploaded artifact could not be written to disk.
    #[error("Could not save uploaded file: {0}")]
    SaveFailed(#[source] std::io::Error),

    /// The configured command template could not be rendered.
    #[error("Invalid command configuration: {0}")]
    Configuration(#[from] CommandError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl ServiceError {
    /// HTTP status this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadUpload(_)
            | Self::MissingAppId
            | Self::InvalidAppId(_)
            | Self::InvalidFile(_)
            | Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::SaveFailed(_)
            | Self::Configuration(_)
            | Self::Render(_)
            | Self::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_errors_map_to_400() {
        assert_eq!(
            ServiceError::MissingAppId.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::BadUpload("truncated".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidFile("app.zip".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::MissingFile.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_errors_map_to_500() {
        let err = ServiceError::SaveFailed(std::io::Error::other("disk full"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ServiceError::MissingAppId.to_string(),
            "No app ID specified"
        );
        assert_eq!(
            ServiceError::InvalidFile("x.zip".to_string()).to_string(),
            "Invalid app file: x.zip"
        );
    }
}
