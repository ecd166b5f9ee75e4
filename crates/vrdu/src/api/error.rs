//! API error type and its HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::VrduError;

use super::types::ErrorResponse;

/// Error returned by API handlers.
///
/// - `Validation` → 400 (bad field list, unreadable upload, missing file)
/// - `NotFound` → 404 (unknown job id)
/// - `Internal` → 500 (anything else)
#[derive(Debug)]
pub enum ApiError {
    Validation(VrduError),
    NotFound(String),
    Internal(VrduError),
}

impl ApiError {
    pub fn validation(error: VrduError) -> Self {
        Self::Validation(error)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(error: VrduError) -> Self {
        Self::Internal(error)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<VrduError> for ApiError {
    fn from(error: VrduError) -> Self {
        match error {
            VrduError::Validation { .. } | VrduError::Parsing { .. } => Self::Validation(error),
            other => Self::Internal(other),
        }
    }
}

fn error_type(error: &VrduError) -> &'static str {
    match error {
        VrduError::Io(_) => "IoError",
        VrduError::Parsing { .. } => "ParsingError",
        VrduError::Validation { .. } => "ValidationError",
        VrduError::Serialization { .. } => "SerializationError",
        VrduError::GeometrySource { .. } => "GeometrySourceError",
        VrduError::GraphConsistency(_) => "GraphConsistencyError",
        VrduError::JobProcessing(_) => "JobProcessingError",
        VrduError::Timeout(_) => "TimeoutError",
        VrduError::Other(_) => "Error",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_type, message) = match &self {
            Self::Validation(e) | Self::Internal(e) => (error_type(e), e.to_string()),
            Self::NotFound(message) => ("NotFoundError", message.clone()),
        };

        if status.is_server_error() {
            tracing::error!(error_type, %message, "Request failed");
        }

        let body = ErrorResponse {
            error_type: error_type.to_string(),
            message,
            traceback: None,
            status_code: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(VrduError::validation("blank field")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(VrduError::parsing("not a TSV")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::not_found("no such job").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(VrduError::JobProcessing("worker gone".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::not_found("Job abc not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
