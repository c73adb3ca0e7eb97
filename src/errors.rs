use crate::services::{file_service::GatewayError, mail_service::MailError};
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::UnsupportedMediaType { .. } => AppError::bad_request(err.to_string()),
            GatewayError::ObjectNotFound { .. } => AppError::not_found(err.to_string()),
            GatewayError::StorageFailure(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::InvalidRequest(_) => {
                AppError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            MailError::Auth(_) | MailError::Transport(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::new(err.status(), err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::BackendError;

    #[test]
    fn gateway_errors_map_to_documented_statuses() {
        let cases = [
            (
                GatewayError::UnsupportedMediaType {
                    extension: "exe".into(),
                    allowed: "pdf".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                GatewayError::ObjectNotFound { key: "k.pdf".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                GatewayError::StorageFailure(BackendError::Unavailable("no creds".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                GatewayError::StorageFailure(BackendError::Other("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn mail_errors_map_to_statuses() {
        assert_eq!(
            AppError::from(MailError::InvalidRequest("bad".into())).status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(MailError::Auth("expired".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(MailError::Transport("reset".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
