use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::proxy::common::schema::FieldViolation;

/// Message returned to callers for every failure that must stay opaque.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation failed: {} violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream error ({status}): {}", .message.as_deref().unwrap_or("<no message>"))]
    Upstream {
        status: u16,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Status code and client-facing body for this error.
    fn to_parts(&self) -> (StatusCode, serde_json::Value) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" })),
            AppError::Validation(violations) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "errors": violations }),
            ),
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            AppError::Upstream {
                status,
                message: Some(message),
            } => {
                let status =
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, json!({ "error": message }))
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": INTERNAL_ERROR_MESSAGE }),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Unauthorized | AppError::Validation(_) | AppError::BadRequest(_) => {
                tracing::debug!("Rejected request: {}", self);
            }
            AppError::Upstream { .. } => tracing::warn!("{}", self),
            _ => tracing::error!("Request failed: {}", self),
        }

        let (status, body) = self.to_parts();
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_without_message_is_generic_500() {
        let (status, body) = AppError::Upstream {
            status: 418,
            message: None,
        }
        .to_parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn upstream_with_message_keeps_status() {
        let (status, body) = AppError::Upstream {
            status: 404,
            message: Some("Not found".to_string()),
        }
        .to_parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));
    }

    #[test]
    fn config_errors_are_opaque() {
        let (status, body) = AppError::Config("MAIN_BACKEND_URL is not set".into()).to_parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": INTERNAL_ERROR_MESSAGE }));
    }

    #[test]
    fn validation_lists_every_violation() {
        let (status, body) = AppError::Validation(vec![
            FieldViolation::new("email", "email is required"),
            FieldViolation::new("password", "password is required"),
        ])
        .to_parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["errors"][0]["field"], "email");
    }
}
