use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::{
    auth::{jwt::TokenError, password::HashError},
    config::ConfigError,
    db::StoreError,
};

/// Generic message for every credential failure, so callers cannot probe
/// which emails are registered.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Every failure a handler can return. `IntoResponse` is the one place where
/// error kinds become status codes and client-visible messages.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Service temporarily unavailable, please retry")]
    StoreUnavailable(String),

    #[error("Server is misconfigured")]
    Configuration(#[from] ConfigError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn invalid_credentials() -> Self {
        AppError::Unauthorized(INVALID_CREDENTIALS.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => AppError::Conflict("Resource already exists".into()),
            StoreError::NotFound => AppError::NotFound("Not found".into()),
            StoreError::Unavailable(detail) => AppError::StoreUnavailable(detail),
            StoreError::Unexpected(detail) => AppError::Internal(anyhow::anyhow!(detail)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<HashError> for AppError {
    fn from(e: HashError) -> Self {
        AppError::Internal(anyhow::anyhow!(e))
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid | TokenError::Expired | TokenError::WrongPurpose => {
                AppError::Unauthorized("Invalid or expired token".into())
            }
            TokenError::Signing(_) => AppError::Internal(anyhow::anyhow!(e)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::StoreUnavailable(detail) => {
                error!(%detail, "store unavailable");
            }
            AppError::Configuration(e) => error!(error = %e, "configuration error"),
            AppError::Internal(e) => error!(error = ?e, "internal error"),
            _ => {}
        }

        (
            status,
            Json(ErrorResponse {
                success: false,
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_kinds_to_status_codes() {
        assert_eq!(AppError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::invalid_credentials().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(StoreError::Conflict("users_email_key".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(StoreError::Unavailable("timeout".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(ConfigError::MissingVar("JWT_SECRET".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_side_messages_hide_details() {
        let err = AppError::from(StoreError::Unexpected("relation users does not exist".into()));
        assert_eq!(err.to_string(), "Internal server error");

        let err = AppError::from(StoreError::Unavailable("pool timed out on 10.0.0.3".into()));
        assert!(!err.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn error_body_has_success_false() {
        let body = serde_json::to_value(ErrorResponse {
            success: false,
            message: INVALID_CREDENTIALS.into(),
        })
        .unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid credentials");
    }
}
