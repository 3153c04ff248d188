use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::chat::ChatError;
use crate::db::UserStoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("User already exists: {0}")]
    UserAlreadyExists(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Access token missing")]
    TokenMissing,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("JWT creation failed: {0}")]
    TokenCreationError(String),
    #[error("Upstream error: {message} ({details})")]
    Upstream { message: String, details: String },
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg, None),
            // The demo API has always answered duplicates with 400.
            AppError::UserAlreadyExists(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                t!("auth.invalid_credentials").to_string(),
                None,
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                t!("auth.token_missing").to_string(),
                None,
            ),
            AppError::InvalidToken => (
                StatusCode::FORBIDDEN,
                t!("auth.token_invalid").to_string(),
                None,
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::TokenCreationError(msg) => {
                tracing::error!(error = %msg, "Token creation failed.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    t!("auth.token_creation_failed").to_string(),
                    None,
                )
            }
            AppError::Upstream { message, details } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, Some(details))
            }
            AppError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
        };

        let body = match details {
            Some(details) => serde_json::json!({ "error": error_message, "details": details }),
            None => serde_json::json!({ "error": error_message }),
        };
        (status, Json(body)).into_response()
    }
}

/// Unwraps a JSON request body. Any rejection (malformed JSON, a field of the
/// wrong type, a missing `Content-Type`) becomes a 400 with `message`.
pub fn json_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    message: impl Into<String>,
) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::warn!(status = %rejection.status(), error = %rejection.body_text(), "Rejected request body.");
            Err(AppError::InvalidInput(message.into()))
        }
    }
}

impl From<UserStoreError> for AppError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::EmailTaken(_) => AppError::UserAlreadyExists(t!("auth.user_exists").to_string()),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::TokenCreationError(err.to_string())
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotConfigured => {
                AppError::InternalServerError(t!("chat.api_key_missing").to_string())
            }
            ChatError::Upstream { body, .. } => AppError::Upstream {
                message: t!("chat.upstream_failed").to_string(),
                details: body,
            },
            ChatError::Network(e) => AppError::Upstream {
                message: t!("chat.request_failed").to_string(),
                details: e.to_string(),
            },
            ChatError::InvalidResponse(details) => AppError::Upstream {
                message: t!("chat.request_failed").to_string(),
                details,
            },
        }
    }
}
