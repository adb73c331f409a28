//! Application error types.

use agora_core::access::AccessError;
use agora_core::auth::AuthError;
use agora_core::store::StoreError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::ApiResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// Every variant renders as `{status, data: null}` with a stable status
/// string; messages stay server-side.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Missing refresh token")]
    InvalidRefreshToken,

    #[error("Refresh failed")]
    RefreshFailed,

    #[error("Not the owner")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Nickname already registered")]
    DuplicateNickname,

    #[error("Already liked")]
    AlreadyLiked,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            AppError::InvalidRefreshToken => (StatusCode::UNAUTHORIZED, "invalid_refresh_token"),
            AppError::RefreshFailed => (StatusCode::UNAUTHORIZED, "token_refresh_failed"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "unauthorized"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            AppError::DuplicateEmail => (StatusCode::CONFLICT, "duplicate_email"),
            AppError::DuplicateNickname => (StatusCode::CONFLICT, "duplicate_nickname"),
            AppError::AlreadyLiked => (StatusCode::CONFLICT, "already_liked"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_server_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(msg) = &self {
            error!(error = %msg, "request failed");
        }
        let (status, code) = self.status();
        (status, Json(ApiResponse::<()>::empty(code))).into_response()
    }
}

impl From<AccessError> for AppError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::Unauthorized => AppError::Forbidden,
            AccessError::NotFound => AppError::NotFound,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Access(e) => AppError::from(e),
            StoreError::Conflict("email") => AppError::DuplicateEmail,
            StoreError::Conflict("nickname") => AppError::DuplicateNickname,
            StoreError::Conflict("like") => AppError::AlreadyLiked,
            StoreError::Conflict(other) => AppError::Internal(format!("conflict on {other}")),
            StoreError::Hash(msg) => AppError::Internal(msg),
            StoreError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::DuplicateEmail => AppError::DuplicateEmail,
            AuthError::DuplicateNickname => AppError::DuplicateNickname,
            AuthError::RefreshInvalid(_) => AppError::RefreshFailed,
            AuthError::NotFound => AppError::NotFound,
            AuthError::Token(e) => AppError::Internal(e.to_string()),
            AuthError::Store(e) => AppError::from(e),
        }
    }
}
