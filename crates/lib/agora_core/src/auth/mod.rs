//! Authentication logic.
//!
//! Provides the signed-token codec and the session issuer that drives
//! login, signup and refresh against a `CredentialStore`.

pub mod jwt;
pub mod session;

use thiserror::Error;

use crate::store::StoreError;

pub use jwt::TokenCodec;
pub use session::SessionIssuer;

/// Why a token was rejected.
///
/// Callers need the distinction: an expired access token warrants a silent
/// refresh, a bad signature warrants a forced logout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token encoding failed: {0}")]
    Encode(String),
}

/// Session flow errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately does not say which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Nickname already registered")]
    DuplicateNickname,

    #[error("Refresh token rejected: {0}")]
    RefreshInvalid(TokenError),

    #[error("User not found")]
    NotFound,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
