//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! shapes (which carry `#[serde(rename_all = "camelCase")]` etc.).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Authenticated identity for the duration of one request.
///
/// Derived from a validated access token and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
}

/// Claims embedded in access and refresh tokens.
///
/// Both token kinds share this shape; they differ only in validity window
/// and in how the client carries them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user's email.
    pub sub: String,
    /// Numeric user id.
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// Issued at (unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (unix timestamp, seconds).
    pub exp: i64,
}

impl TokenClaims {
    /// The identity these claims vouch for.
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.user_id,
            email: self.sub.clone(),
        }
    }
}

/// Stored user credential, owned by the `CredentialStore`.
#[derive(Clone, sqlx::FromRow)]
pub struct Credential {
    pub user_id: i64,
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
    pub profile_image: Option<String>,
}

impl Credential {
    /// Display fields safe to hand back to a client.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id,
            email: self.email.clone(),
            nickname: self.nickname.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("nickname", &self.nickname)
            .field("password_hash", &"<redacted>")
            .field("profile_image", &self.profile_image)
            .finish()
    }
}

/// Signup input. The raw password is handed to the store for hashing.
#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub profile_image: Option<String>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("nickname", &self.nickname)
            .field("profile_image", &self.profile_image)
            .finish_non_exhaustive()
    }
}

/// Public profile fields of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub email: String,
    pub nickname: String,
    pub profile_image: Option<String>,
}

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub profile: UserProfile,
    pub tokens: TokenPair,
}
