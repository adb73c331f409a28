//! Signed token issuing and verification (HS256).

use std::fmt;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{info, warn};

use super::TokenError;
use crate::models::auth::TokenClaims;

/// Default access token lifetime: 30 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 30 * 60;

/// Refresh token lifetime: 14 days.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 14 * 24 * 60 * 60;

/// Secrets shorter than this (256 bits) are accepted but logged.
pub const MIN_SECRET_BYTES: usize = 32;

/// Issues and verifies HS256 tokens under one process-wide secret.
///
/// Stateless and cheap to share behind an `Arc`. Expiry is checked with
/// zero leeway: a token is expired as soon as `exp <= now`.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `decode_at` against the caller's clock, after
        // the signature, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a token for `(user_id, email)` valid for `validity` from now.
    pub fn issue(&self, user_id: i64, email: &str, validity: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: email.to_string(),
            user_id,
            iat: now.timestamp(),
            exp: (now + validity).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify a token against the current time.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify a token as of `now`.
    ///
    /// Structure is checked first, then the signature, then expiry, so a
    /// tampered token is never reported as merely expired.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        check_structure(token)?;
        let claims = decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(classify)?
            .claims;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Whether `token` is valid and was issued for exactly `expected_email`.
    ///
    /// Decode failures are returned as errors rather than `false`.
    pub fn validate(&self, token: &str, expected_email: &str) -> Result<bool, TokenError> {
        let claims = self.decode(token)?;
        Ok(claims.sub == expected_email)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

/// Three dot-separated segments with base64url JSON header and payload.
///
/// Once this passes, any base64 failure jsonwebtoken reports can only come
/// from the signature segment.
fn check_structure(token: &str) -> Result<(), TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };
    for segment in [header, payload] {
        let bytes = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|_| TokenError::Malformed)?;
        serde_json::from_slice::<serde_json::Value>(&bytes).map_err(|_| TokenError::Malformed)?;
    }
    Ok(())
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::Base64(_) => {
            TokenError::SignatureInvalid
        }
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}

/// Resolve the signing secret: env var `JWT_SECRET` → persisted file → generated.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        if secret.len() < MIN_SECRET_BYTES {
            warn!(
                len = secret.len(),
                min = MIN_SECRET_BYTES,
                "JWT_SECRET is shorter than recommended"
            );
        }
        return secret;
    }
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agora")
        .join("jwt-secret")
}
