//! Refresh-token cookie construction.
//!
//! The refresh token only ever travels in this HttpOnly cookie, scoped to
//! the refresh endpoint; it is never written into a JSON body.

use agora_core::auth::jwt::REFRESH_TOKEN_TTL_SECS;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::routes;

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Build the HttpOnly refresh cookie (14 days).
pub fn refresh_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path(routes::POST_REFRESH)
        .max_age(Duration::seconds(REFRESH_TOKEN_TTL_SECS))
        .build()
}

/// Build an expired refresh cookie to clear it on the client.
pub fn clear_refresh_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path(routes::POST_REFRESH)
        .max_age(Duration::ZERO)
        .build()
}
