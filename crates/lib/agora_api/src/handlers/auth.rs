//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::models::{ApiResponse, LoginRequest, LoginResponse, RefreshResponse};
use crate::services::auth;
use crate::services::cookies::{REFRESH_COOKIE, clear_refresh_cookie, refresh_cookie};

/// `POST /login` — authenticate with email + password.
///
/// The access token goes in the body; the refresh token only in the cookie.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<LoginResponse>>)> {
    body.validate()?;
    let session = auth::login(&state.sessions, &body.email, &body.password).await?;
    let jar = jar.add(refresh_cookie(
        &session.tokens.refresh_token,
        state.config.cookie_secure,
    ));
    Ok((
        jar,
        Json(ApiResponse::ok("login_success", LoginResponse::from(session))),
    ))
}

/// `POST /refresh` — exchange the refresh cookie for a new access token and
/// a rotated refresh cookie.
pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<ApiResponse<RefreshResponse>>)> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(AppError::InvalidRefreshToken)?;
    let pair = auth::refresh(&state.sessions, &token).await?;
    let jar = jar.add(refresh_cookie(&pair.refresh_token, state.config.cookie_secure));
    Ok((
        jar,
        Json(ApiResponse::ok(
            "token_refreshed",
            RefreshResponse {
                access_token: pair.access_token,
            },
        )),
    ))
}

/// `POST /logout` — clear the refresh cookie. Always succeeds.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    let jar = jar.add(clear_refresh_cookie(state.config.cookie_secure));
    (jar, Json(ApiResponse::empty("logout_success")))
}
