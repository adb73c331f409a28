//! User request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::middleware::auth::CurrentUser;
use crate::models::{ApiResponse, SignupRequest, SignupResponse, UserProfileResponse};
use crate::services::auth;

/// `POST /users` — create a new account.
pub async fn signup_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SignupResponse>>)> {
    body.validate()?;
    let user_id = auth::signup(&state.sessions, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("signup_success", SignupResponse { user_id })),
    ))
}

/// `GET /users/me` — profile of the caller.
pub async fn me_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> AppResult<Json<ApiResponse<UserProfileResponse>>> {
    let profile = auth::profile(&state.sessions, &principal).await?;
    Ok(Json(ApiResponse::ok("user_profile", profile.into())))
}
