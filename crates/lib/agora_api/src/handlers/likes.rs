//! Like request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ApiPath;
use crate::middleware::auth::CurrentUser;
use crate::models::{ApiResponse, LikeResponse};
use crate::services::likes;

/// `POST /posts/{post_id}/likes` — at most one live like per user and post.
pub async fn like_post_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiPath(post_id): ApiPath<i64>,
) -> AppResult<(StatusCode, Json<ApiResponse<LikeResponse>>)> {
    let like = likes::like_post(state.likes.as_ref(), &principal, post_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("like_created", like.into())),
    ))
}

/// `DELETE /likes/{like_id}` — only the user who liked.
pub async fn unlike_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiPath(like_id): ApiPath<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    likes::unlike(state.likes.as_ref(), &principal, like_id).await?;
    Ok(Json(ApiResponse::empty("like_deleted")))
}
