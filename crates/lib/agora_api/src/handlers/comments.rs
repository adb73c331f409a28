//! Comment request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::CurrentUser;
use crate::models::{ApiResponse, CommentRequest, CommentResponse};
use crate::services::comments;

/// `GET /posts/{post_id}/comments`
pub async fn list_comments_handler(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
) -> AppResult<Json<ApiResponse<Vec<CommentResponse>>>> {
    let list = comments::list_comments(state.comments.as_ref(), post_id).await?;
    Ok(Json(ApiResponse::ok(
        "comments_listed",
        list.into_iter().map(CommentResponse::from).collect(),
    )))
}

/// `POST /posts/{post_id}/comments`
pub async fn create_comment_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiPath(post_id): ApiPath<i64>,
    ApiJson(body): ApiJson<CommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CommentResponse>>)> {
    body.validate()?;
    let comment =
        comments::create_comment(state.comments.as_ref(), &principal, post_id, &body.content)
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("comment_created", comment.into())),
    ))
}

/// `PATCH /comments/{comment_id}` — author only.
pub async fn update_comment_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiPath(comment_id): ApiPath<i64>,
    ApiJson(body): ApiJson<CommentRequest>,
) -> AppResult<Json<ApiResponse<CommentResponse>>> {
    body.validate()?;
    let comment =
        comments::update_comment(state.comments.as_ref(), &principal, comment_id, &body.content)
            .await?;
    Ok(Json(ApiResponse::ok("comment_updated", comment.into())))
}

/// `DELETE /comments/{comment_id}` — author only.
pub async fn delete_comment_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiPath(comment_id): ApiPath<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    comments::delete_comment(state.comments.as_ref(), &principal, comment_id).await?;
    Ok(Json(ApiResponse::empty("comment_deleted")))
}
