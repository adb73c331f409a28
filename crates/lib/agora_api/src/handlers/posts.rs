//! Post request handlers.

use agora_core::models::board::{NewPost, PostPatch};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth::{CurrentUser, MaybeUser};
use crate::models::{
    ApiResponse, CreatePostRequest, ListPostsQuery, PostPageResponse, PostResponse,
    UpdatePostRequest,
};
use crate::services::posts;

/// `GET /posts` — public feed, newest first.
pub async fn list_posts_handler(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    ApiQuery(query): ApiQuery<ListPostsQuery>,
) -> AppResult<Json<ApiResponse<PostPageResponse>>> {
    tracing::debug!(viewer = viewer.as_ref().map(|p| p.user_id), "listing posts");
    let page = posts::list_posts(state.posts.as_ref(), query.cursor, query.limit).await?;
    Ok(Json(ApiResponse::ok(
        "posts_listed",
        PostPageResponse {
            posts: page.posts.into_iter().map(PostResponse::from).collect(),
            next_cursor: page.next_cursor,
        },
    )))
}

/// `POST /posts`
pub async fn create_post_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiJson(body): ApiJson<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PostResponse>>)> {
    body.validate()?;
    let post = NewPost {
        title: body.title,
        content: body.content,
        image_url: body.image_url.filter(|url| !url.is_empty()),
    };
    let post = posts::create_post(state.posts.as_ref(), &principal, post).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("post_created", post.into())),
    ))
}

/// `GET /posts/{post_id}`
pub async fn get_post_handler(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
) -> AppResult<Json<ApiResponse<PostResponse>>> {
    let post = posts::get_post(state.posts.as_ref(), post_id).await?;
    Ok(Json(ApiResponse::ok("post_found", post.into())))
}

/// `PATCH /posts/{post_id}` — owner only; `"imageUrl": ""` clears the image.
pub async fn update_post_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiPath(post_id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdatePostRequest>,
) -> AppResult<Json<ApiResponse<PostResponse>>> {
    body.validate()?;
    let patch = PostPatch {
        title: body.title,
        content: body.content,
        // An empty string removes the image.
        image_url: body.image_url.map(|url| Some(url).filter(|url| !url.is_empty())),
    };
    let post = posts::update_post(state.posts.as_ref(), &principal, post_id, patch).await?;
    Ok(Json(ApiResponse::ok("post_updated", post.into())))
}

/// `DELETE /posts/{post_id}` — owner only; soft-deletes the post with its
/// comments and likes.
pub async fn delete_post_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiPath(post_id): ApiPath<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    posts::delete_post(state.posts.as_ref(), &principal, post_id).await?;
    Ok(Json(ApiResponse::empty("post_deleted")))
}
