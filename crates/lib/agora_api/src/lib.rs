//! # agora_api
//!
//! HTTP API library for the Agora community board.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod validation;

use std::sync::Arc;

use agora_core::auth::{SessionIssuer, TokenCodec};
use agora_core::store::{CommentStore, CredentialStore, LikeStore, PostStore};
use axum::Router;
use axum::routing::{delete, get, patch, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, comments, likes, posts, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Verifies bearer tokens for the identity gate.
    pub codec: Arc<TokenCodec>,
    pub sessions: Arc<SessionIssuer>,
    pub posts: Arc<dyn PostStore>,
    pub comments: Arc<dyn CommentStore>,
    pub likes: Arc<dyn LikeStore>,
}

impl AppState {
    /// Wire every store seam to one backing store.
    pub fn new<S>(config: ApiConfig, store: Arc<S>) -> Self
    where
        S: CredentialStore + PostStore + CommentStore + LikeStore + 'static,
    {
        let codec = Arc::new(TokenCodec::new(config.jwt_secret.as_bytes()));
        let sessions = SessionIssuer::new(store.clone(), codec.clone())
            .with_access_ttl(chrono::Duration::seconds(config.access_token_ttl_secs));
        Self {
            config,
            codec,
            sessions: Arc::new(sessions),
            posts: store.clone(),
            comments: store.clone(),
            likes: store,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `agora_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    agora_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
///
/// Every request passes the identity gate; handlers that need a caller
/// extract `CurrentUser` and answer 401 themselves.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(routes::POST_LOGIN, post(auth::login_handler))
        .route(routes::POST_REFRESH, post(auth::refresh_handler))
        .route(routes::POST_LOGOUT, post(auth::logout_handler))
        .route(routes::USERS, post(users::signup_handler))
        .route(routes::USERS_ME, get(users::me_handler))
        .route(
            routes::POSTS,
            get(posts::list_posts_handler).post(posts::create_post_handler),
        )
        .route(
            routes::POSTS_ID,
            get(posts::get_post_handler)
                .patch(posts::update_post_handler)
                .delete(posts::delete_post_handler),
        )
        .route(
            routes::POSTS_ID_COMMENTS,
            get(comments::list_comments_handler).post(comments::create_comment_handler),
        )
        .route(
            routes::COMMENTS_ID,
            patch(comments::update_comment_handler)
                .delete(comments::delete_comment_handler),
        )
        .route(routes::POSTS_ID_LIKES, post(likes::like_post_handler))
        .route(routes::LIKES_ID, delete(likes::unlike_handler))
        .fallback(extract::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::identify,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
