//! Storage collaborators.
//!
//! The traits here are the only way the core and the API layer touch
//! persistence. Two backends implement all of them: [`pg::PgStore`] over
//! PostgreSQL and [`memory::MemoryStore`] for tests and local runs.
//!
//! Mutations of ownable resources take an [`OwnerCheck`]. Implementations
//! must load the row inside the same transaction (or lock) as the write,
//! report `AccessError::NotFound` if it is missing or soft-deleted, run the
//! check, and only then apply the change.

pub mod memory;
pub mod password;
pub mod pg;

use async_trait::async_trait;
use thiserror::Error;

use crate::access::{AccessError, OwnerCheck};
use crate::models::auth::{Credential, NewUser};
use crate::models::board::{Comment, Like, NewPost, Post, PostPatch};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Access(#[from] AccessError),

    /// A uniqueness rule was violated; the payload names it
    /// (`"email"`, `"nickname"`, `"like"`).
    #[error("Conflict on {0}")]
    Conflict(&'static str),

    #[error("Password hashing error: {0}")]
    Hash(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// User credentials and the one-way password capability.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError>;

    async fn find_by_id(&self, user_id: i64) -> Result<Option<Credential>, StoreError>;

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    async fn nickname_exists(&self, nickname: &str) -> Result<bool, StoreError>;

    /// Hash the raw password and persist the user, returning its id.
    async fn create_user(&self, user: &NewUser) -> Result<i64, StoreError>;

    /// One-way compare of a raw password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, StoreError> {
        password::verify_password(password, hash)
    }

    /// Verify against a throwaway hash and discard the result, so a lookup
    /// miss costs as much as a wrong password.
    fn verify_dummy(&self, password: &str) -> Result<(), StoreError> {
        self.verify_password(password, password::dummy_hash()?)?;
        Ok(())
    }
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, author_id: i64, post: &NewPost) -> Result<Post, StoreError>;

    /// Live post by id.
    async fn find_post(&self, post_id: i64) -> Result<Option<Post>, StoreError>;

    /// Live posts, newest first, with ids strictly below `cursor` when given.
    async fn list_posts(&self, cursor: Option<i64>, limit: i64) -> Result<Vec<Post>, StoreError>;

    async fn update_post(
        &self,
        post_id: i64,
        patch: &PostPatch,
        check: OwnerCheck<'_, Post>,
    ) -> Result<Post, StoreError>;

    /// Soft-delete the post together with its live comments and likes.
    async fn delete_post(&self, post_id: i64, check: OwnerCheck<'_, Post>)
    -> Result<(), StoreError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Fails `NotFound` unless the post is live.
    async fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        content: &str,
    ) -> Result<Comment, StoreError>;

    /// Live comments of a live post, oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, StoreError>;

    async fn update_comment(
        &self,
        comment_id: i64,
        content: &str,
        check: OwnerCheck<'_, Comment>,
    ) -> Result<Comment, StoreError>;

    async fn delete_comment(
        &self,
        comment_id: i64,
        check: OwnerCheck<'_, Comment>,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Fails `NotFound` unless the post is live and `Conflict("like")` if the
    /// user already has a live like on it.
    async fn create_like(&self, post_id: i64, user_id: i64) -> Result<Like, StoreError>;

    async fn delete_like(&self, like_id: i64, check: OwnerCheck<'_, Like>)
    -> Result<(), StoreError>;
}
