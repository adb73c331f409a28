//! Board domain models: posts, comments and likes.
//!
//! Every type here is an ownable, soft-deletable resource. Rows with
//! `deleted_at` set are never returned by normal reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::Owned;

/// A post as seen by readers, with author display fields and live counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub author_nickname: String,
    pub author_profile_image: Option<String>,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    /// Live likes only.
    pub like_count: i64,
    /// Live comments only.
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

/// Partial post update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    /// `Some(None)` removes the image.
    pub image_url: Option<Option<String>>,
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_nickname: String,
    pub author_profile_image: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A user's like on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Owned for Post {
    fn owner_id(&self) -> i64 {
        self.author_id
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> i64 {
        self.author_id
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl Owned for Like {
    fn owner_id(&self) -> i64 {
        self.user_id
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
