//! In-process store.
//!
//! All tables sit behind one async mutex, so every operation (including
//! the load → check → write sequence of a guarded mutation) runs atomically.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::password::{BCRYPT_COST, hash_password};
use super::{CommentStore, CredentialStore, LikeStore, PostStore, StoreError};
use crate::access::{AccessError, OwnerCheck, require_live};
use crate::models::auth::{Credential, NewUser};
use crate::models::board::{Comment, Like, NewPost, Post, PostPatch};

/// Memory-backed implementation of every store trait.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    hash_cost: u32,
}

#[derive(Debug, Clone)]
struct PostRow {
    id: i64,
    author_id: i64,
    title: String,
    content: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, Credential>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    likes: BTreeMap<i64, Like>,
    user_seq: i64,
    post_seq: i64,
    comment_seq: i64,
    like_seq: i64,
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

impl Tables {
    fn author(&self, user_id: i64) -> (String, Option<String>) {
        self.users
            .get(&user_id)
            .map(|u| (u.nickname.clone(), u.profile_image.clone()))
            .unwrap_or_default()
    }

    fn post_view(&self, row: &PostRow) -> Post {
        let (author_nickname, author_profile_image) = self.author(row.author_id);
        let like_count = self
            .likes
            .values()
            .filter(|l| l.post_id == row.id && l.deleted_at.is_none())
            .count() as i64;
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.post_id == row.id && c.deleted_at.is_none())
            .count() as i64;
        Post {
            id: row.id,
            author_id: row.author_id,
            author_nickname,
            author_profile_image,
            title: row.title.clone(),
            content: row.content.clone(),
            image_url: row.image_url.clone(),
            like_count,
            comment_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }

    fn comment_view(&self, row: &CommentRow) -> Comment {
        let (author_nickname, author_profile_image) = self.author(row.author_id);
        Comment {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            author_nickname,
            author_profile_image,
            content: row.content.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }

    fn live_post(&self, post_id: i64) -> Result<Post, AccessError> {
        require_live(self.posts.get(&post_id).map(|r| self.post_view(r)))
    }

    /// A comment is live only while its post is live too.
    fn live_comment(&self, comment_id: i64) -> Result<Comment, AccessError> {
        let comment = require_live(self.comments.get(&comment_id).map(|r| self.comment_view(r)))?;
        self.live_post(comment.post_id)?;
        Ok(comment)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_hash_cost(BCRYPT_COST)
    }

    /// Use a cheaper bcrypt cost; handy in tests.
    pub fn with_hash_cost(hash_cost: u32) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            hash_cost,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<Credential>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().any(|u| u.email == email))
    }

    async fn nickname_exists(&self, nickname: &str) -> Result<bool, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().any(|u| u.nickname == nickname))
    }

    async fn create_user(&self, user: &NewUser) -> Result<i64, StoreError> {
        let password_hash = hash_password(&user.password, self.hash_cost)?;
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email"));
        }
        if tables.users.values().any(|u| u.nickname == user.nickname) {
            return Err(StoreError::Conflict("nickname"));
        }
        let user_id = next_id(&mut tables.user_seq);
        tables.users.insert(
            user_id,
            Credential {
                user_id,
                email: user.email.clone(),
                nickname: user.nickname.clone(),
                password_hash,
                profile_image: user.profile_image.clone(),
            },
        );
        Ok(user_id)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create_post(&self, author_id: i64, post: &NewPost) -> Result<Post, StoreError> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let row = PostRow {
            id: next_id(&mut tables.post_seq),
            author_id,
            title: post.title.clone(),
            content: post.content.clone(),
            image_url: post.image_url.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let view = tables.post_view(&row);
        tables.posts.insert(row.id, row);
        Ok(view)
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.live_post(post_id).ok())
    }

    async fn list_posts(&self, cursor: Option<i64>, limit: i64) -> Result<Vec<Post>, StoreError> {
        let tables = self.tables.lock().await;
        let upper = cursor.unwrap_or(i64::MAX);
        Ok(tables
            .posts
            .range(..upper)
            .rev()
            .map(|(_, row)| row)
            .filter(|row| row.deleted_at.is_none())
            .take(limit.max(0) as usize)
            .map(|row| tables.post_view(row))
            .collect())
    }

    async fn update_post(
        &self,
        post_id: i64,
        patch: &PostPatch,
        check: OwnerCheck<'_, Post>,
    ) -> Result<Post, StoreError> {
        let mut tables = self.tables.lock().await;
        let current = tables.live_post(post_id)?;
        check(&current)?;
        let row = tables.posts.get_mut(&post_id).ok_or(AccessError::NotFound)?;
        if let Some(title) = &patch.title {
            row.title = title.clone();
        }
        if let Some(content) = &patch.content {
            row.content = content.clone();
        }
        if let Some(image_url) = &patch.image_url {
            row.image_url = image_url.clone();
        }
        row.updated_at = Utc::now();
        let row = row.clone();
        Ok(tables.post_view(&row))
    }

    async fn delete_post(
        &self,
        post_id: i64,
        check: OwnerCheck<'_, Post>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let current = tables.live_post(post_id)?;
        check(&current)?;
        let now = Utc::now();
        if let Some(row) = tables.posts.get_mut(&post_id) {
            row.deleted_at = Some(now);
        }
        for comment in tables.comments.values_mut() {
            if comment.post_id == post_id && comment.deleted_at.is_none() {
                comment.deleted_at = Some(now);
            }
        }
        for like in tables.likes.values_mut() {
            if like.post_id == post_id && like.deleted_at.is_none() {
                like.deleted_at = Some(now);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        content: &str,
    ) -> Result<Comment, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.live_post(post_id)?;
        let now = Utc::now();
        let row = CommentRow {
            id: next_id(&mut tables.comment_seq),
            post_id,
            author_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let view = tables.comment_view(&row);
        tables.comments.insert(row.id, row);
        Ok(view)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, StoreError> {
        let tables = self.tables.lock().await;
        tables.live_post(post_id)?;
        Ok(tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id && c.deleted_at.is_none())
            .map(|c| tables.comment_view(c))
            .collect())
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        content: &str,
        check: OwnerCheck<'_, Comment>,
    ) -> Result<Comment, StoreError> {
        let mut tables = self.tables.lock().await;
        let current = tables.live_comment(comment_id)?;
        check(&current)?;
        let row = tables
            .comments
            .get_mut(&comment_id)
            .ok_or(AccessError::NotFound)?;
        row.content = content.to_string();
        row.updated_at = Utc::now();
        let row = row.clone();
        Ok(tables.comment_view(&row))
    }

    async fn delete_comment(
        &self,
        comment_id: i64,
        check: OwnerCheck<'_, Comment>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let current = tables.live_comment(comment_id)?;
        check(&current)?;
        if let Some(row) = tables.comments.get_mut(&comment_id) {
            row.deleted_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn create_like(&self, post_id: i64, user_id: i64) -> Result<Like, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.live_post(post_id)?;
        if tables
            .likes
            .values()
            .any(|l| l.post_id == post_id && l.user_id == user_id && l.deleted_at.is_none())
        {
            return Err(StoreError::Conflict("like"));
        }
        let like = Like {
            id: next_id(&mut tables.like_seq),
            post_id,
            user_id,
            created_at: Utc::now(),
            deleted_at: None,
        };
        tables.likes.insert(like.id, like.clone());
        Ok(like)
    }

    async fn delete_like(
        &self,
        like_id: i64,
        check: OwnerCheck<'_, Like>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let current = require_live(tables.likes.get(&like_id).cloned())?;
        tables.live_post(current.post_id)?;
        check(&current)?;
        if let Some(like) = tables.likes.get_mut(&like_id) {
            like.deleted_at = Some(Utc::now());
        }
        Ok(())
    }
}
