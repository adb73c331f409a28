//! PostgreSQL store.
//!
//! Guarded mutations lock the target row with `SELECT … FOR UPDATE` inside
//! a transaction, so a concurrent delete cannot slip in between the
//! ownership check and the write.

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};

use super::password::{BCRYPT_COST, hash_password};
use super::{CommentStore, CredentialStore, LikeStore, PostStore, StoreError};
use crate::access::{AccessError, OwnerCheck, require_live};
use crate::models::auth::{Credential, NewUser};
use crate::models::board::{Comment, Like, NewPost, Post, PostPatch};

const USERS_EMAIL_KEY: &str = "users_email_key";
const USERS_NICKNAME_KEY: &str = "users_nickname_key";
const LIKES_LIVE_UNIQUE: &str = "likes_live_unique";

const SELECT_CREDENTIAL: &str =
    "SELECT id AS user_id, email, nickname, password_hash, profile_image FROM users";

const SELECT_POST: &str = "\
    SELECT p.id, p.author_id, \
           u.nickname AS author_nickname, u.profile_image AS author_profile_image, \
           p.title, p.content, p.image_url, \
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id AND l.deleted_at IS NULL) AS like_count, \
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id AND c.deleted_at IS NULL) AS comment_count, \
           p.created_at, p.updated_at, p.deleted_at \
    FROM posts p JOIN users u ON u.id = p.author_id";

const SELECT_COMMENT: &str = "\
    SELECT c.id, c.post_id, c.author_id, \
           u.nickname AS author_nickname, u.profile_image AS author_profile_image, \
           c.content, c.created_at, c.updated_at, c.deleted_at \
    FROM comments c JOIN users u ON u.id = c.author_id";

/// PostgreSQL-backed implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map unique-constraint violations to `Conflict`, everything else to `Db`.
fn conflict_or_db(e: sqlx::Error) -> StoreError {
    let field = match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => match db.constraint() {
            Some(USERS_EMAIL_KEY) => Some("email"),
            Some(USERS_NICKNAME_KEY) => Some("nickname"),
            Some(LIKES_LIVE_UNIQUE) => Some("like"),
            _ => None,
        },
        _ => None,
    };
    match field {
        Some(field) => StoreError::Conflict(field),
        None => StoreError::Db(e),
    }
}

async fn fetch_live_post<'e, E: PgExecutor<'e>>(
    executor: E,
    post_id: i64,
) -> Result<Option<Post>, sqlx::Error> {
    let sql = format!("{SELECT_POST} WHERE p.id = $1 AND p.deleted_at IS NULL");
    sqlx::query_as::<_, Post>(&sql)
        .bind(post_id)
        .fetch_optional(executor)
        .await
}

async fn fetch_live_comment<'e, E: PgExecutor<'e>>(
    executor: E,
    comment_id: i64,
) -> Result<Option<Comment>, sqlx::Error> {
    let sql = format!("{SELECT_COMMENT} WHERE c.id = $1 AND c.deleted_at IS NULL");
    sqlx::query_as::<_, Comment>(&sql)
        .bind(comment_id)
        .fetch_optional(executor)
        .await
}

/// Share-lock a live post so it cannot be deleted until the transaction ends.
async fn lock_live_post<'e, E: PgExecutor<'e>>(
    executor: E,
    post_id: i64,
) -> Result<(), StoreError> {
    sqlx::query_scalar::<_, i64>(
        "SELECT id FROM posts WHERE id = $1 AND deleted_at IS NULL FOR SHARE",
    )
    .bind(post_id)
    .fetch_optional(executor)
    .await?
    .ok_or(AccessError::NotFound)?;
    Ok(())
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        let sql = format!("{SELECT_CREDENTIAL} WHERE email = $1");
        let row = sqlx::query_as::<_, Credential>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<Credential>, StoreError> {
        let sql = format!("{SELECT_CREDENTIAL} WHERE id = $1");
        let row = sqlx::query_as::<_, Credential>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn nickname_exists(&self, nickname: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE nickname = $1)",
        )
        .bind(nickname)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_user(&self, user: &NewUser) -> Result<i64, StoreError> {
        let password_hash = hash_password(&user.password, BCRYPT_COST)?;
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (email, nickname, password_hash, profile_image) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(&password_hash)
        .bind(&user.profile_image)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_or_db)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn create_post(&self, author_id: i64, post: &NewPost) -> Result<Post, StoreError> {
        let mut tx = self.pool.begin().await?;
        let post_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO posts (author_id, title, content, image_url) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(author_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .fetch_one(&mut *tx)
        .await?;
        let created = fetch_live_post(&mut *tx, post_id)
            .await?
            .ok_or(AccessError::NotFound)?;
        tx.commit().await?;
        Ok(created)
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>, StoreError> {
        Ok(fetch_live_post(&self.pool, post_id).await?)
    }

    async fn list_posts(&self, cursor: Option<i64>, limit: i64) -> Result<Vec<Post>, StoreError> {
        let sql = format!(
            "{SELECT_POST} \
             WHERE p.deleted_at IS NULL AND ($1::BIGINT IS NULL OR p.id < $1) \
             ORDER BY p.id DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, Post>(&sql)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update_post(
        &self,
        post_id: i64,
        patch: &PostPatch,
        check: OwnerCheck<'_, Post>,
    ) -> Result<Post, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT id FROM posts WHERE id = $1 AND deleted_at IS NULL FOR UPDATE")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        let current = require_live(fetch_live_post(&mut *tx, post_id).await?)?;
        check(&current)?;

        sqlx::query(
            "UPDATE posts \
             SET title = COALESCE($2, title), \
                 content = COALESCE($3, content), \
                 image_url = CASE WHEN $4 THEN $5 ELSE image_url END, \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(post_id)
        .bind(&patch.title)
        .bind(&patch.content)
        .bind(patch.image_url.is_some())
        .bind(patch.image_url.clone().flatten())
        .execute(&mut *tx)
        .await?;

        let updated = fetch_live_post(&mut *tx, post_id)
            .await?
            .ok_or(AccessError::NotFound)?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_post(
        &self,
        post_id: i64,
        check: OwnerCheck<'_, Post>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT id FROM posts WHERE id = $1 AND deleted_at IS NULL FOR UPDATE")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        let current = require_live(fetch_live_post(&mut *tx, post_id).await?)?;
        check(&current)?;

        sqlx::query("UPDATE posts SET deleted_at = now() WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE comments SET deleted_at = now() WHERE post_id = $1 AND deleted_at IS NULL",
        )
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE likes SET deleted_at = now() WHERE post_id = $1 AND deleted_at IS NULL")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        content: &str,
    ) -> Result<Comment, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_live_post(&mut *tx, post_id).await?;
        let comment_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO comments (post_id, author_id, content) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;
        let created = fetch_live_comment(&mut *tx, comment_id)
            .await?
            .ok_or(AccessError::NotFound)?;
        tx.commit().await?;
        Ok(created)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, StoreError> {
        require_live(fetch_live_post(&self.pool, post_id).await?)?;
        let sql = format!(
            "{SELECT_COMMENT} WHERE c.post_id = $1 AND c.deleted_at IS NULL ORDER BY c.id ASC"
        );
        let rows = sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        content: &str,
        check: OwnerCheck<'_, Comment>,
    ) -> Result<Comment, StoreError> {
        let mut tx = self.pool.begin().await?;
        let current = lock_live_comment(&mut tx, comment_id).await?;
        check(&current)?;

        sqlx::query("UPDATE comments SET content = $2, updated_at = now() WHERE id = $1")
            .bind(comment_id)
            .bind(content)
            .execute(&mut *tx)
            .await?;

        let updated = fetch_live_comment(&mut *tx, comment_id)
            .await?
            .ok_or(AccessError::NotFound)?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_comment(
        &self,
        comment_id: i64,
        check: OwnerCheck<'_, Comment>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let current = lock_live_comment(&mut tx, comment_id).await?;
        check(&current)?;

        sqlx::query("UPDATE comments SET deleted_at = now() WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Lock a live comment whose post is also live, and load it.
async fn lock_live_comment(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    comment_id: i64,
) -> Result<Comment, StoreError> {
    sqlx::query_scalar::<_, i64>(
        "SELECT c.id FROM comments c JOIN posts p ON p.id = c.post_id \
         WHERE c.id = $1 AND c.deleted_at IS NULL AND p.deleted_at IS NULL \
         FOR UPDATE OF c",
    )
    .bind(comment_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AccessError::NotFound)?;
    Ok(require_live(fetch_live_comment(&mut **tx, comment_id).await?)?)
}

#[async_trait]
impl LikeStore for PgStore {
    async fn create_like(&self, post_id: i64, user_id: i64) -> Result<Like, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_live_post(&mut *tx, post_id).await?;
        let like = sqlx::query_as::<_, Like>(
            "INSERT INTO likes (post_id, user_id) VALUES ($1, $2) \
             RETURNING id, post_id, user_id, created_at, deleted_at",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_or_db)?;
        tx.commit().await?;
        Ok(like)
    }

    async fn delete_like(
        &self,
        like_id: i64,
        check: OwnerCheck<'_, Like>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let current = sqlx::query_as::<_, Like>(
            "SELECT l.id, l.post_id, l.user_id, l.created_at, l.deleted_at \
             FROM likes l JOIN posts p ON p.id = l.post_id \
             WHERE l.id = $1 AND l.deleted_at IS NULL AND p.deleted_at IS NULL \
             FOR UPDATE OF l",
        )
        .bind(like_id)
        .fetch_optional(&mut *tx)
        .await?;
        let current = require_live(current)?;
        check(&current)?;

        sqlx::query("UPDATE likes SET deleted_at = now() WHERE id = $1")
            .bind(like_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
