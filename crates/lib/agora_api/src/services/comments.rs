//! Comment service.

use agora_core::access::assert_owner;
use agora_core::models::auth::Principal;
use agora_core::models::board::Comment;
use agora_core::store::CommentStore;
use tracing::info;

use crate::error::AppResult;

pub async fn list_comments(store: &dyn CommentStore, post_id: i64) -> AppResult<Vec<Comment>> {
    Ok(store.list_comments(post_id).await?)
}

pub async fn create_comment(
    store: &dyn CommentStore,
    principal: &Principal,
    post_id: i64,
    content: &str,
) -> AppResult<Comment> {
    let comment = store
        .create_comment(post_id, principal.user_id, content)
        .await?;
    info!(comment_id = comment.id, post_id, user_id = principal.user_id, "comment created");
    Ok(comment)
}

pub async fn update_comment(
    store: &dyn CommentStore,
    principal: &Principal,
    comment_id: i64,
    content: &str,
) -> AppResult<Comment> {
    let check = |comment: &Comment| assert_owner(principal, comment);
    let comment = store.update_comment(comment_id, content, &check).await?;
    info!(comment_id, user_id = principal.user_id, "comment updated");
    Ok(comment)
}

pub async fn delete_comment(
    store: &dyn CommentStore,
    principal: &Principal,
    comment_id: i64,
) -> AppResult<()> {
    let check = |comment: &Comment| assert_owner(principal, comment);
    store.delete_comment(comment_id, &check).await?;
    info!(comment_id, user_id = principal.user_id, "comment deleted");
    Ok(())
}
