//! Like service.

use agora_core::access::assert_owner;
use agora_core::models::auth::Principal;
use agora_core::models::board::Like;
use agora_core::store::LikeStore;
use tracing::info;

use crate::error::AppResult;

pub async fn like_post(store: &dyn LikeStore, principal: &Principal, post_id: i64) -> AppResult<Like> {
    let like = store.create_like(post_id, principal.user_id).await?;
    info!(like_id = like.id, post_id, user_id = principal.user_id, "post liked");
    Ok(like)
}

pub async fn unlike(store: &dyn LikeStore, principal: &Principal, like_id: i64) -> AppResult<()> {
    let check = |like: &Like| assert_owner(principal, like);
    store.delete_like(like_id, &check).await?;
    info!(like_id, user_id = principal.user_id, "like removed");
    Ok(())
}
