//! Post service — feed, detail and owner-guarded edits.

use agora_core::access::assert_owner;
use agora_core::models::auth::Principal;
use agora_core::models::board::{NewPost, Post, PostPatch};
use agora_core::store::PostStore;
use tracing::info;

use crate::error::{AppError, AppResult};

/// Page size when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Largest page a client may ask for.
pub const MAX_PAGE_SIZE: i64 = 50;

/// One page of the feed.
#[derive(Debug)]
pub struct PostPage {
    pub posts: Vec<Post>,
    /// Pass back as `cursor` to fetch the next page; `None` on the last page.
    pub next_cursor: Option<i64>,
}

/// Newest-first feed page starting below `cursor`.
pub async fn list_posts(
    store: &dyn PostStore,
    cursor: Option<i64>,
    limit: Option<i64>,
) -> AppResult<PostPage> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    // One extra row tells us whether another page exists.
    let mut posts = store.list_posts(cursor, limit + 1).await?;
    let next_cursor = if posts.len() as i64 > limit {
        posts.truncate(limit as usize);
        posts.last().map(|p| p.id)
    } else {
        None
    };
    Ok(PostPage { posts, next_cursor })
}

pub async fn get_post(store: &dyn PostStore, post_id: i64) -> AppResult<Post> {
    store.find_post(post_id).await?.ok_or(AppError::NotFound)
}

pub async fn create_post(
    store: &dyn PostStore,
    principal: &Principal,
    post: NewPost,
) -> AppResult<Post> {
    let post = store.create_post(principal.user_id, &post).await?;
    info!(post_id = post.id, user_id = principal.user_id, "post created");
    Ok(post)
}

pub async fn update_post(
    store: &dyn PostStore,
    principal: &Principal,
    post_id: i64,
    patch: PostPatch,
) -> AppResult<Post> {
    let check = |post: &Post| assert_owner(principal, post);
    let post = store.update_post(post_id, &patch, &check).await?;
    info!(post_id, user_id = principal.user_id, "post updated");
    Ok(post)
}

pub async fn delete_post(store: &dyn PostStore, principal: &Principal, post_id: i64) -> AppResult<()> {
    let check = |post: &Post| assert_owner(principal, post);
    store.delete_post(post_id, &check).await?;
    info!(post_id, user_id = principal.user_id, "post deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use agora_core::models::auth::NewUser;
    use agora_core::store::CredentialStore;
    use agora_core::store::memory::MemoryStore;

    use super::*;

    async fn principal(store: &MemoryStore, nickname: &str) -> Principal {
        let email = format!("{nickname}@example.com");
        let user_id = store
            .create_user(&NewUser {
                email: email.clone(),
                password: "password1".into(),
                nickname: nickname.into(),
                profile_image: None,
            })
            .await
            .unwrap();
        Principal { user_id, email }
    }

    fn new_post(title: &str) -> NewPost {
        NewPost {
            title: title.into(),
            content: "content".into(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn only_the_owner_deletes_and_only_once() {
        let store = MemoryStore::with_hash_cost(4);
        let user1 = principal(&store, "one").await;
        let user2 = principal(&store, "two").await;
        let post = create_post(&store, &user1, new_post("P")).await.unwrap();

        assert!(matches!(
            delete_post(&store, &user2, post.id).await,
            Err(AppError::Forbidden)
        ));
        delete_post(&store, &user1, post.id).await.unwrap();
        assert!(matches!(
            delete_post(&store, &user1, post.id).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn deleted_post_is_not_found_for_everyone() {
        let store = MemoryStore::with_hash_cost(4);
        let owner = principal(&store, "owner").await;
        let other = principal(&store, "other").await;
        let post = create_post(&store, &owner, new_post("P")).await.unwrap();
        delete_post(&store, &owner, post.id).await.unwrap();

        assert!(matches!(get_post(&store, post.id).await, Err(AppError::NotFound)));
        for who in [&owner, &other] {
            let patch = PostPatch {
                title: Some("edit".into()),
                ..PostPatch::default()
            };
            assert!(matches!(
                update_post(&store, who, post.id, patch).await,
                Err(AppError::NotFound)
            ));
            assert!(matches!(
                delete_post(&store, who, post.id).await,
                Err(AppError::NotFound)
            ));
        }
    }

    #[tokio::test]
    async fn owner_updates_partially() {
        let store = MemoryStore::with_hash_cost(4);
        let owner = principal(&store, "owner").await;
        let post = create_post(&store, &owner, new_post("before")).await.unwrap();
        let patch = PostPatch {
            title: Some("after".into()),
            ..PostPatch::default()
        };
        let updated = update_post(&store, &owner, post.id, patch).await.unwrap();
        assert_eq!(updated.title, "after");
        assert_eq!(updated.content, "content");
        assert_eq!(updated.author_nickname, "owner");
    }

    #[tokio::test]
    async fn feed_paginates_with_cursor() {
        let store = MemoryStore::with_hash_cost(4);
        let owner = principal(&store, "owner").await;
        for i in 0..5 {
            create_post(&store, &owner, new_post(&format!("p{i}"))).await.unwrap();
        }

        let first = list_posts(&store, None, Some(2)).await.unwrap();
        assert_eq!(first.posts.len(), 2);
        let cursor = first.next_cursor.expect("more pages");

        let second = list_posts(&store, Some(cursor), Some(2)).await.unwrap();
        assert_eq!(second.posts.len(), 2);
        assert!(second.posts.iter().all(|p| p.id < cursor));

        let last = list_posts(&store, second.next_cursor, Some(2)).await.unwrap();
        assert_eq!(last.posts.len(), 1);
        assert_eq!(last.next_cursor, None);
    }

    #[tokio::test]
    async fn page_size_is_clamped() {
        let store = MemoryStore::with_hash_cost(4);
        let owner = principal(&store, "owner").await;
        create_post(&store, &owner, new_post("only")).await.unwrap();
        let page = list_posts(&store, None, Some(0)).await.unwrap();
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.next_cursor, None);
    }
}
