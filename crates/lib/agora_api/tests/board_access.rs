//! Ownership and soft-delete rules over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use common::{app, get_with_authorization, register, send};
use serde_json::json;

async fn create_post(app: &axum::Router, token: &str, title: &str) -> i64 {
    let reply = send(
        app,
        Method::POST,
        "/posts",
        Some(token),
        None,
        Some(json!({ "title": title, "content": "hello board" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "create: {}", reply.json);
    assert_eq!(reply.code(), "post_created");
    reply.json["data"]["postId"].as_i64().expect("postId")
}

#[tokio::test]
async fn only_owner_deletes_and_deleted_post_disappears() {
    let app = app();
    let (_, owner, _) = register(&app, "owner").await;
    let (_, other, _) = register(&app, "other").await;
    let post_id = create_post(&app, &owner, "P").await;
    let uri = format!("/posts/{post_id}");

    let forbidden = send(&app, Method::DELETE, &uri, Some(&other), None, None).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.code(), "unauthorized");

    let deleted = send(&app, Method::DELETE, &uri, Some(&owner), None, None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.code(), "post_deleted");

    let again = send(&app, Method::DELETE, &uri, Some(&owner), None, None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.code(), "not_found");

    let read = send(&app, Method::GET, &uri, None, None, None).await;
    assert_eq!(read.status, StatusCode::NOT_FOUND);

    let feed = send(&app, Method::GET, "/posts", None, None, None).await;
    assert_eq!(feed.json["data"]["posts"], json!([]));
}

#[tokio::test]
async fn non_owner_cannot_patch() {
    let app = app();
    let (_, owner, _) = register(&app, "owner").await;
    let (_, other, _) = register(&app, "other").await;
    let post_id = create_post(&app, &owner, "before").await;
    let uri = format!("/posts/{post_id}");

    let patch = json!({ "title": "hijacked" });
    let forbidden = send(&app, Method::PATCH, &uri, Some(&other), None, Some(patch)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let ok = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&owner),
        None,
        Some(json!({ "title": "after" })),
    )
    .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.code(), "post_updated");
    assert_eq!(ok.json["data"]["title"], "after");
    assert_eq!(ok.json["data"]["content"], "hello board");

    let empty = send(&app, Method::PATCH, &uri, Some(&owner), None, Some(json!({}))).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn anonymous_reads_work_and_basic_auth_is_ignored() {
    let app = app();
    let (_, owner, _) = register(&app, "owner").await;
    create_post(&app, &owner, "public").await;

    let reply = get_with_authorization(&app, "/posts", "Basic dXNlcjpwYXNz").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.code(), "posts_listed");
    assert_eq!(reply.json["data"]["posts"][0]["title"], "public");
    assert_eq!(reply.json["data"]["posts"][0]["author"]["nickname"], "owner");
}

#[tokio::test]
async fn mutations_require_a_caller() {
    let app = app();
    let (_, owner, _) = register(&app, "owner").await;
    let post_id = create_post(&app, &owner, "P").await;

    let attempts = [
        (Method::POST, "/posts".to_string(), Some(json!({ "title": "t", "content": "c" }))),
        (Method::PATCH, format!("/posts/{post_id}"), Some(json!({ "title": "t" }))),
        (Method::DELETE, format!("/posts/{post_id}"), None),
        (Method::POST, format!("/posts/{post_id}/comments"), Some(json!({ "content": "c" }))),
        (Method::POST, format!("/posts/{post_id}/likes"), None),
    ];
    for (method, uri, body) in attempts {
        let reply = send(&app, method.clone(), &uri, None, None, body).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(reply.code(), "unauthenticated");
    }
}

#[tokio::test]
async fn comments_belong_to_their_author() {
    let app = app();
    let (_, owner, _) = register(&app, "owner").await;
    let (_, other, _) = register(&app, "other").await;
    let post_id = create_post(&app, &owner, "P").await;

    let created = send(
        &app,
        Method::POST,
        &format!("/posts/{post_id}/comments"),
        Some(&other),
        None,
        Some(json!({ "content": "nice" })),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.code(), "comment_created");
    let comment_id = created.json["data"]["commentId"].as_i64().expect("commentId");
    let uri = format!("/comments/{comment_id}");

    let forbidden = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&owner),
        None,
        Some(json!({ "content": "edited" })),
    )
    .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let edited = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&other),
        None,
        Some(json!({ "content": "edited" })),
    )
    .await;
    assert_eq!(edited.status, StatusCode::OK);
    assert_eq!(edited.json["data"]["content"], "edited");

    let listed = send(
        &app,
        Method::GET,
        &format!("/posts/{post_id}/comments"),
        None,
        None,
        None,
    )
    .await;
    assert_eq!(listed.code(), "comments_listed");
    assert_eq!(listed.json["data"].as_array().map(Vec::len), Some(1));

    let deleted = send(&app, Method::DELETE, &uri, Some(&other), None, None).await;
    assert_eq!(deleted.code(), "comment_deleted");
    let gone = send(&app, Method::DELETE, &uri, Some(&other), None, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn likes_are_unique_and_removable_by_the_liker() {
    let app = app();
    let (_, owner, _) = register(&app, "owner").await;
    let (_, fan, _) = register(&app, "fan").await;
    let post_id = create_post(&app, &owner, "P").await;
    let likes_uri = format!("/posts/{post_id}/likes");

    let liked = send(&app, Method::POST, &likes_uri, Some(&fan), None, None).await;
    assert_eq!(liked.status, StatusCode::CREATED);
    assert_eq!(liked.code(), "like_created");
    let like_id = liked.json["data"]["likeId"].as_i64().expect("likeId");

    let twice = send(&app, Method::POST, &likes_uri, Some(&fan), None, None).await;
    assert_eq!(twice.status, StatusCode::CONFLICT);
    assert_eq!(twice.code(), "already_liked");

    let post = send(&app, Method::GET, &format!("/posts/{post_id}"), None, None, None).await;
    assert_eq!(post.json["data"]["likeCount"], 1);

    let uri = format!("/likes/{like_id}");
    let forbidden = send(&app, Method::DELETE, &uri, Some(&owner), None, None).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let removed = send(&app, Method::DELETE, &uri, Some(&fan), None, None).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.code(), "like_deleted");

    let again = send(&app, Method::POST, &likes_uri, Some(&fan), None, None).await;
    assert_eq!(again.status, StatusCode::CREATED);
}

#[tokio::test]
async fn empty_image_url_clears_the_image() {
    let app = app();
    let (_, owner, _) = register(&app, "owner").await;
    let created = send(
        &app,
        Method::POST,
        "/posts",
        Some(&owner),
        None,
        Some(json!({ "title": "pic", "content": "c", "imageUrl": "" })),
    )
    .await;
    assert_eq!(created.json["data"]["imageUrl"], serde_json::Value::Null);
    let uri = format!("/posts/{}", created.json["data"]["postId"]);

    let set = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&owner),
        None,
        Some(json!({ "imageUrl": "https://img.example.com/p.png" })),
    )
    .await;
    assert_eq!(set.json["data"]["imageUrl"], "https://img.example.com/p.png");

    let retitled = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&owner),
        None,
        Some(json!({ "title": "renamed" })),
    )
    .await;
    assert_eq!(retitled.json["data"]["imageUrl"], "https://img.example.com/p.png");

    let cleared = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&owner),
        None,
        Some(json!({ "imageUrl": "" })),
    )
    .await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert_eq!(cleared.json["data"]["imageUrl"], serde_json::Value::Null);
}
