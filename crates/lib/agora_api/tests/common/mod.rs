//! Shared harness: an in-memory router driven with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use agora_api::{AppState, config::ApiConfig};
use agora_core::store::memory::MemoryStore;
use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret-integration-secret";
pub const PASSWORD: &str = "password1";

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

impl Reply {
    pub fn code(&self) -> &str {
        self.json["status"].as_str().unwrap_or_default()
    }

    /// Value of the refresh cookie set by this response, if any.
    pub fn refresh_cookie(&self) -> Option<String> {
        self.set_cookie().and_then(|raw| {
            raw.split(';')
                .next()
                .and_then(|pair| pair.strip_prefix("refresh_token="))
                .map(str::to_string)
        })
    }

    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

pub fn app() -> Router {
    let state = AppState::new(
        ApiConfig::with_secret(SECRET),
        Arc::new(MemoryStore::with_hash_cost(4)),
    );
    agora_api::router(state)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        req = req.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(value) = cookie {
        req = req.header(COOKIE, format!("refresh_token={value}"));
    }
    let body = match body {
        Some(json) => {
            req = req.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(req.body(body).expect("request"))
        .await
        .expect("oneshot");
    read(resp).await
}

/// `GET uri` with a raw `Authorization` header value.
pub async fn get_with_authorization(app: &Router, uri: &str, authorization: &str) -> Reply {
    let req = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, authorization)
        .body(Body::empty())
        .expect("request");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    read(resp).await
}

async fn read(resp: axum::response::Response) -> Reply {
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    Reply {
        status,
        headers,
        json,
    }
}

/// Sign up, log in, and return `(user_id, access_token, refresh_token)`.
pub async fn register(app: &Router, nickname: &str) -> (i64, String, String) {
    let email = format!("{nickname}@example.com");
    let signup = send(
        app,
        Method::POST,
        "/users",
        None,
        None,
        Some(json!({ "email": email, "password": PASSWORD, "nickname": nickname })),
    )
    .await;
    assert_eq!(signup.status, StatusCode::CREATED, "signup: {}", signup.json);
    let user_id = signup.json["data"]["userId"].as_i64().expect("userId");

    let login = send(
        app,
        Method::POST,
        "/login",
        None,
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK, "login: {}", login.json);
    let access = login.json["data"]["accessToken"]
        .as_str()
        .expect("accessToken")
        .to_string();
    let refresh = login.refresh_cookie().expect("refresh cookie");
    (user_id, access, refresh)
}
