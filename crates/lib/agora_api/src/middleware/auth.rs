//! Identity gate — bearer token extraction and request-scoped `Principal`.
//!
//! The gate only ever adds identity; it never rejects. Endpoints that need
//! a caller ask for [`CurrentUser`], which answers 401 when the gate left
//! the request anonymous.

use std::convert::Infallible;

use agora_core::auth::TokenCodec;
use agora_core::models::auth::Principal;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Axum middleware: reads `Authorization: Bearer <token>`, verifies it, and
/// inserts the resulting `Principal` into request extensions.
///
/// A missing header, another scheme, or any token failure leaves the
/// request anonymous. A request that already carries a `Principal` passes
/// through untouched.
pub async fn identify(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if request.extensions().get::<Principal>().is_some() {
        return next.run(request).await;
    }
    if let Some(principal) = principal_from_headers(request.headers(), &state.codec) {
        request.extensions_mut().insert(principal);
    }
    next.run(request).await
}

/// Resolve the bearer token in `headers`, if any, to a `Principal`.
pub fn principal_from_headers(headers: &HeaderMap, codec: &TokenCodec) -> Option<Principal> {
    let value = headers.get(AUTHORIZATION)?;
    let Ok(value) = value.to_str() else {
        debug!("authorization header is not valid ASCII; continuing anonymously");
        return None;
    };
    let Some(token) = value.strip_prefix("Bearer ") else {
        debug!("authorization header is not a bearer token; continuing anonymously");
        return None;
    };
    match codec.decode(token) {
        Ok(claims) => Some(claims.principal()),
        Err(e) => {
            debug!(error = %e, "bearer token rejected; continuing anonymously");
            None
        }
    }
}

/// The authenticated caller. Rejects with 401 when the request is anonymous.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::Unauthenticated)
    }
}

/// The caller if there is one. Never rejects.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Principal>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Principal>().cloned()))
    }
}
