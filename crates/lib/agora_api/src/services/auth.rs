//! Authentication service — login, signup, refresh and profile flows
//! delegating to `agora_core::auth::SessionIssuer`.

use agora_core::auth::SessionIssuer;
use agora_core::models::auth::{NewUser, Principal, Session, TokenPair, UserProfile};

use crate::error::AppResult;
use crate::models::SignupRequest;

/// Authenticate with email + password.
pub async fn login(sessions: &SessionIssuer, email: &str, password: &str) -> AppResult<Session> {
    Ok(sessions.login(email, password).await?)
}

/// Register a new user account, returning its id.
pub async fn signup(sessions: &SessionIssuer, body: SignupRequest) -> AppResult<i64> {
    let user = NewUser {
        email: body.email,
        password: body.password,
        nickname: body.nickname,
        profile_image: body.profile_image.filter(|url| !url.is_empty()),
    };
    Ok(sessions.signup(user).await?)
}

/// Exchange a refresh token for a rotated token pair.
pub async fn refresh(sessions: &SessionIssuer, refresh_token: &str) -> AppResult<TokenPair> {
    Ok(sessions.refresh(refresh_token).await?)
}

/// Profile of the authenticated caller.
pub async fn profile(sessions: &SessionIssuer, principal: &Principal) -> AppResult<UserProfile> {
    Ok(sessions.profile(principal).await?)
}
