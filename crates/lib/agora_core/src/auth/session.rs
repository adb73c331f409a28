//! Session issuer — login, signup and refresh flows.
//!
//! Tokens are stateless: refresh rotates the pair but nothing server-side
//! marks the previous refresh token as spent. It stays usable until its
//! own expiry.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use super::jwt::{DEFAULT_ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, TokenCodec};
use super::AuthError;
use crate::models::auth::{NewUser, Principal, Session, TokenPair, UserProfile};
use crate::store::{CredentialStore, StoreError};

/// Orchestrates credential checks and token issuing.
pub struct SessionIssuer {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionIssuer {
    pub fn new(store: Arc<dyn CredentialStore>, codec: Arc<TokenCodec>) -> Self {
        Self {
            store,
            codec,
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authenticate with email + password.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let Some(credential) = self.store.find_by_email(email).await? else {
            self.store.verify_dummy(password)?;
            debug!("login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !self
            .store
            .verify_password(password, &credential.password_hash)?
        {
            debug!(user_id = credential.user_id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(credential.user_id, &credential.email)?;
        info!(user_id = credential.user_id, "user logged in");
        Ok(Session {
            profile: credential.profile(),
            tokens,
        })
    }

    /// Register a new account, returning its user id.
    ///
    /// Uniqueness is checked before any write; a conflict raised by the
    /// store itself (a concurrent signup) maps to the same errors.
    pub async fn signup(&self, user: NewUser) -> Result<i64, AuthError> {
        if self.store.email_exists(&user.email).await? {
            return Err(AuthError::DuplicateEmail);
        }
        if self.store.nickname_exists(&user.nickname).await? {
            return Err(AuthError::DuplicateNickname);
        }
        let user_id = self.store.create_user(&user).await.map_err(|e| match e {
            StoreError::Conflict("email") => AuthError::DuplicateEmail,
            StoreError::Conflict("nickname") => AuthError::DuplicateNickname,
            other => AuthError::Store(other),
        })?;
        info!(user_id, "user signed up");
        Ok(user_id)
    }

    /// Exchange a refresh token for a fresh access/refresh pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.codec.decode(refresh_token).map_err(|e| {
            debug!(error = %e, "refresh token rejected");
            AuthError::RefreshInvalid(e)
        })?;
        let tokens = self.issue_pair(claims.user_id, &claims.sub)?;
        info!(user_id = claims.user_id, "tokens refreshed");
        Ok(tokens)
    }

    /// Display fields for the authenticated user.
    pub async fn profile(&self, principal: &Principal) -> Result<UserProfile, AuthError> {
        self.store
            .find_by_id(principal.user_id)
            .await?
            .map(|c| c.profile())
            .ok_or(AuthError::NotFound)
    }

    fn issue_pair(&self, user_id: i64, email: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.codec.issue(user_id, email, self.access_ttl)?,
            refresh_token: self.codec.issue(user_id, email, self.refresh_ttl)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::auth::TokenError;
    use crate::models::auth::Credential;
    use crate::store::memory::MemoryStore;

    /// Memory store that counts password verifications.
    struct CountingStore {
        inner: MemoryStore,
        verifies: AtomicUsize,
    }

    #[async_trait]
    impl CredentialStore for CountingStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
            self.inner.find_by_email(email).await
        }

        async fn find_by_id(&self, user_id: i64) -> Result<Option<Credential>, StoreError> {
            self.inner.find_by_id(user_id).await
        }

        async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
            self.inner.email_exists(email).await
        }

        async fn nickname_exists(&self, nickname: &str) -> Result<bool, StoreError> {
            self.inner.nickname_exists(nickname).await
        }

        async fn create_user(&self, user: &NewUser) -> Result<i64, StoreError> {
            self.inner.create_user(user).await
        }

        fn verify_password(&self, password: &str, hash: &str) -> Result<bool, StoreError> {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            self.inner.verify_password(password, hash)
        }
    }

    fn issuer() -> SessionIssuer {
        let store = Arc::new(MemoryStore::with_hash_cost(4));
        let codec = Arc::new(TokenCodec::new(b"session-test-secret-session-test!"));
        SessionIssuer::new(store, codec)
    }

    fn new_user(email: &str, nickname: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password: "password1".into(),
            nickname: nickname.into(),
            profile_image: Some("https://img.example.com/a.png".into()),
        }
    }

    #[tokio::test]
    async fn signup_then_login_issues_both_tokens() {
        let issuer = issuer();
        let user_id = issuer.signup(new_user("a@b.com", "alice")).await.unwrap();

        let session = issuer.login("a@b.com", "password1").await.unwrap();
        assert_eq!(session.profile.user_id, user_id);
        assert_eq!(session.profile.nickname, "alice");
        assert_eq!(
            session.profile.profile_image.as_deref(),
            Some("https://img.example.com/a.png")
        );

        let access = issuer.codec().decode(&session.tokens.access_token).unwrap();
        let refresh = issuer.codec().decode(&session.tokens.refresh_token).unwrap();
        assert_eq!((access.user_id, access.sub.as_str()), (user_id, "a@b.com"));
        assert_eq!((refresh.user_id, refresh.sub.as_str()), (user_id, "a@b.com"));
        assert_eq!(refresh.exp - refresh.iat, REFRESH_TOKEN_TTL_SECS);
        assert!(access.exp < refresh.exp);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_fail_identically() {
        let issuer = issuer();
        issuer.signup(new_user("a@b.com", "alice")).await.unwrap();

        let unknown = issuer.login("nobody@b.com", "password1").await.unwrap_err();
        let wrong = issuer.login("a@b.com", "password2").await.unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn unknown_email_still_pays_for_a_password_verify() {
        let store = Arc::new(CountingStore {
            inner: MemoryStore::with_hash_cost(4),
            verifies: AtomicUsize::new(0),
        });
        let codec = Arc::new(TokenCodec::new(b"session-test-secret-session-test!"));
        let issuer = SessionIssuer::new(store.clone(), codec);
        issuer.signup(new_user("a@b.com", "alice")).await.unwrap();

        assert!(issuer.login("nobody@b.com", "password1").await.is_err());
        assert_eq!(store.verifies.load(Ordering::SeqCst), 1);

        assert!(issuer.login("a@b.com", "password2").await.is_err());
        assert_eq!(store.verifies.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn login_email_is_case_sensitive() {
        let issuer = issuer();
        issuer.signup(new_user("a@b.com", "alice")).await.unwrap();
        assert!(matches!(
            issuer.login("A@B.com", "password1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn signup_rejects_duplicates() {
        let issuer = issuer();
        issuer.signup(new_user("a@b.com", "alice")).await.unwrap();
        assert!(matches!(
            issuer.signup(new_user("a@b.com", "other")).await,
            Err(AuthError::DuplicateEmail)
        ));
        assert!(matches!(
            issuer.signup(new_user("c@d.com", "alice")).await,
            Err(AuthError::DuplicateNickname)
        ));
    }

    #[tokio::test]
    async fn refresh_reissues_for_same_identity() {
        let issuer = issuer();
        let refresh = issuer
            .codec()
            .issue(7, "x@y.com", Duration::days(14))
            .unwrap();

        let pair = issuer.refresh(&refresh).await.unwrap();
        let access = issuer.codec().decode(&pair.access_token).unwrap();
        assert_eq!((access.user_id, access.sub.as_str()), (7, "x@y.com"));
        let rotated = issuer.codec().decode(&pair.refresh_token).unwrap();
        assert_eq!((rotated.user_id, rotated.sub.as_str()), (7, "x@y.com"));

        // Stateless: the original refresh token still works.
        assert!(issuer.refresh(&refresh).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_rejects_bad_tokens_with_kind() {
        let issuer = issuer();
        let expired = issuer
            .codec()
            .issue(7, "x@y.com", Duration::seconds(-1))
            .unwrap();
        assert!(matches!(
            issuer.refresh(&expired).await,
            Err(AuthError::RefreshInvalid(TokenError::Expired))
        ));
        assert!(matches!(
            issuer.refresh("garbage").await,
            Err(AuthError::RefreshInvalid(TokenError::Malformed))
        ));
        let foreign = TokenCodec::new(b"some-other-secret-some-other-sec")
            .issue(7, "x@y.com", Duration::days(1))
            .unwrap();
        assert!(matches!(
            issuer.refresh(&foreign).await,
            Err(AuthError::RefreshInvalid(TokenError::SignatureInvalid))
        ));
    }

    #[tokio::test]
    async fn profile_of_missing_user_is_not_found() {
        let issuer = issuer();
        let ghost = Principal {
            user_id: 999,
            email: "ghost@b.com".into(),
        };
        assert!(matches!(
            issuer.profile(&ghost).await,
            Err(AuthError::NotFound)
        ));
    }
}
