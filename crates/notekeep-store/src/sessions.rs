//! Session lifecycle: issue, refresh, revoke.
//!
//! A session is one row of the ledger keyed by the `token_id` embedded in a
//! refresh token. The row stores the token's fingerprint, never the token.
//! Refresh mints a new access token only; the refresh token and its session
//! are not rotated.

use chrono::{DateTime, Utc};
use notekeep_core::{SessionId, TokenIssuer, User, UserId};

use crate::capability::{CredentialStore, SessionLedger};
use crate::error::{StoreError, StoreResult};
use crate::models::{Credentials, NewUser, Session};

/// Tokens handed to a client for a new session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session_id: SessionId,
    pub refresh_token: String,
    pub access_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Issues, refreshes and revokes sessions over a [`SessionLedger`].
#[derive(Debug, Clone)]
pub struct SessionManager<S> {
    ledger: S,
    issuer: TokenIssuer,
}

impl<S> SessionManager<S> {
    pub fn new(ledger: S, issuer: TokenIssuer) -> Self {
        Self { ledger, issuer }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn ledger(&self) -> &S {
        &self.ledger
    }
}

impl<S: SessionLedger> SessionManager<S> {
    /// Open a session for `user_id`.
    ///
    /// Both tokens are signed before anything is persisted, and nothing is
    /// returned unless the session row was written.
    pub async fn issue_session(&self, user_id: UserId) -> StoreResult<IssuedSession> {
        let session_id = SessionId::new();
        let refresh = self.issuer.issue_refresh(session_id)?;
        let access_token = self.issuer.issue_access(user_id)?;

        let session = Session {
            id: session_id,
            user_id,
            token_hash: self.issuer.fingerprint(&refresh.token),
            expires_at: refresh.expires_at,
            revoked: false,
        };
        self.ledger.create_session(&session).await?;

        tracing::info!(session_id = %session_id, user_id = %user_id, "Session issued");

        Ok(IssuedSession {
            session_id,
            refresh_token: refresh.token,
            access_token,
            refresh_expires_at: refresh.expires_at,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Checks, in order: signature, session existence, revocation, expiry
    /// (an expired session is revoked on the spot), fingerprint.
    pub async fn refresh(&self, refresh_token: &str) -> StoreResult<String> {
        let claims = self.issuer.decode_refresh(refresh_token)?;
        let session = self.ledger.get_session(claims.token_id).await?;

        if session.revoked {
            tracing::info!(session_id = %session.id, "Refresh on revoked session");
            return Err(StoreError::RevokedSession(session.id));
        }

        if session.is_expired_at(Utc::now()) {
            if let Err(e) = self.ledger.revoke_session(session.id).await {
                tracing::warn!(session_id = %session.id, error = %e, "Failed to revoke expired session");
            } else {
                tracing::info!(session_id = %session.id, "Expired session revoked");
            }
            return Err(StoreError::RevokedSession(session.id));
        }

        if !self
            .issuer
            .fingerprint_matches(refresh_token, &session.token_hash)
        {
            tracing::warn!(session_id = %session.id, "Refresh token fingerprint mismatch");
            return Err(StoreError::TokenMismatch(session.id));
        }

        let access_token = self.issuer.issue_access(session.user_id)?;
        tracing::debug!(session_id = %session.id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke a session. Idempotent.
    pub async fn revoke(&self, session_id: SessionId) -> StoreResult<()> {
        self.ledger.revoke_session(session_id).await?;
        tracing::info!(session_id = %session_id, "Session revoked");
        Ok(())
    }

    /// Revoke the session behind a refresh token.
    pub async fn logout(&self, refresh_token: &str) -> StoreResult<()> {
        let claims = self.issuer.decode_refresh(refresh_token)?;
        self.revoke(claims.token_id).await
    }
}

impl<S: SessionLedger + CredentialStore> SessionManager<S> {
    /// Create a user and open their first session.
    pub async fn register(&self, user: &NewUser) -> StoreResult<(User, IssuedSession)> {
        let created = self.ledger.create_user(user).await?;
        tracing::info!(user_id = %created.id, "User registered");

        let session = self.issue_session(created.id).await?;
        Ok((created, session))
    }

    /// Check credentials and open a session.
    ///
    /// `verify` receives the stored password hash and resolves to whether
    /// the presented password matches it.
    pub async fn login<F, Fut>(&self, email: &str, verify: F) -> StoreResult<(User, IssuedSession)>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = bool>,
    {
        let Credentials {
            user,
            password_hash,
        } = self
            .ledger
            .find_credentials(email)
            .await?
            .ok_or(StoreError::UserNotFound)?;

        if !verify(password_hash).await {
            tracing::info!(user_id = %user.id, "Login rejected");
            return Err(StoreError::InvalidCredentials);
        }

        let session = self.issue_session(user.id).await?;
        Ok((user, session))
    }

    /// Fetch the user a verified access token belongs to.
    pub async fn current_user(&self, user_id: UserId) -> StoreResult<User> {
        self.ledger.get_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLedger;
    use notekeep_core::{ErrorKind, TokenConfig};
    use std::time::Duration;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&TokenConfig {
            secret: "test-secret".to_string(),
            salt: "test-salt".to_string(),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(3600),
        })
        .unwrap()
    }

    fn manager() -> SessionManager<MemoryLedger> {
        SessionManager::new(MemoryLedger::new(), issuer())
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Ada".to_string(),
            password_hash: "stored-hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_issue_persists_fingerprint_not_token() {
        let m = manager();
        let user = UserId::new();

        let issued = m.issue_session(user).await.unwrap();
        let stored = m.ledger().session(issued.session_id).unwrap();

        assert_eq!(stored.user_id, user);
        assert!(!stored.revoked);
        assert_ne!(stored.token_hash, issued.refresh_token);
        assert!(m
            .issuer()
            .fingerprint_matches(&issued.refresh_token, &stored.token_hash));
        assert_eq!(stored.expires_at, issued.refresh_expires_at);

        let claims = m.issuer().verify_access(&issued.access_token).unwrap();
        assert_eq!(claims.user_id, user);
    }

    #[tokio::test]
    async fn test_issue_returns_nothing_when_persistence_fails() {
        let m = manager();
        m.ledger().fail_writes(true);

        let err = m.issue_session(UserId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(m.ledger().session_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_mints_access_token() {
        let m = manager();
        let user = UserId::new();
        let issued = m.issue_session(user).await.unwrap();

        let access = m.refresh(&issued.refresh_token).await.unwrap();
        assert_eq!(m.issuer().verify_access(&access).unwrap().user_id, user);

        // the same refresh token keeps working
        assert!(m.refresh(&issued.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_after_revoke_fails() {
        let m = manager();
        let issued = m.issue_session(UserId::new()).await.unwrap();

        m.revoke(issued.session_id).await.unwrap();
        m.revoke(issued.session_id).await.unwrap();

        let err = m.refresh(&issued.refresh_token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RevokedSession);
    }

    #[tokio::test]
    async fn test_refresh_on_expired_session_revokes_it() {
        let m = manager();
        let issued = m.issue_session(UserId::new()).await.unwrap();
        m.ledger().expire(issued.session_id);

        let err = m.refresh(&issued.refresh_token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RevokedSession);
        assert!(m.ledger().session(issued.session_id).unwrap().revoked);

        let err = m.refresh(&issued.refresh_token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RevokedSession);
    }

    #[tokio::test]
    async fn test_expired_session_still_reported_revoked_when_revoke_fails() {
        let m = manager();
        let issued = m.issue_session(UserId::new()).await.unwrap();
        m.ledger().expire(issued.session_id);
        m.ledger().fail_writes(true);

        let err = m.refresh(&issued.refresh_token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RevokedSession);
    }

    #[tokio::test]
    async fn test_refresh_rejects_fingerprint_mismatch() {
        let m = manager();
        let issued = m.issue_session(UserId::new()).await.unwrap();
        let other = m.issuer().fingerprint("some other token");
        m.ledger().set_token_hash(issued.session_id, &other);
        let before = m.ledger().session(issued.session_id).unwrap();

        let err = m.refresh(&issued.refresh_token).await.unwrap_err();
        assert!(matches!(err, StoreError::TokenMismatch(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidToken);

        let after = m.ledger().session(issued.session_id).unwrap();
        assert!(!after.revoked);
        assert_eq!(after.token_hash, before.token_hash);
        assert_eq!(after.expires_at, before.expires_at);
    }

    #[tokio::test]
    async fn test_refresh_with_token_from_other_secret() {
        let m = manager();
        let issued = m.issue_session(UserId::new()).await.unwrap();

        let foreign = TokenIssuer::new(&TokenConfig {
            secret: "other-secret".to_string(),
            salt: "test-salt".to_string(),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(3600),
        })
        .unwrap();
        let forged = foreign.issue_refresh(issued.session_id).unwrap();

        let err = m.refresh(&forged.token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidToken);
    }

    #[tokio::test]
    async fn test_refresh_unknown_session() {
        let m = manager();
        let orphan = m.issuer().issue_refresh(SessionId::new()).unwrap();

        let err = m.refresh(&orphan.token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let m = manager();
        let issued = m.issue_session(UserId::new()).await.unwrap();

        let err = m.refresh(&issued.access_token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidToken);
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let m = manager();
        let issued = m.issue_session(UserId::new()).await.unwrap();

        m.logout(&issued.refresh_token).await.unwrap();
        assert!(m.ledger().session(issued.session_id).unwrap().revoked);
        assert!(m.logout("garbage").await.is_err());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let m = manager();
        let (user, session) = m.register(&new_user("ada@example.com")).await.unwrap();
        assert_eq!(
            m.ledger().session(session.session_id).unwrap().user_id,
            user.id
        );

        let (logged_in, _) = m
            .login("ada@example.com", |hash| async move { hash == "stored-hash" })
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(m.current_user(user.id).await.unwrap().email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let m = manager();
        m.register(&new_user("ada@example.com")).await.unwrap();

        let err = m.register(&new_user("ada@example.com")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let m = manager();
        m.register(&new_user("ada@example.com")).await.unwrap();
        let sessions = m.ledger().session_count();

        let err = m.login("ada@example.com", |_| async { false }).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let err = m.login("nobody@example.com", |_| async { true }).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(m.ledger().session_count(), sessions);
    }
}
