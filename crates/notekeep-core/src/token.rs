//! Token issuing: signed access/refresh tokens and refresh-token fingerprints.
//!
//! Two token shapes are signed with the same HS256 secret:
//!
//! - access tokens carry `{user_id, exp, iat}` and are verified statelessly;
//! - refresh tokens carry `{token_id, exp, iat}` where `token_id` is the
//!   session id the ledger looks the session up by.
//!
//! The ledger never stores a refresh token itself, only its fingerprint: a
//! BLAKE3 keyed hash of the full signed token string under a key derived
//! from the configured salt. Forging a usable session therefore needs both
//! the signing secret and the salt.
//!
//! Refresh tokens are decoded without checking `exp`. Expiry is decided by
//! the session record so a genuine but stale token still reaches the ledger
//! and revokes its session.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::ErrorKind;
use crate::types::{SessionId, UserId};

/// Key-derivation context for refresh-token fingerprints.
const FINGERPRINT_CONTEXT: &str = "notekeep 2024-06 refresh-token fingerprint";

/// Errors raised while signing or decoding tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Issuer configuration is unusable.
    #[error("token configuration error: {0}")]
    Config(String),

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Signature, shape, or expiry check failed.
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Signing(_) => ErrorKind::Internal,
            Self::Invalid(_) => ErrorKind::InvalidToken,
        }
    }
}

/// Inputs for building a [`TokenIssuer`].
#[derive(Clone)]
pub struct TokenConfig {
    /// HS256 signing secret.
    pub secret: String,
    /// Salt the refresh-token fingerprint key is derived from.
    pub salt: String,
    /// Lifetime of access tokens.
    pub access_ttl: Duration,
    /// Lifetime of refresh tokens and their sessions.
    pub refresh_ttl: Duration,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

/// Claims of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: UserId,
    pub exp: i64,
    pub iat: i64,
}

/// Claims of a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub token_id: SessionId,
    pub exp: i64,
    pub iat: i64,
}

/// A freshly signed refresh token and the instant it stops being usable.
#[derive(Debug, Clone)]
pub struct SignedRefresh {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mints and verifies tokens; computes refresh-token fingerprints.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    fingerprint_key: [u8; 32],
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl TokenIssuer {
    /// Build an issuer. Empty secrets and out-of-range TTLs are rejected.
    pub fn new(config: &TokenConfig) -> Result<Self, TokenError> {
        if config.secret.is_empty() {
            return Err(TokenError::Config("signing secret is empty".to_string()));
        }
        if config.salt.is_empty() {
            return Err(TokenError::Config("refresh-token salt is empty".to_string()));
        }

        let access_ttl = chrono::Duration::from_std(config.access_ttl)
            .map_err(|e| TokenError::Config(format!("access ttl out of range: {}", e)))?;
        let refresh_ttl = chrono::Duration::from_std(config.refresh_ttl)
            .map_err(|e| TokenError::Config(format!("refresh ttl out of range: {}", e)))?;

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            fingerprint_key: blake3::derive_key(FINGERPRINT_CONTEXT, config.salt.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    /// Sign an access token for `user_id`, valid from now.
    pub fn issue_access(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = Utc::now();
        self.sign(&AccessClaims {
            user_id,
            exp: (now + self.access_ttl).timestamp(),
            iat: now.timestamp(),
        })
    }

    /// Sign a refresh token for session `token_id`, valid from now.
    pub fn issue_refresh(&self, token_id: SessionId) -> Result<SignedRefresh, TokenError> {
        let now = Utc::now();
        let expires_at = now + self.refresh_ttl;
        let token = self.sign(&RefreshClaims {
            token_id,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        })?;
        Ok(SignedRefresh { token, expires_at })
    }

    /// Verify signature and expiry of an access token.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.verify(token, Validation::new(Algorithm::HS256))
    }

    /// Verify the signature of a refresh token and extract its claims.
    ///
    /// `exp` is not checked; the session record decides expiry.
    pub fn decode_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        self.verify(token, validation)
    }

    /// Hex-encoded keyed hash of a signed refresh token.
    pub fn fingerprint(&self, token: &str) -> String {
        blake3::keyed_hash(&self.fingerprint_key, token.as_bytes())
            .to_hex()
            .to_string()
    }

    /// Constant-time comparison of `token`'s fingerprint with a stored one.
    ///
    /// A malformed stored value never matches.
    pub fn fingerprint_matches(&self, token: &str, stored: &str) -> bool {
        match blake3::Hash::from_hex(stored) {
            Ok(expected) => blake3::keyed_hash(&self.fingerprint_key, token.as_bytes()) == expected,
            Err(_) => false,
        }
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(TokenError::Signing)
    }

    fn verify<C: DeserializeOwned>(
        &self,
        token: &str,
        validation: Validation,
    ) -> Result<C, TokenError> {
        decode::<C>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, salt: &str) -> TokenConfig {
        TokenConfig {
            secret: secret.to_string(),
            salt: salt.to_string(),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(3600),
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&config("test_secret_key_12345", "pepper")).unwrap()
    }

    #[test]
    fn test_rejects_empty_secret_and_salt() {
        assert!(matches!(
            TokenIssuer::new(&config("", "salt")),
            Err(TokenError::Config(_))
        ));
        assert!(matches!(
            TokenIssuer::new(&config("secret", "")),
            Err(TokenError::Config(_))
        ));
    }

    #[test]
    fn test_access_token_round_trip() {
        let issuer = issuer();
        let user = UserId::new();
        let token = issuer.issue_access(user).unwrap();
        let claims = issuer.verify_access(&token).unwrap();
        assert_eq!(claims.user_id, user);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_access_token_wrong_secret() {
        let token = issuer().issue_access(UserId::new()).unwrap();
        let other = TokenIssuer::new(&config("another_secret", "pepper")).unwrap();
        let err = other.verify_access(&token).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidToken);
    }

    #[test]
    fn test_expired_access_token_rejected() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let token = issuer
            .sign(&AccessClaims {
                user_id: UserId::new(),
                exp: now - 3600,
                iat: now - 7200,
            })
            .unwrap();
        assert!(matches!(
            issuer.verify_access(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let issuer = issuer();
        let refresh = issuer.issue_refresh(SessionId::new()).unwrap();
        assert!(issuer.verify_access(&refresh.token).is_err());

        let access = issuer.issue_access(UserId::new()).unwrap();
        assert!(issuer.decode_refresh(&access).is_err());
    }

    #[test]
    fn test_refresh_token_carries_session_id() {
        let issuer = issuer();
        let session = SessionId::new();
        let refresh = issuer.issue_refresh(session).unwrap();
        let claims = issuer.decode_refresh(&refresh.token).unwrap();
        assert_eq!(claims.token_id, session);
        assert_eq!(claims.exp, refresh.expires_at.timestamp());
    }

    #[test]
    fn test_expired_refresh_token_still_decodes() {
        let issuer = issuer();
        let session = SessionId::new();
        let now = Utc::now().timestamp();
        let token = issuer
            .sign(&RefreshClaims {
                token_id: session,
                exp: now - 3600,
                iat: now - 7200,
            })
            .unwrap();
        assert_eq!(issuer.decode_refresh(&token).unwrap().token_id, session);
    }

    #[test]
    fn test_fingerprint_depends_on_salt() {
        let a = issuer();
        let b = TokenIssuer::new(&config("test_secret_key_12345", "other-salt")).unwrap();
        let token = a.issue_refresh(SessionId::new()).unwrap().token;

        let stored = a.fingerprint(&token);
        assert_eq!(stored.len(), 64);
        assert!(a.fingerprint_matches(&token, &stored));
        assert!(!b.fingerprint_matches(&token, &stored));
    }

    #[test]
    fn test_fingerprint_distinguishes_tokens_with_same_session() {
        let issuer = issuer();
        let session = SessionId::new();
        let first = issuer
            .sign(&RefreshClaims {
                token_id: session,
                exp: 2_000_000_000,
                iat: 1,
            })
            .unwrap();
        let second = issuer
            .sign(&RefreshClaims {
                token_id: session,
                exp: 2_000_000_000,
                iat: 2,
            })
            .unwrap();

        let stored = issuer.fingerprint(&first);
        assert!(!issuer.fingerprint_matches(&second, &stored));
    }

    #[test]
    fn test_malformed_stored_fingerprint_never_matches() {
        let issuer = issuer();
        assert!(!issuer.fingerprint_matches("anything", "not-hex"));
        assert!(!issuer.fingerprint_matches("anything", ""));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let rendered = format!("{:?}", config("super-secret", "super-salt"));
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("super-salt"));
    }
}
