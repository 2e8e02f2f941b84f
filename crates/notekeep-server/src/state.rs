//! Application state shared across handlers.

use std::sync::Arc;

use notekeep_core::TokenIssuer;
use notekeep_store::{Repository, SessionManager, Store};

/// Application state shared across all handlers.
///
/// This is cloneable and can be extracted in handlers using `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Ownership-gated note and node operations.
    repo: Arc<Repository<Store>>,
    /// Session lifecycle and credentials.
    sessions: Arc<SessionManager<Store>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: Store, issuer: TokenIssuer) -> Self {
        Self {
            repo: Arc::new(Repository::new(store.clone())),
            sessions: Arc::new(SessionManager::new(store, issuer)),
        }
    }

    pub fn repo(&self) -> &Repository<Store> {
        &self.repo
    }

    pub fn sessions(&self) -> &SessionManager<Store> {
        &self.sessions
    }

    /// Token issuer used to verify access tokens.
    pub fn issuer(&self) -> &TokenIssuer {
        self.sessions.issuer()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("issuer", self.issuer())
            .finish_non_exhaustive()
    }
}
