//! In-memory fakes of the capability traits for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::Utc;
use notekeep_core::{SessionId, User, UserId};

use crate::capability::{CredentialStore, SessionLedger};
use crate::error::{StoreError, StoreResult};
use crate::models::{Credentials, NewUser, Session};

/// Ledger and credential store kept in hash maps.
#[derive(Debug, Default)]
pub(crate) struct MemoryLedger {
    sessions: Mutex<HashMap<SessionId, Session>>,
    users: Mutex<HashMap<String, Credentials>>,
    fail_writes: AtomicBool,
    fail_sweeps: AtomicBool,
    sweep_calls: AtomicUsize,
}

impl MemoryLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn session(&self, id: SessionId) -> Option<Session> {
        self.sessions.lock().unwrap().get(&id).cloned()
    }

    pub(crate) fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Move a session's expiry into the past.
    pub(crate) fn expire(&self, id: SessionId) {
        if let Some(s) = self.sessions.lock().unwrap().get_mut(&id) {
            s.expires_at = Utc::now() - chrono::Duration::seconds(1);
        }
    }

    pub(crate) fn set_token_hash(&self, id: SessionId, hash: &str) {
        if let Some(s) = self.sessions.lock().unwrap().get_mut(&id) {
            s.token_hash = hash.to_string();
        }
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_sweeps(&self, fail: bool) {
        self.fail_sweeps.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn sweep_calls(&self) -> usize {
        self.sweep_calls.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

impl SessionLedger for MemoryLedger {
    async fn create_session(&self, session: &Session) -> StoreResult<()> {
        self.check_write()?;
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Session> {
        self.session(id).ok_or(StoreError::SessionNotFound(id))
    }

    async fn revoke_session(&self, id: SessionId) -> StoreResult<()> {
        self.check_write()?;
        if let Some(s) = self.sessions.lock().unwrap().get_mut(&id) {
            s.revoked = true;
        }
        Ok(())
    }

    async fn sweep_expired(&self) -> StoreResult<u64> {
        self.sweep_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sweeps.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let now = Utc::now();
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

impl CredentialStore for MemoryLedger {
    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        self.check_write()?;
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.email) {
            return Err(StoreError::UserAlreadyExists(user.email.clone()));
        }
        let created = User {
            id: UserId::new(),
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: Utc::now(),
        };
        users.insert(
            user.email.clone(),
            Credentials {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn find_credentials(&self, email: &str) -> StoreResult<Option<Credentials>> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn get_user(&self, user_id: UserId) -> StoreResult<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|c| c.user.id == user_id)
            .map(|c| c.user.clone())
            .ok_or(StoreError::UserNotFound)
    }
}
