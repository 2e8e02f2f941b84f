//! Database models for the storage layer.
//!
//! Row types map directly to database rows and are used for sqlx queries.
//! They convert into the domain types of notekeep-core.

use chrono::{DateTime, Utc};
use notekeep_core::{
    ContentType, NodeId, Note, NoteId, NoteNode, NotePreview, SessionId, User, UserId,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::StoreError;

/// Database row for the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId(row.id),
            email: row.email,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// A user together with the stored password hash.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

impl From<UserRow> for Credentials {
    fn from(row: UserRow) -> Self {
        let password_hash = row.password_hash.clone();
        Credentials {
            user: row.into(),
            password_hash,
        }
    }
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    /// Already hashed; the store never sees the plain password.
    pub password_hash: String,
}

/// Database row for the `notes` table.
#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub is_public: bool,
    pub public_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl NoteRow {
    /// Combine the row with its already sorted nodes.
    pub fn into_note(self, nodes: Vec<NoteNode>) -> Note {
        Note {
            id: NoteId(self.id),
            user_id: UserId(self.user_id),
            title: self.title,
            is_public: self.is_public,
            public_id: self.public_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            archived_at: self.archived_at,
            nodes,
        }
    }
}

impl From<NoteRow> for NotePreview {
    fn from(row: NoteRow) -> Self {
        NotePreview {
            id: NoteId(row.id),
            title: row.title,
            is_public: row.is_public,
            created_at: row.created_at,
            updated_at: row.updated_at,
            archived_at: row.archived_at,
        }
    }
}

/// Database row for the `note_nodes` table.
#[derive(Debug, Clone, FromRow)]
pub struct NodeRow {
    pub id: i64,
    pub note_id: i64,
    pub order: i32,
    pub content_type: String,
    pub content: String,
}

impl TryFrom<NodeRow> for NoteNode {
    type Error = StoreError;

    fn try_from(row: NodeRow) -> Result<Self, Self::Error> {
        let content_type: ContentType = row
            .content_type
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("node {}: {}", row.id, e)))?;
        Ok(NoteNode {
            id: NodeId(row.id),
            note_id: NoteId(row.note_id),
            order: row.order,
            content_type,
            content: row.content,
        })
    }
}

/// Input for appending a node to a note.
#[derive(Debug, Clone)]
pub struct NewNode {
    pub content_type: ContentType,
    pub content: String,
}

impl NewNode {
    /// The blank text node every new note starts with.
    pub fn blank_text() -> Self {
        Self {
            content_type: ContentType::Text,
            content: String::new(),
        }
    }
}

/// A persisted refresh-token session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    /// Keyed fingerprint of the signed refresh token.
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl Session {
    /// Returns true once `expires_at` lies in the past.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Database row for the `refresh_tokens` table.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: SessionId(row.id),
            user_id: UserId(row.user_id),
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            revoked: row.revoked,
        }
    }
}
