//! Error types for the storage layer.

use std::fmt;

use notekeep_core::{ErrorKind, NodeId, NoteId, SessionId, TokenError, UserId};
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Kind of resource an ownership check was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Note(NoteId),
    Node(NodeId),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Note(id) => write!(f, "note {}", id),
            Self::Node(id) => write!(f, "node {}", id),
        }
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// A user with this email already exists.
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),

    /// Note not found.
    #[error("note not found: {0}")]
    NoteNotFound(NoteId),

    /// No public note carries this public id.
    #[error("public note not found: {0}")]
    PublicNoteNotFound(Uuid),

    /// Node not found.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// No node sits at the given order of the note.
    #[error("no node at order {order} in note {note_id}")]
    NodeOrderNotFound { note_id: NoteId, order: i32 },

    /// Target order lies outside `0..count`.
    #[error("order {new_order} out of range for note {note_id} with {count} nodes")]
    OrderOutOfRange {
        note_id: NoteId,
        new_order: i32,
        count: i64,
    },

    /// Note title exceeds the length limit.
    #[error("title too long: {0} characters")]
    TitleTooLong(usize),

    /// Session not found.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// Session is revoked or expired.
    #[error("session revoked: {0}")]
    RevokedSession(SessionId),

    /// Refresh token does not match the stored fingerprint.
    #[error("refresh token does not match session {0}")]
    TokenMismatch(SessionId),

    /// Email or password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Acting user does not own the resource.
    #[error("user {user} does not own {resource}")]
    NotOwner { user: UserId, resource: Resource },

    /// Token signing or verification failure.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// A stored row could not be mapped to a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Migration error.
    #[error("migration error: {0}")]
    MigrationError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl StoreError {
    /// Stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound
            | Self::NoteNotFound(_)
            | Self::PublicNoteNotFound(_)
            | Self::NodeNotFound(_)
            | Self::NodeOrderNotFound { .. }
            | Self::SessionNotFound(_) => ErrorKind::NotFound,
            Self::UserAlreadyExists(_) | Self::OrderOutOfRange { .. } | Self::TitleTooLong(_) => {
                ErrorKind::Conflict
            }
            Self::InvalidCredentials | Self::NotOwner { .. } => ErrorKind::Unauthorized,
            Self::RevokedSession(_) => ErrorKind::RevokedSession,
            Self::TokenMismatch(_) => ErrorKind::InvalidToken,
            Self::Token(e) => e.kind(),
            Self::Database(_) | Self::Corrupt(_) | Self::MigrationError(_) | Self::ConfigError(_) => {
                ErrorKind::Internal
            }
        }
    }
}
