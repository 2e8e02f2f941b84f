//! Capability traits for the storage components.
//!
//! Each trait names one narrow concern. [`Store`](crate::Store) implements
//! all of them; tests substitute in-memory fakes. Consumers such as
//! [`Repository`](crate::Repository) and
//! [`SessionManager`](crate::SessionManager) are generic over exactly the
//! capabilities they use.

use std::future::Future;

use notekeep_core::{
    FullNoteUpdate, NodeId, Note, NoteId, NoteNode, NotePreview, SessionId, User, UserId,
};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{Credentials, NewNode, NewUser, Session};
use crate::nodes::NodeMove;

/// User accounts and their credentials.
pub trait CredentialStore: Send + Sync {
    /// Create a user. Fails with `UserAlreadyExists` on a taken email.
    fn create_user(&self, user: &NewUser) -> impl Future<Output = StoreResult<User>> + Send;

    /// Look up a user and password hash by email.
    fn find_credentials(
        &self,
        email: &str,
    ) -> impl Future<Output = StoreResult<Option<Credentials>>> + Send;

    /// Fetch a user by id.
    fn get_user(&self, user_id: UserId) -> impl Future<Output = StoreResult<User>> + Send;
}

/// Persistence of refresh-token sessions.
pub trait SessionLedger: Send + Sync {
    /// Persist a new session.
    fn create_session(&self, session: &Session) -> impl Future<Output = StoreResult<()>> + Send;

    /// Fetch a session. Fails with `SessionNotFound`.
    fn get_session(&self, id: SessionId) -> impl Future<Output = StoreResult<Session>> + Send;

    /// Mark a session revoked. Revoking twice is not an error.
    fn revoke_session(&self, id: SessionId) -> impl Future<Output = StoreResult<()>> + Send;

    /// Delete every session whose expiry lies in the past. Returns the
    /// number of sessions removed.
    fn sweep_expired(&self) -> impl Future<Output = StoreResult<u64>> + Send;
}

/// Ownership checks. Each answers with a bool and never errors for a
/// missing resource.
pub trait OwnershipGuard: Send + Sync {
    /// True iff the note exists and belongs to `user_id`.
    fn owns_note(
        &self,
        user_id: UserId,
        note_id: NoteId,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// True iff the node exists and its parent note belongs to `user_id`.
    fn owns_node(
        &self,
        user_id: UserId,
        node_id: NodeId,
    ) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// Note-level operations.
pub trait NoteStore: Send + Sync {
    /// Create a note with one blank text node at order 0.
    fn create_note(
        &self,
        user_id: UserId,
        title: &str,
    ) -> impl Future<Output = StoreResult<NoteId>> + Send;

    /// Fetch a note with its nodes sorted by order.
    fn get_note(&self, note_id: NoteId) -> impl Future<Output = StoreResult<Note>> + Send;

    /// Fetch a public note by its public id. Private notes are not found.
    fn get_public_note(&self, public_id: Uuid) -> impl Future<Output = StoreResult<Note>> + Send;

    /// All notes of a user, most recently updated first.
    fn list_notes(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = StoreResult<Vec<NotePreview>>> + Send;

    fn update_title(
        &self,
        note_id: NoteId,
        title: &str,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn set_public(
        &self,
        note_id: NoteId,
        is_public: bool,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn set_archived(
        &self,
        note_id: NoteId,
        archived: bool,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Replace the title and the content of the listed nodes in one
    /// transaction. Returns the number of rows affected.
    fn update_full_note(
        &self,
        note_id: NoteId,
        update: &FullNoteUpdate,
    ) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Delete a note and, by cascade, its nodes.
    fn delete_note(&self, note_id: NoteId) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Order-maintaining node operations. Every method keeps the orders of the
/// affected note contiguous.
pub trait NodeSequencer: Send + Sync {
    /// Append a node at order `count`.
    fn append_node(
        &self,
        note_id: NoteId,
        node: &NewNode,
    ) -> impl Future<Output = StoreResult<NodeId>> + Send;

    /// Replace a node's content. Returns the parent note.
    fn update_node_content(
        &self,
        node_id: NodeId,
        content: &str,
    ) -> impl Future<Output = StoreResult<NoteId>> + Send;

    /// Move the node at `old_order` to `new_order`, shifting the ones in
    /// between.
    fn reorder_nodes(
        &self,
        note_id: NoteId,
        node_move: NodeMove,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Delete a node and close the gap it leaves. Returns the parent note.
    fn delete_node(&self, node_id: NodeId) -> impl Future<Output = StoreResult<NoteId>> + Send;

    /// Nodes of a note sorted by order.
    fn list_nodes(
        &self,
        note_id: NoteId,
    ) -> impl Future<Output = StoreResult<Vec<NoteNode>>> + Send;
}
