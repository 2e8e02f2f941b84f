//! Ownership-gated access to notes and nodes.
//!
//! Every operation takes the acting user first and asks the
//! [`OwnershipGuard`] before the store is touched. A refusal is reported as
//! [`StoreError::NotOwner`], whose kind (`Unauthorized`) the HTTP layer
//! renders exactly like a missing resource.

use notekeep_core::{FullNoteUpdate, NodeId, Note, NoteId, NotePreview, UserId};
use uuid::Uuid;

use crate::capability::{NodeSequencer, NoteStore, OwnershipGuard};
use crate::error::{Resource, StoreError, StoreResult};
use crate::models::NewNode;
use crate::nodes::NodeMove;

/// Note and node operations on behalf of an acting user.
#[derive(Debug, Clone)]
pub struct Repository<S> {
    store: S,
}

impl<S> Repository<S> {
    /// Create a new repository wrapping the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: OwnershipGuard + NoteStore + NodeSequencer> Repository<S> {
    async fn require_note(&self, user: UserId, note_id: NoteId) -> StoreResult<()> {
        if self.store.owns_note(user, note_id).await? {
            Ok(())
        } else {
            tracing::debug!(user_id = %user, note_id = %note_id, "Note ownership check failed");
            Err(StoreError::NotOwner {
                user,
                resource: Resource::Note(note_id),
            })
        }
    }

    async fn require_node(&self, user: UserId, node_id: NodeId) -> StoreResult<()> {
        if self.store.owns_node(user, node_id).await? {
            Ok(())
        } else {
            tracing::debug!(user_id = %user, node_id = %node_id, "Node ownership check failed");
            Err(StoreError::NotOwner {
                user,
                resource: Resource::Node(node_id),
            })
        }
    }

    // ========================================================================
    // Note Operations
    // ========================================================================

    pub async fn create_note(&self, user: UserId, title: &str) -> StoreResult<NoteId> {
        self.store.create_note(user, title).await
    }

    pub async fn get_note(&self, user: UserId, note_id: NoteId) -> StoreResult<Note> {
        self.require_note(user, note_id).await?;
        self.store.get_note(note_id).await
    }

    /// Public notes are readable without an acting user.
    pub async fn get_public_note(&self, public_id: Uuid) -> StoreResult<Note> {
        self.store.get_public_note(public_id).await
    }

    pub async fn list_notes(&self, user: UserId) -> StoreResult<Vec<NotePreview>> {
        self.store.list_notes(user).await
    }

    pub async fn update_title(&self, user: UserId, note_id: NoteId, title: &str) -> StoreResult<()> {
        self.require_note(user, note_id).await?;
        self.store.update_title(note_id, title).await
    }

    /// Returns the number of rows the update touched.
    pub async fn update_full_note(
        &self,
        user: UserId,
        note_id: NoteId,
        update: &FullNoteUpdate,
    ) -> StoreResult<u64> {
        self.require_note(user, note_id).await?;
        self.store.update_full_note(note_id, update).await
    }

    pub async fn archive(&self, user: UserId, note_id: NoteId) -> StoreResult<()> {
        self.require_note(user, note_id).await?;
        self.store.set_archived(note_id, true).await
    }

    pub async fn unarchive(&self, user: UserId, note_id: NoteId) -> StoreResult<()> {
        self.require_note(user, note_id).await?;
        self.store.set_archived(note_id, false).await
    }

    pub async fn make_public(&self, user: UserId, note_id: NoteId) -> StoreResult<()> {
        self.require_note(user, note_id).await?;
        self.store.set_public(note_id, true).await
    }

    pub async fn make_private(&self, user: UserId, note_id: NoteId) -> StoreResult<()> {
        self.require_note(user, note_id).await?;
        self.store.set_public(note_id, false).await
    }

    pub async fn delete_note(&self, user: UserId, note_id: NoteId) -> StoreResult<()> {
        self.require_note(user, note_id).await?;
        self.store.delete_note(note_id).await
    }

    pub async fn reorder_nodes(
        &self,
        user: UserId,
        note_id: NoteId,
        node_move: NodeMove,
    ) -> StoreResult<()> {
        self.require_note(user, note_id).await?;
        self.store.reorder_nodes(note_id, node_move).await
    }

    // ========================================================================
    // Node Operations
    // ========================================================================

    /// Append a node to a note the user owns.
    pub async fn append_node(
        &self,
        user: UserId,
        note_id: NoteId,
        node: &NewNode,
    ) -> StoreResult<NodeId> {
        self.require_note(user, note_id).await?;
        self.store.append_node(note_id, node).await
    }

    pub async fn update_node_content(
        &self,
        user: UserId,
        node_id: NodeId,
        content: &str,
    ) -> StoreResult<NoteId> {
        self.require_node(user, node_id).await?;
        self.store.update_node_content(node_id, content).await
    }

    pub async fn delete_node(&self, user: UserId, node_id: NodeId) -> StoreResult<NoteId> {
        self.require_node(user, node_id).await?;
        self.store.delete_node(node_id).await
    }
}
