//! Ownership checks.
//!
//! Node ownership is derived through the parent note; nodes carry no owner
//! column of their own.

use notekeep_core::{NodeId, NoteId, UserId};

use crate::capability::OwnershipGuard;
use crate::error::StoreResult;
use crate::store::Store;

impl OwnershipGuard for Store {
    async fn owns_note(&self, user_id: UserId, note_id: NoteId) -> StoreResult<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM notes WHERE id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(note_id.0)
        .bind(user_id.0)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }

    async fn owns_node(&self, user_id: UserId, node_id: NodeId) -> StoreResult<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM note_nodes nn
                JOIN notes n ON n.id = nn.note_id
                WHERE nn.id = $1 AND n.user_id = $2
            )
            "#,
        )
        .bind(node_id.0)
        .bind(user_id.0)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }
}
