//! Node sequencer.
//!
//! Keeps the node orders of every note exactly `0..n`. Each operation runs in
//! one transaction that starts by locking the parent `notes` row with
//! `SELECT ... FOR UPDATE`, so all order mutations of one note serialize on
//! that lock under READ COMMITTED. Every mutation also refreshes the parent
//! note's `updated_at` inside the same transaction.
//!
//! Renumbering is done with single bulk UPDATE statements. The
//! `(note_id, "order")` uniqueness constraint is checked at statement end, so
//! the transient duplicates of a bulk shift are legal.

use notekeep_core::{NodeId, NoteId, NoteNode};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};

use crate::capability::NodeSequencer;
use crate::error::{StoreError, StoreResult};
use crate::models::{NewNode, NodeRow};
use crate::store::Store;

/// A move of the node at `old_order` to `new_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMove {
    pub old_order: i32,
    pub new_order: i32,
}

impl NodeMove {
    pub const fn new(old_order: i32, new_order: i32) -> Self {
        Self {
            old_order,
            new_order,
        }
    }

    /// Check the target order against the live node count of the note.
    pub fn validate(&self, note_id: NoteId, count: i64) -> StoreResult<()> {
        if self.new_order < 0 || i64::from(self.new_order) >= count {
            return Err(StoreError::OrderOutOfRange {
                note_id,
                new_order: self.new_order,
                count,
            });
        }
        Ok(())
    }

    /// Order that a node currently at `order` holds after the move.
    ///
    /// Mirrors the CASE expression of the bulk reorder statement.
    pub fn target_of(&self, order: i32) -> i32 {
        let (old, new) = (self.old_order, self.new_order);
        if order == old {
            new
        } else if old < new && order > old && order <= new {
            order - 1
        } else if old > new && order < old && order >= new {
            order + 1
        } else {
            order
        }
    }
}

// ==================== Transaction helpers ====================

/// Lock the note row for the rest of the transaction.
pub(crate) async fn lock_note(
    tx: &mut Transaction<'_, Postgres>,
    note_id: NoteId,
) -> StoreResult<()> {
    let locked: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT id FROM notes WHERE id = $1 FOR UPDATE
        "#,
    )
    .bind(note_id.0)
    .fetch_optional(&mut **tx)
    .await?;

    locked
        .map(|_| ())
        .ok_or(StoreError::NoteNotFound(note_id))
}

/// Refresh the note's `updated_at`.
pub(crate) async fn touch_note(
    tx: &mut Transaction<'_, Postgres>,
    note_id: NoteId,
) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE notes SET updated_at = NOW() WHERE id = $1
        "#,
    )
    .bind(note_id.0)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NoteNotFound(note_id));
    }
    Ok(())
}

/// Parent note of a node, read without locking the node row. Callers lock
/// the note before touching any node row so every writer takes locks in the
/// same order.
async fn parent_of(tx: &mut Transaction<'_, Postgres>, node_id: NodeId) -> StoreResult<NoteId> {
    let parent: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT note_id FROM note_nodes WHERE id = $1
        "#,
    )
    .bind(node_id.0)
    .fetch_optional(&mut **tx)
    .await?;

    parent
        .map(|(id,)| NoteId(id))
        .ok_or(StoreError::NodeNotFound(node_id))
}

async fn count_nodes(tx: &mut Transaction<'_, Postgres>, note_id: NoteId) -> StoreResult<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM note_nodes WHERE note_id = $1
        "#,
    )
    .bind(note_id.0)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row.0)
}

/// Append a node inside an open transaction. The caller commits.
pub(crate) async fn append_in(
    tx: &mut Transaction<'_, Postgres>,
    note_id: NoteId,
    node: &NewNode,
) -> StoreResult<NodeId> {
    lock_note(tx, note_id).await?;

    let count = count_nodes(tx, note_id).await?;
    let order = i32::try_from(count)
        .map_err(|_| StoreError::Corrupt(format!("note {} has {} nodes", note_id, count)))?;

    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO note_nodes (note_id, "order", content_type, content)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(note_id.0)
    .bind(order)
    .bind(node.content_type.as_str())
    .bind(&node.content)
    .fetch_one(&mut **tx)
    .await?;

    touch_note(tx, note_id).await?;

    Ok(NodeId(row.0))
}

// ==================== Sequencer Operations ====================

impl NodeSequencer for Store {
    async fn append_node(&self, note_id: NoteId, node: &NewNode) -> StoreResult<NodeId> {
        let mut tx = self.pool().begin().await?;
        let node_id = append_in(&mut tx, note_id, node).await?;
        tx.commit().await?;

        tracing::debug!(note_id = %note_id, node_id = %node_id, "Appended node");
        Ok(node_id)
    }

    async fn update_node_content(&self, node_id: NodeId, content: &str) -> StoreResult<NoteId> {
        let mut tx = self.pool().begin().await?;

        let note_id = parent_of(&mut tx, node_id).await?;
        lock_note(&mut tx, note_id).await?;

        let updated = sqlx::query(
            r#"
            UPDATE note_nodes SET content = $3 WHERE id = $1 AND note_id = $2
            "#,
        )
        .bind(node_id.0)
        .bind(note_id.0)
        .bind(content)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NodeNotFound(node_id));
        }
        touch_note(&mut tx, note_id).await?;
        tx.commit().await?;

        tracing::debug!(note_id = %note_id, node_id = %node_id, "Updated node content");
        Ok(note_id)
    }

    async fn reorder_nodes(&self, note_id: NoteId, node_move: NodeMove) -> StoreResult<()> {
        let mut tx = self.pool().begin().await?;
        lock_note(&mut tx, note_id).await?;

        let count = count_nodes(&mut tx, note_id).await?;
        node_move.validate(note_id, count)?;

        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM note_nodes WHERE note_id = $1 AND "order" = $2
            )
            "#,
        )
        .bind(note_id.0)
        .bind(node_move.old_order)
        .fetch_one(&mut *tx)
        .await?;

        if !exists.0 {
            return Err(StoreError::NodeOrderNotFound {
                note_id,
                order: node_move.old_order,
            });
        }

        let result = sqlx::query(
            r#"
            UPDATE note_nodes
            SET "order" = CASE
                WHEN "order" = $2 THEN $3
                WHEN $2 < $3 AND "order" > $2 AND "order" <= $3 THEN "order" - 1
                WHEN $2 > $3 AND "order" < $2 AND "order" >= $3 THEN "order" + 1
                ELSE "order"
            END
            WHERE note_id = $1
              AND "order" BETWEEN LEAST($2, $3) AND GREATEST($2, $3)
            "#,
        )
        .bind(note_id.0)
        .bind(node_move.old_order)
        .bind(node_move.new_order)
        .execute(&mut *tx)
        .await?;

        touch_note(&mut tx, note_id).await?;
        tx.commit().await?;

        tracing::debug!(
            note_id = %note_id,
            old_order = node_move.old_order,
            new_order = node_move.new_order,
            shifted = result.rows_affected(),
            "Reordered nodes"
        );
        Ok(())
    }

    async fn delete_node(&self, node_id: NodeId) -> StoreResult<NoteId> {
        let mut tx = self.pool().begin().await?;

        let note_id = parent_of(&mut tx, node_id).await?;
        lock_note(&mut tx, note_id).await?;

        // Re-read under the lock; a concurrent delete may have won.
        let deleted: Option<(i32,)> = sqlx::query_as(
            r#"
            DELETE FROM note_nodes WHERE id = $1 AND note_id = $2
            RETURNING "order"
            "#,
        )
        .bind(node_id.0)
        .bind(note_id.0)
        .fetch_optional(&mut *tx)
        .await?;
        let order = deleted.ok_or(StoreError::NodeNotFound(node_id))?.0;

        sqlx::query(
            r#"
            UPDATE note_nodes SET "order" = "order" - 1
            WHERE note_id = $1 AND "order" > $2
            "#,
        )
        .bind(note_id.0)
        .bind(order)
        .execute(&mut *tx)
        .await?;

        touch_note(&mut tx, note_id).await?;
        tx.commit().await?;

        tracing::debug!(note_id = %note_id, node_id = %node_id, order, "Deleted node");
        Ok(note_id)
    }

    async fn list_nodes(&self, note_id: NoteId) -> StoreResult<Vec<NoteNode>> {
        let rows = sqlx::query_as::<_, NodeRow>(
            r#"
            SELECT id, note_id, "order", content_type, content
            FROM note_nodes
            WHERE note_id = $1
            ORDER BY "order"
            "#,
        )
        .bind(note_id.0)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(NoteNode::try_from).collect()
    }
}
