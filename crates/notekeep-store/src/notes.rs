//! Note lifecycle.
//!
//! Single-row updates report `NoteNotFound` when nothing matched so callers
//! can tell a missing note from a database failure.

use notekeep_core::{FullNoteUpdate, Note, NoteId, NoteNode, NotePreview, UserId, title_fits};
use sqlx::{PgConnection, postgres::PgQueryResult};
use uuid::Uuid;

use crate::capability::NoteStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{NewNode, NodeRow, NoteRow};
use crate::nodes::append_in;
use crate::store::Store;

const NOTE_COLUMNS: &str =
    "id, user_id, title, is_public, public_id, created_at, updated_at, archived_at";

fn check_title(title: &str) -> StoreResult<()> {
    if title_fits(title) {
        Ok(())
    } else {
        Err(StoreError::TitleTooLong(title.chars().count()))
    }
}

fn expect_row(result: PgQueryResult, note_id: NoteId) -> StoreResult<()> {
    if result.rows_affected() == 0 {
        Err(StoreError::NoteNotFound(note_id))
    } else {
        Ok(())
    }
}

async fn load_nodes(conn: &mut PgConnection, note_id: i64) -> StoreResult<Vec<NoteNode>> {
    let rows = sqlx::query_as::<_, NodeRow>(
        r#"
        SELECT id, note_id, "order", content_type, content
        FROM note_nodes
        WHERE note_id = $1
        ORDER BY "order"
        "#,
    )
    .bind(note_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(NoteNode::try_from).collect()
}

impl Store {
    /// Fetch a note row matching `filter` together with its nodes, from one
    /// snapshot.
    async fn fetch_note(&self, filter: &str, bind: NoteKey) -> StoreResult<Option<Note>> {
        let mut tx = self.pool().begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let sql = format!("SELECT {} FROM notes WHERE {}", NOTE_COLUMNS, filter);
        let query = sqlx::query_as::<_, NoteRow>(&sql);
        let row = match bind {
            NoteKey::Id(id) => query.bind(id.0),
            NoteKey::Public(public_id) => query.bind(public_id),
        }
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let nodes = load_nodes(&mut tx, row.id).await?;
        tx.commit().await?;

        Ok(Some(row.into_note(nodes)))
    }
}

enum NoteKey {
    Id(NoteId),
    Public(Uuid),
}

// ==================== Note Operations ====================

impl NoteStore for Store {
    async fn create_note(&self, user_id: UserId, title: &str) -> StoreResult<NoteId> {
        check_title(title)?;

        let mut tx = self.pool().begin().await?;

        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO notes (title, user_id, public_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(user_id.0)
        .bind(Uuid::new_v4())
        .fetch_one(&mut *tx)
        .await?;
        let note_id = NoteId(row.0);

        append_in(&mut tx, note_id, &NewNode::blank_text()).await?;
        tx.commit().await?;

        tracing::debug!(note_id = %note_id, user_id = %user_id, "Created note");
        Ok(note_id)
    }

    async fn get_note(&self, note_id: NoteId) -> StoreResult<Note> {
        self.fetch_note("id = $1", NoteKey::Id(note_id))
            .await?
            .ok_or(StoreError::NoteNotFound(note_id))
    }

    async fn get_public_note(&self, public_id: Uuid) -> StoreResult<Note> {
        // Private notes answer exactly like missing ones.
        self.fetch_note("public_id = $1 AND is_public", NoteKey::Public(public_id))
            .await?
            .ok_or(StoreError::PublicNoteNotFound(public_id))
    }

    async fn list_notes(&self, user_id: UserId) -> StoreResult<Vec<NotePreview>> {
        let sql = format!(
            "SELECT {} FROM notes WHERE user_id = $1 ORDER BY updated_at DESC, id DESC",
            NOTE_COLUMNS
        );
        let rows = sqlx::query_as::<_, NoteRow>(&sql)
            .bind(user_id.0)
            .fetch_all(self.pool())
            .await?;

        Ok(rows.into_iter().map(NotePreview::from).collect())
    }

    async fn update_title(&self, note_id: NoteId, title: &str) -> StoreResult<()> {
        check_title(title)?;

        let result = sqlx::query(
            r#"
            UPDATE notes SET title = $2, updated_at = NOW() WHERE id = $1
            "#,
        )
        .bind(note_id.0)
        .bind(title)
        .execute(self.pool())
        .await?;

        expect_row(result, note_id)
    }

    async fn set_public(&self, note_id: NoteId, is_public: bool) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE notes SET is_public = $2, updated_at = NOW() WHERE id = $1
            "#,
        )
        .bind(note_id.0)
        .bind(is_public)
        .execute(self.pool())
        .await?;

        expect_row(result, note_id)
    }

    async fn set_archived(&self, note_id: NoteId, archived: bool) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE notes
            SET archived_at = CASE WHEN $2 THEN COALESCE(archived_at, NOW()) ELSE NULL END
            WHERE id = $1
            "#,
        )
        .bind(note_id.0)
        .bind(archived)
        .execute(self.pool())
        .await?;

        expect_row(result, note_id)
    }

    async fn update_full_note(&self, note_id: NoteId, update: &FullNoteUpdate) -> StoreResult<u64> {
        check_title(&update.title)?;

        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE notes SET title = $2, updated_at = NOW() WHERE id = $1
            "#,
        )
        .bind(note_id.0)
        .bind(&update.title)
        .execute(&mut *tx)
        .await?;
        expect_row(result, note_id)?;

        let mut affected = 1;
        for node in &update.nodes {
            let result = sqlx::query(
                r#"
                UPDATE note_nodes SET content = $3 WHERE id = $1 AND note_id = $2
                "#,
            )
            .bind(node.id.0)
            .bind(note_id.0)
            .bind(&node.content)
            .execute(&mut *tx)
            .await?;
            affected += result.rows_affected();
        }

        tx.commit().await?;

        tracing::debug!(note_id = %note_id, affected, "Updated full note");
        Ok(affected)
    }

    async fn delete_note(&self, note_id: NoteId) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM notes WHERE id = $1
            "#,
        )
        .bind(note_id.0)
        .execute(self.pool())
        .await?;

        expect_row(result, note_id)?;
        tracing::debug!(note_id = %note_id, "Deleted note");
        Ok(())
    }
}
