//! Session ledger backed by the `refresh_tokens` table.

use notekeep_core::SessionId;

use crate::capability::SessionLedger;
use crate::error::{StoreError, StoreResult};
use crate::models::{Session, SessionRow};
use crate::store::Store;

impl SessionLedger for Store {
    async fn create_session(&self, session: &Session) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, revoked)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.id.0)
        .bind(session.user_id.0)
        .bind(&session.token_hash)
        .bind(session.expires_at)
        .bind(session.revoked)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Session> {
        sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, token_hash, expires_at, revoked
            FROM refresh_tokens
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(self.pool())
        .await?
        .map(Session::from)
        .ok_or(StoreError::SessionNotFound(id))
    }

    async fn revoke_session(&self, id: SessionId) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(session_id = %id, "Revoke of unknown session ignored");
        }
        Ok(())
    }

    async fn sweep_expired(&self) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens WHERE expires_at < NOW()
            "#,
        )
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }
}
