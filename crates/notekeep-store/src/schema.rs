//! Schema definitions and migration utilities.

use sqlx::PgPool;

use crate::error::{StoreError, StoreResult};

/// Embedded migration SQL for the core schema (001_schema.sql).
pub const SCHEMA_MIGRATION: &str = include_str!("../../../migrations/001_schema.sql");

/// Run the schema migration against the database.
///
/// Idempotent; every object is created with `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the migration fails to execute.
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    tracing::info!("Running database migrations...");

    tracing::debug!("Running schema migration (001_schema.sql)...");
    sqlx::raw_sql(SCHEMA_MIGRATION)
        .execute(pool)
        .await
        .map_err(|e| StoreError::MigrationError(format!("Schema migration failed: {}", e)))?;

    tracing::info!("Migrations completed successfully");
    Ok(())
}

/// Check if the schema has been initialized.
///
/// Returns true if the `note_nodes` table exists.
pub async fn is_schema_initialized(pool: &PgPool) -> StoreResult<bool> {
    let result: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = 'note_nodes'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(result.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creates_all_tables() {
        for table in ["users", "notes", "note_nodes", "refresh_tokens"] {
            assert!(
                SCHEMA_MIGRATION.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table)),
                "missing table {}",
                table
            );
        }
    }

    #[test]
    fn test_nodes_cascade_with_note() {
        assert!(SCHEMA_MIGRATION.contains("REFERENCES notes (id) ON DELETE CASCADE"));
    }

    #[test]
    fn test_notes_and_sessions_cascade_with_user() {
        assert_eq!(
            SCHEMA_MIGRATION
                .matches("REFERENCES users (id) ON DELETE CASCADE")
                .count(),
            3
        );
    }

    #[test]
    fn test_node_order_unique_per_note() {
        assert!(SCHEMA_MIGRATION.contains("UNIQUE (note_id, \"order\")"));
    }

    #[test]
    fn test_title_column_width() {
        assert!(SCHEMA_MIGRATION.contains("VARCHAR(31)"));
    }
}
