//! User accounts.

use notekeep_core::{User, UserId};
use uuid::Uuid;

use crate::capability::CredentialStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{Credentials, NewUser, UserRow};
use crate::store::Store;

impl CredentialStore for Store {
    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::UserAlreadyExists(user.email.clone())
            }
            other => StoreError::Database(other),
        })?;

        tracing::debug!(user_id = %row.id, "Created user");
        Ok(row.into())
    }

    async fn find_credentials(&self, email: &str) -> StoreResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Credentials::from))
    }

    async fn get_user(&self, user_id: UserId) -> StoreResult<User> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.0)
        .fetch_optional(self.pool())
        .await?
        .map(User::from)
        .ok_or(StoreError::UserNotFound)
    }
}
