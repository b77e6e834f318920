use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::role::Role,
    use_cases::auth::{AccountCredentials, AdminRepo},
};

#[async_trait]
impl AdminRepo for PostgresPersistence {
    async fn find_credentials(&self, email: &str) -> AppResult<Option<AccountCredentials>> {
        let row = sqlx::query("SELECT id, name, email, password_hash FROM admins WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(row.map(|row| AccountCredentials {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role: Role::Admin,
        }))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE admins SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Admin not found".into()));
        }
        Ok(())
    }
}
