use async_trait::async_trait;
use sqlx::{Row, types::Json};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, like_pattern, parse_json_with_fallback},
    app_error::{AppError, AppResult},
    domain::entities::{
        fighter::{Assessment, Fighter, FighterProfileUpdate},
        role::Role,
    },
    use_cases::{
        Pagination,
        auth::AccountCredentials,
        fighter::{FighterRepo, NewFighter},
    },
};

const SELECT_COLS: &str = r#"
    id, name, email, phone, date_of_birth, address, emergency_contact,
    belt_rank, assessment, created_at, updated_at
"#;

fn row_to_fighter(row: &sqlx::postgres::PgRow) -> Fighter {
    let id: Uuid = row.get("id");
    let assessment_json: Option<serde_json::Value> = row.get("assessment");
    let assessment: Option<Assessment> = parse_json_with_fallback(
        &assessment_json.unwrap_or(serde_json::Value::Null),
        "assessment",
        "fighter",
        &id.to_string(),
    );

    Fighter {
        id,
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        date_of_birth: row.get("date_of_birth"),
        address: row.get("address"),
        emergency_contact: row.get("emergency_contact"),
        belt_rank: row.get("belt_rank"),
        assessment,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl FighterRepo for PostgresPersistence {
    async fn create(&self, fighter: &NewFighter) -> AppResult<Fighter> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO fighters
                (id, name, email, password_hash, phone, date_of_birth, address,
                 emergency_contact, belt_rank)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&fighter.name)
        .bind(&fighter.email)
        .bind(&fighter.password_hash)
        .bind(&fighter.phone)
        .bind(fighter.date_of_birth)
        .bind(&fighter.address)
        .bind(&fighter.emergency_contact)
        .bind(&fighter.belt_rank)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_fighter(&row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Fighter>> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLS} FROM fighters WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_fighter))
    }

    async fn find_credentials(&self, email: &str) -> AppResult<Option<AccountCredentials>> {
        let row =
            sqlx::query("SELECT id, name, email, password_hash FROM fighters WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(AppError::from)?;

        Ok(row.map(|row| AccountCredentials {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role: Role::Fighter,
        }))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE fighters SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Fighter not found".into()));
        }
        Ok(())
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: Pagination,
    ) -> AppResult<(Vec<Fighter>, i64)> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM fighters WHERE $1::text IS NULL OR name ILIKE $1 OR email ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLS} FROM fighters
            WHERE $1::text IS NULL OR name ILIKE $1 OR email ILIKE $1
            ORDER BY created_at DESC, name ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&pattern)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok((rows.iter().map(row_to_fighter).collect(), total))
    }

    async fn list_without_subscription(&self, page: Pagination) -> AppResult<(Vec<Fighter>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM fighters f
            WHERE NOT EXISTS (SELECT 1 FROM subscriptions s WHERE s.fighter_id = f.id)
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLS} FROM fighters f
            WHERE NOT EXISTS (SELECT 1 FROM subscriptions s WHERE s.fighter_id = f.id)
            ORDER BY created_at DESC, name ASC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok((rows.iter().map(row_to_fighter).collect(), total))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: &FighterProfileUpdate,
    ) -> AppResult<Option<Fighter>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE fighters SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                date_of_birth = COALESCE($4, date_of_birth),
                address = COALESCE($5, address),
                emergency_contact = COALESCE($6, emergency_contact),
                belt_rank = COALESCE($7, belt_rank),
                updated_at = now()
            WHERE id = $1
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.phone)
        .bind(update.date_of_birth)
        .bind(&update.address)
        .bind(&update.emergency_contact)
        .bind(&update.belt_rank)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_fighter))
    }

    async fn set_assessment(
        &self,
        id: Uuid,
        assessment: &Assessment,
    ) -> AppResult<Option<Fighter>> {
        let row = sqlx::query(&format!(
            "UPDATE fighters SET assessment = $2, updated_at = now() WHERE id = $1 RETURNING {SELECT_COLS}"
        ))
        .bind(id)
        .bind(Json(assessment))
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_fighter))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        // Subscriptions and their orders go with the fighter via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM fighters WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
