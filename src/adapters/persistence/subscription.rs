use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, types::Json};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, parse_json_with_fallback},
    app_error::{AppError, AppResult},
    domain::entities::{
        plan_type::PlanType,
        subscription::{PaymentEntry, Subscription},
        subscription_status::SubscriptionStatus,
    },
    use_cases::{
        Pagination,
        subscription::{SubscriptionFilter, SubscriptionRepo},
    },
};

const SELECT_COLS: &str = r#"
    id, fighter_id, plan_type, amount, total_fee, paid_amount, remaining_balance,
    installment_count, max_installments, start_date, end_date, status, is_active,
    razorpay_order_id, razorpay_payment_id, razorpay_signature, payment_history,
    version, created_at, updated_at
"#;

/// Same rule as `Subscription::effective_status`, evaluated in SQL so filters can page.
const EFFECTIVE_STATUS: &str = r#"
    CASE WHEN status <> 'cancelled' AND end_date < $3
         THEN 'expired'::subscription_status
         ELSE status END
"#;

fn row_to_subscription(row: &sqlx::postgres::PgRow) -> Subscription {
    let id: Uuid = row.get("id");
    let history_json: serde_json::Value = row.get("payment_history");
    let payment_history: Vec<PaymentEntry> = parse_json_with_fallback(
        &history_json,
        "payment_history",
        "subscription",
        &id.to_string(),
    );

    Subscription {
        id,
        fighter_id: row.get("fighter_id"),
        plan_type: row.get("plan_type"),
        amount: row.get("amount"),
        total_fee: row.get("total_fee"),
        paid_amount: row.get("paid_amount"),
        remaining_balance: row.get("remaining_balance"),
        installment_count: row.get("installment_count"),
        max_installments: row.get("max_installments"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status: row.get("status"),
        is_active: row.get("is_active"),
        razorpay_order_id: row.get("razorpay_order_id"),
        razorpay_payment_id: row.get("razorpay_payment_id"),
        razorpay_signature: row.get("razorpay_signature"),
        payment_history,
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn insert(&self, s: &Subscription) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions
                (id, fighter_id, plan_type, amount, total_fee, paid_amount, remaining_balance,
                 installment_count, max_installments, start_date, end_date, status, is_active,
                 razorpay_order_id, razorpay_payment_id, razorpay_signature, payment_history,
                 version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(s.id)
        .bind(s.fighter_id)
        .bind(s.plan_type)
        .bind(s.amount)
        .bind(s.total_fee)
        .bind(s.paid_amount)
        .bind(s.remaining_balance)
        .bind(s.installment_count)
        .bind(s.max_installments)
        .bind(s.start_date)
        .bind(s.end_date)
        .bind(s.status)
        .bind(s.is_active)
        .bind(&s.razorpay_order_id)
        .bind(&s.razorpay_payment_id)
        .bind(&s.razorpay_signature)
        .bind(Json(&s.payment_history))
        .bind(s.version)
        .bind(s.created_at)
        .bind(s.updated_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLS} FROM subscriptions WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn list(
        &self,
        filter: SubscriptionFilter,
        now: DateTime<Utc>,
        page: Pagination,
    ) -> AppResult<(Vec<Subscription>, i64)> {
        let where_clause = format!(
            "($1::plan_type IS NULL OR plan_type = $1) \
             AND ($2::subscription_status IS NULL OR {EFFECTIVE_STATUS} = $2)"
        );

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM subscriptions WHERE {where_clause}"
        ))
        .bind(filter.plan_type)
        .bind(filter.status)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLS} FROM subscriptions
            WHERE {where_clause}
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(filter.plan_type)
        .bind(filter.status)
        .bind(now)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok((rows.iter().map(row_to_subscription).collect(), total))
    }

    async fn list_by_fighter(&self, fighter_id: Uuid) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLS} FROM subscriptions WHERE fighter_id = $1 ORDER BY created_at DESC"
        ))
        .bind(fighter_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_subscription).collect())
    }

    async fn has_open_balance(&self, fighter_id: Uuid, plan_type: PlanType) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM subscriptions
                WHERE fighter_id = $1 AND plan_type = $2
                  AND status <> $3 AND remaining_balance > 0
            )
            "#,
        )
        .bind(fighter_id)
        .bind(plan_type)
        .bind(SubscriptionStatus::Cancelled)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(exists)
    }

    async fn update_guarded(&self, s: &Subscription) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions SET
                plan_type = $3,
                amount = $4,
                total_fee = $5,
                paid_amount = $6,
                remaining_balance = $7,
                installment_count = $8,
                max_installments = $9,
                start_date = $10,
                end_date = $11,
                status = $12,
                is_active = $13,
                razorpay_order_id = $14,
                razorpay_payment_id = $15,
                razorpay_signature = $16,
                payment_history = $17,
                updated_at = $18,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(s.id)
        .bind(s.version)
        .bind(s.plan_type)
        .bind(s.amount)
        .bind(s.total_fee)
        .bind(s.paid_amount)
        .bind(s.remaining_balance)
        .bind(s.installment_count)
        .bind(s.max_installments)
        .bind(s.start_date)
        .bind(s.end_date)
        .bind(s.status)
        .bind(s.is_active)
        .bind(&s.razorpay_order_id)
        .bind(&s.razorpay_payment_id)
        .bind(&s.razorpay_signature)
        .bind(Json(&s.payment_history))
        .bind(s.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn repair_installment_counts(&self) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                installment_count = jsonb_array_length(payment_history),
                version = version + 1,
                updated_at = now()
            WHERE installment_count <> jsonb_array_length(payment_history)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }
}
