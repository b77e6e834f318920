use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::payment_order::PaymentOrder,
    use_cases::subscription::PaymentOrderRepo,
};

#[async_trait]
impl PaymentOrderRepo for PostgresPersistence {
    async fn insert(&self, order: &PaymentOrder) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_orders
                (order_id, subscription_id, purpose, amount, created_at, consumed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&order.order_id)
        .bind(order.subscription_id)
        .bind(order.purpose)
        .bind(order.amount)
        .bind(order.created_at)
        .bind(order.consumed_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn get(&self, order_id: &str) -> AppResult<Option<PaymentOrder>> {
        let row = sqlx::query(
            r#"
            SELECT order_id, subscription_id, purpose, amount, created_at, consumed_at
            FROM payment_orders WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(|row| PaymentOrder {
            order_id: row.get("order_id"),
            subscription_id: row.get("subscription_id"),
            purpose: row.get("purpose"),
            amount: row.get("amount"),
            created_at: row.get("created_at"),
            consumed_at: row.get("consumed_at"),
        }))
    }

    async fn mark_consumed(&self, order_id: &str, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE payment_orders SET consumed_at = $2 WHERE order_id = $1 AND consumed_at IS NULL",
        )
        .bind(order_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, order_id: &str) -> AppResult<()> {
        sqlx::query("UPDATE payment_orders SET consumed_at = NULL WHERE order_id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
