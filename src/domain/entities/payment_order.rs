use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Why a gateway order was opened.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, AsRefStr, Display,
    EnumString,
)]
#[sqlx(type_name = "order_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderPurpose {
    /// First payment when a fighter buys a plan.
    Purchase,
    /// A later installment toward a commitment plan.
    Installment,
}

/// A gateway order awaiting its signed payment callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub order_id: String,
    pub subscription_id: Uuid,
    pub purpose: OrderPurpose,
    /// Whole rupees.
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl PaymentOrder {
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}
