use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Stored lifecycle status of a subscription.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, AsRefStr, Display,
    EnumString,
)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SubscriptionStatus {
    Created,
    Paid,
    PartialPayment,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    /// Cancelled subscriptions never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionStatus::Cancelled)
    }

    /// Status implied by a balance after a payment landed.
    pub fn from_balance(remaining_balance: i64) -> Self {
        if remaining_balance == 0 {
            SubscriptionStatus::Paid
        } else {
            SubscriptionStatus::PartialPayment
        }
    }
}

/// Read-time display state derived from status and validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DisplayState {
    Active,
    Inactive,
}
