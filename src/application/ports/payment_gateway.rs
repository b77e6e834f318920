use async_trait::async_trait;
use serde::Serialize;

use crate::app_error::{AppError, AppResult};

pub const CURRENCY: &str = "INR";

/// The gateway bills in the smallest currency unit.
pub const PAISE_PER_RUPEE: i64 = 100;

pub fn rupees_to_paise(rupees: i64) -> AppResult<i64> {
    rupees
        .checked_mul(PAISE_PER_RUPEE)
        .filter(|paise| *paise >= 0)
        .ok_or_else(|| AppError::InvalidInput(format!("Amount {rupees} cannot be charged")))
}

/// Order opened with the gateway, returned to the client for checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayOrder {
    pub id: String,
    pub amount_paise: i64,
    pub currency: String,
    pub receipt: String,
}

/// Payment gateway port. Order creation goes over the network; signature
/// checks are local.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id the checkout widget needs.
    fn key_id(&self) -> &str;

    async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
    ) -> AppResult<GatewayOrder>;

    /// True when `signature` is the gateway's HMAC over `order_id|payment_id`.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}
