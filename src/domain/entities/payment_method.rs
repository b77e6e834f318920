use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// How an installment was paid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PaymentMethod {
    Upi,
    Cash,
    /// Settled through the online gateway.
    Razorpay,
}

impl PaymentMethod {
    /// Methods an admin may record by hand at the front desk.
    pub fn is_manual(&self) -> bool {
        matches!(self, PaymentMethod::Upi | PaymentMethod::Cash)
    }
}
