use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Free plans run for this many years, which stands in for "indefinite".
pub const FREE_PLAN_YEARS: u32 = 99;

/// Default window for fixed commitment plans when no end date is given.
pub const FIXED_COMMITMENT_DEFAULT_MONTHS: u32 = 12;

/// Subscription plan offered by the academy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, AsRefStr, Display,
    EnumString,
)]
#[sqlx(type_name = "plan_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PlanType {
    Monthly,
    Quarterly,
    Yearly,
    FixedCommitment,
    Free,
    Custom,
}

impl PlanType {
    pub fn all() -> &'static [PlanType] {
        &[
            PlanType::Monthly,
            PlanType::Quarterly,
            PlanType::Yearly,
            PlanType::FixedCommitment,
            PlanType::Free,
            PlanType::Custom,
        ]
    }

    /// Fixed price in whole rupees. `None` for plans whose total is agreed per fighter.
    pub fn fixed_price(&self) -> Option<i64> {
        match self {
            PlanType::Monthly => Some(1500),
            PlanType::Quarterly => Some(4000),
            PlanType::Yearly => Some(15000),
            PlanType::Free => Some(0),
            PlanType::FixedCommitment | PlanType::Custom => None,
        }
    }

    /// Plans whose fee can be settled over several partial payments.
    pub fn supports_installments(&self) -> bool {
        matches!(self, PlanType::FixedCommitment | PlanType::Custom)
    }

    /// Plans a fighter can buy on their own through the gateway: only the
    /// ones priced by the table. Negotiated totals are set up by staff.
    pub fn is_self_serve(&self) -> bool {
        self.fixed_price().is_some_and(|price| price > 0)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlanType::Monthly => "Monthly",
            PlanType::Quarterly => "Quarterly",
            PlanType::Yearly => "Yearly",
            PlanType::FixedCommitment => "Fixed Commitment",
            PlanType::Free => "Free",
            PlanType::Custom => "Custom",
        }
    }

    /// Default length of the plan in months. Custom plans have none and need an explicit end date.
    pub fn default_months(&self) -> Option<u32> {
        match self {
            PlanType::Monthly => Some(1),
            PlanType::Quarterly => Some(3),
            PlanType::Yearly => Some(12),
            PlanType::FixedCommitment => Some(FIXED_COMMITMENT_DEFAULT_MONTHS),
            PlanType::Free => Some(FREE_PLAN_YEARS * 12),
            PlanType::Custom => None,
        }
    }

    /// End of the validity window when the plan starts at `start`.
    pub fn default_end_date(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.default_months()
            .and_then(|months| start.checked_add_months(Months::new(months)))
    }
}
