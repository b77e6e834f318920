//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    fighter::Fighter,
    plan_type::PlanType,
    subscription::{DEFAULT_MAX_INSTALLMENTS, Subscription},
    subscription_status::SubscriptionStatus,
};

/// Password every seeded fighter can log in with.
pub const TEST_FIGHTER_PASSWORD: &str = "fighter-pass-1";

/// Create a test fighter with sensible defaults.
pub fn create_test_fighter(overrides: impl FnOnce(&mut Fighter)) -> Fighter {
    let id = Uuid::new_v4();
    let mut fighter = Fighter {
        id,
        name: "Test Fighter".to_string(),
        email: format!("fighter_{}@example.com", id.simple()),
        phone: Some("+91 98765 43210".to_string()),
        date_of_birth: None,
        address: None,
        emergency_contact: None,
        belt_rank: Some("white".to_string()),
        assessment: None,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut fighter);
    fighter
}

/// Create an unpaid monthly subscription running for the next 30 days.
pub fn create_test_subscription(
    fighter_id: Uuid,
    overrides: impl FnOnce(&mut Subscription),
) -> Subscription {
    let now = Utc::now();
    let mut subscription = Subscription {
        id: Uuid::new_v4(),
        fighter_id,
        plan_type: PlanType::Monthly,
        amount: 1500,
        total_fee: 1500,
        paid_amount: 0,
        remaining_balance: 1500,
        installment_count: 0,
        max_installments: DEFAULT_MAX_INSTALLMENTS,
        start_date: now - Duration::days(1),
        end_date: now + Duration::days(30),
        status: SubscriptionStatus::Created,
        is_active: false,
        razorpay_order_id: Some(format!("admin_created_{}", Uuid::new_v4().simple())),
        razorpay_payment_id: None,
        razorpay_signature: None,
        payment_history: Vec::new(),
        version: 0,
        created_at: now,
        updated_at: now,
    };
    overrides(&mut subscription);
    subscription
}

/// Fixed timestamp for deterministic fixtures.
pub fn test_datetime() -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_225_600, 0).unwrap_or_else(Utc::now)
}
