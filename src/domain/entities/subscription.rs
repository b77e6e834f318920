use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{
    payment_method::PaymentMethod,
    plan_type::PlanType,
    subscription_status::{DisplayState, SubscriptionStatus},
};

pub const DEFAULT_MAX_INSTALLMENTS: i32 = 4;
pub const MAX_INSTALLMENTS_CAP: i32 = 12;
/// Upper bound on a negotiated total, in rupees.
pub const MAX_TOTAL_FEE: i64 = 10_000_000;

/// Prefix of the order id stored when no gateway order backs a subscription.
pub const ADMIN_ORDER_PREFIX: &str = "admin_created_";

/// Ledger rule violations. None of them change the record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Subscription is cancelled")]
    Cancelled,

    #[error("Plan type {0} does not accept installments")]
    NotInstallmentPlan(PlanType),

    #[error("Payment amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Payment amount {amount} exceeds remaining balance {remaining}")]
    ExceedsBalance { amount: i64, remaining: i64 },

    #[error("Maximum number of installments ({max}) reached")]
    InstallmentLimitReached { max: i32 },

    #[error("Subscription is already paid")]
    AlreadyPaid,

    #[error("Gateway charged {charged} but the balance is now {remaining}")]
    ChargeMismatch { charged: i64, remaining: i64 },

    #[error("Total fee {total} is below the amount already paid ({paid})")]
    TotalBelowPaid { total: i64, paid: i64 },

    #[error("{0}")]
    Invalid(String),
}

/// One entry of the append-only payment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEntry {
    pub date: DateTime<Utc>,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub fighter_id: Uuid,
    pub plan_type: PlanType,
    pub amount: i64,
    pub total_fee: i64,
    pub paid_amount: i64,
    pub remaining_balance: i64,
    pub installment_count: i32,
    pub max_installments: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
    pub is_active: bool,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    pub payment_history: Vec<PaymentEntry>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payment taken at the moment the subscription is opened.
#[derive(Debug, Clone)]
pub struct InitialPayment {
    pub amount: i64,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
}

/// Everything needed to open a new subscription.
#[derive(Debug, Clone)]
pub struct OpenSubscription {
    pub fighter_id: Uuid,
    pub plan_type: PlanType,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub total_fee: Option<i64>,
    pub initial_payment: Option<InitialPayment>,
    /// Admin marked the subscription as settled up front.
    pub mark_paid: bool,
    pub max_installments: Option<i32>,
    pub razorpay_order_id: Option<String>,
}

/// Changes an admin can make to an existing plan.
#[derive(Debug, Clone, Default)]
pub struct PlanChange {
    pub plan_type: Option<PlanType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub total_fee: Option<i64>,
}

fn admin_order_id() -> String {
    format!("{}{}", ADMIN_ORDER_PREFIX, Uuid::new_v4().simple())
}

fn resolve_total(plan_type: PlanType, total_fee: Option<i64>) -> Result<i64, LedgerError> {
    match plan_type.fixed_price() {
        Some(price) => Ok(price),
        None => match total_fee {
            Some(fee) if fee > 0 && fee <= MAX_TOTAL_FEE => Ok(fee),
            Some(fee) if fee > MAX_TOTAL_FEE => Err(LedgerError::Invalid(format!(
                "Total fee cannot exceed {MAX_TOTAL_FEE}"
            ))),
            Some(_) => Err(LedgerError::Invalid(
                "Total fee must be greater than zero".into(),
            )),
            None => Err(LedgerError::Invalid(format!(
                "Total fee is required for {} plans",
                plan_type
            ))),
        },
    }
}

fn resolve_window(
    plan_type: PlanType,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>, LedgerError> {
    // Free plans always get the sentinel window, whatever the caller sent.
    let end = if plan_type == PlanType::Free {
        plan_type.default_end_date(start)
    } else {
        end.or_else(|| plan_type.default_end_date(start))
    };
    let end = end.ok_or_else(|| {
        LedgerError::Invalid(format!("End date is required for {} plans", plan_type))
    })?;
    if end <= start {
        return Err(LedgerError::Invalid(
            "End date must be after start date".into(),
        ));
    }
    Ok(end)
}

impl Subscription {
    /// Build a fresh ledger record. Pure: nothing is persisted.
    pub fn open(params: OpenSubscription, now: DateTime<Utc>) -> Result<Self, LedgerError> {
        let plan_type = params.plan_type;
        let total_fee = resolve_total(plan_type, params.total_fee)?;
        let end_date = resolve_window(plan_type, params.start_date, params.end_date)?;

        let max_installments = params.max_installments.unwrap_or(DEFAULT_MAX_INSTALLMENTS);
        if !(1..=MAX_INSTALLMENTS_CAP).contains(&max_installments) {
            return Err(LedgerError::Invalid(format!(
                "Max installments must be between 1 and {}",
                MAX_INSTALLMENTS_CAP
            )));
        }

        let mut sub = Subscription {
            id: Uuid::new_v4(),
            fighter_id: params.fighter_id,
            plan_type,
            amount: total_fee,
            total_fee,
            paid_amount: 0,
            remaining_balance: total_fee,
            installment_count: 0,
            max_installments,
            start_date: params.start_date,
            end_date,
            status: SubscriptionStatus::Created,
            is_active: false,
            razorpay_order_id: Some(params.razorpay_order_id.unwrap_or_else(admin_order_id)),
            razorpay_payment_id: None,
            razorpay_signature: None,
            payment_history: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        };

        if plan_type == PlanType::Free {
            sub.set_status(SubscriptionStatus::Paid);
            return Ok(sub);
        }

        let initial = match (params.initial_payment, params.mark_paid) {
            (Some(payment), _) => Some(payment),
            (None, true) => Some(InitialPayment {
                amount: total_fee,
                method: PaymentMethod::Cash,
                transaction_id: None,
            }),
            (None, false) => None,
        };

        if let Some(payment) = initial {
            if !plan_type.supports_installments() && payment.amount != total_fee {
                return Err(LedgerError::Invalid(format!(
                    "{} plans must be paid in full ({})",
                    plan_type.display_name(),
                    total_fee
                )));
            }
            let transaction_id = payment
                .transaction_id
                .or_else(|| sub.razorpay_order_id.clone())
                .unwrap_or_else(admin_order_id);
            sub.push_payment(payment.amount, payment.method, transaction_id, now)?;
        }

        Ok(sub)
    }

    /// Validate an installment without applying it.
    pub fn check_installment(&self, amount: i64) -> Result<(), LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::Cancelled);
        }
        if !self.plan_type.supports_installments() {
            return Err(LedgerError::NotInstallmentPlan(self.plan_type));
        }
        self.check_payment(amount)
    }

    /// Apply a partial payment, returning the updated record.
    pub fn apply_installment(
        &self,
        amount: i64,
        method: PaymentMethod,
        transaction_id: String,
        now: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        self.check_installment(amount)?;
        let mut next = self.clone();
        next.push_payment(amount, method, transaction_id, now)?;
        next.updated_at = now;
        Ok(next)
    }

    /// Settle the remaining balance with a verified gateway payment of `charged`.
    /// The charge must match the balance exactly; a plan edited after checkout
    /// is left for staff to reconcile.
    pub fn settle_with_gateway(
        &self,
        charged: i64,
        order_id: &str,
        payment_id: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::Cancelled);
        }
        if self.status == SubscriptionStatus::Paid {
            return Err(LedgerError::AlreadyPaid);
        }
        if charged != self.remaining_balance {
            return Err(LedgerError::ChargeMismatch {
                charged,
                remaining: self.remaining_balance,
            });
        }
        let mut next = self.clone();
        next.push_payment(charged, PaymentMethod::Razorpay, payment_id.to_string(), now)?;
        next.record_gateway_ids(order_id, payment_id, signature);
        next.updated_at = now;
        Ok(next)
    }

    /// Apply a verified gateway payment as one installment.
    pub fn apply_gateway_installment(
        &self,
        amount: i64,
        order_id: &str,
        payment_id: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        let mut next =
            self.apply_installment(amount, PaymentMethod::Razorpay, payment_id.to_string(), now)?;
        next.record_gateway_ids(order_id, payment_id, signature);
        Ok(next)
    }

    pub fn cancel(&self, now: DateTime<Utc>) -> Result<Self, LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::Cancelled);
        }
        let mut next = self.clone();
        next.set_status(SubscriptionStatus::Cancelled);
        next.updated_at = now;
        Ok(next)
    }

    /// Rework plan type, window, or fee while keeping payments already made.
    pub fn change_plan(&self, change: PlanChange, now: DateTime<Utc>) -> Result<Self, LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::Cancelled);
        }
        let plan_type = change.plan_type.unwrap_or(self.plan_type);
        let start_date = change.start_date.unwrap_or(self.start_date);

        let total_fee = match (plan_type.fixed_price(), change.total_fee) {
            (Some(price), _) => price,
            (None, Some(fee)) => resolve_total(plan_type, Some(fee))?,
            (None, None) if self.plan_type == plan_type => self.total_fee,
            (None, None) => resolve_total(plan_type, None)?,
        };
        if total_fee < self.paid_amount {
            return Err(LedgerError::TotalBelowPaid {
                total: total_fee,
                paid: self.paid_amount,
            });
        }

        let requested_end = match change.end_date {
            Some(end) => Some(end),
            // Keep the old window unless the plan or start moved.
            None if change.plan_type.is_none() && change.start_date.is_none() => {
                Some(self.end_date)
            }
            None => None,
        };
        let end_date = resolve_window(plan_type, start_date, requested_end)?;

        let mut next = self.clone();
        next.plan_type = plan_type;
        next.start_date = start_date;
        next.end_date = end_date;
        next.amount = total_fee;
        next.total_fee = total_fee;
        next.remaining_balance = total_fee - next.paid_amount;

        let status = if next.remaining_balance == 0 && (next.paid_amount > 0 || total_fee == 0) {
            SubscriptionStatus::Paid
        } else if next.paid_amount > 0 {
            SubscriptionStatus::PartialPayment
        } else if self.status == SubscriptionStatus::Expired {
            SubscriptionStatus::Expired
        } else {
            SubscriptionStatus::Created
        };
        next.set_status(status);
        next.updated_at = now;
        Ok(next)
    }

    /// Status as seen by readers: a lapsed window reads as expired.
    pub fn effective_status(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        if self.status != SubscriptionStatus::Cancelled && self.end_date < now {
            SubscriptionStatus::Expired
        } else {
            self.status
        }
    }

    pub fn display_state(&self, now: DateTime<Utc>) -> DisplayState {
        if self.effective_status(now) == SubscriptionStatus::Paid {
            DisplayState::Active
        } else {
            DisplayState::Inactive
        }
    }

    /// `installmentCount` must mirror the history length.
    pub fn has_consistent_counts(&self) -> bool {
        self.installment_count as usize == self.payment_history.len()
            && self.paid_amount + self.remaining_balance == self.total_fee
    }

    fn check_payment(&self, amount: i64) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount);
        }
        if self.installment_count >= self.max_installments {
            return Err(LedgerError::InstallmentLimitReached {
                max: self.max_installments,
            });
        }
        if amount > self.remaining_balance {
            return Err(LedgerError::ExceedsBalance {
                amount,
                remaining: self.remaining_balance,
            });
        }
        Ok(())
    }

    fn push_payment(
        &mut self,
        amount: i64,
        method: PaymentMethod,
        transaction_id: String,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.check_payment(amount)?;
        self.payment_history.push(PaymentEntry {
            date: now,
            amount,
            payment_method: method,
            transaction_id,
        });
        self.paid_amount += amount;
        self.remaining_balance = self.total_fee - self.paid_amount;
        self.installment_count = self.payment_history.len() as i32;
        self.set_status(SubscriptionStatus::from_balance(self.remaining_balance));
        Ok(())
    }

    fn record_gateway_ids(&mut self, order_id: &str, payment_id: &str, signature: &str) {
        self.razorpay_order_id = Some(order_id.to_string());
        self.razorpay_payment_id = Some(payment_id.to_string());
        self.razorpay_signature = Some(signature.to_string());
    }

    fn set_status(&mut self, status: SubscriptionStatus) {
        self.status = status;
        self.is_active = status == SubscriptionStatus::Paid;
    }
}
