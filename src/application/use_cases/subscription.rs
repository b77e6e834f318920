use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::{CURRENCY, PaymentGateway, rupees_to_paise},
        use_cases::{Actor, Paginated, Pagination, fighter::FighterRepo},
    },
    domain::entities::{
        payment_method::PaymentMethod,
        payment_order::{OrderPurpose, PaymentOrder},
        plan_type::PlanType,
        subscription::{InitialPayment, OpenSubscription, PlanChange, Subscription},
        subscription_status::{DisplayState, SubscriptionStatus},
    },
};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionFilter {
    pub plan_type: Option<PlanType>,
    /// Matched against the effective status, so `expired` includes lapsed rows.
    pub status: Option<SubscriptionStatus>,
}

/// A subscription as handed to clients, with read-time state attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub effective_status: SubscriptionStatus,
    pub display_state: DisplayState,
}

impl SubscriptionView {
    pub fn at(subscription: Subscription, now: DateTime<Utc>) -> Self {
        Self {
            effective_status: subscription.effective_status(now),
            display_state: subscription.display_state(now),
            subscription,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInfo {
    pub plan_type: PlanType,
    pub name: &'static str,
    pub price: Option<i64>,
    pub duration_months: Option<u32>,
    pub supports_installments: bool,
    pub self_serve: bool,
}

#[derive(Debug, Clone)]
pub struct AdminCreateSubscription {
    pub fighter_id: Uuid,
    pub plan_type: PlanType,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Only `created` or `paid`; ignored for installment plans.
    pub status: Option<SubscriptionStatus>,
    pub total_fee: Option<i64>,
    pub initial_payment: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
    pub max_installments: Option<i32>,
    pub force_create: bool,
}

/// Self-serve purchase of a table-priced plan. The price is never taken from the client.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub plan_type: PlanType,
    pub start_date: Option<DateTime<Utc>>,
}

/// Everything the client needs to open the gateway checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOrder {
    pub order_id: String,
    /// In paise.
    pub amount: i64,
    pub currency: String,
    pub subscription_id: Uuid,
    pub key_id: String,
}

#[derive(Debug, Clone)]
pub struct GatewayPayment {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub subscription_id: Uuid,
}

// ============================================================================
// Repository traits
// ============================================================================

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn insert(&self, subscription: &Subscription) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>>;
    /// Newest first.
    async fn list(
        &self,
        filter: SubscriptionFilter,
        now: DateTime<Utc>,
        page: Pagination,
    ) -> AppResult<(Vec<Subscription>, i64)>;
    async fn list_by_fighter(&self, fighter_id: Uuid) -> AppResult<Vec<Subscription>>;
    /// Whether the fighter holds an uncancelled plan of this type with money still owed.
    async fn has_open_balance(&self, fighter_id: Uuid, plan_type: PlanType) -> AppResult<bool>;
    /// Writes `next` only if the stored row still carries `next.version`.
    /// Returns the stored row (version bumped), or `None` when the guard failed.
    async fn update_guarded(&self, next: &Subscription) -> AppResult<Option<Subscription>>;
    /// Sets `installment_count` to the history length on drifted rows.
    async fn repair_installment_counts(&self) -> AppResult<u64>;
}

#[async_trait]
pub trait PaymentOrderRepo: Send + Sync {
    async fn insert(&self, order: &PaymentOrder) -> AppResult<()>;
    async fn get(&self, order_id: &str) -> AppResult<Option<PaymentOrder>>;
    /// Claims the order. False when it was already consumed.
    async fn mark_consumed(&self, order_id: &str, at: DateTime<Utc>) -> AppResult<bool>;
    /// Gives a claimed order back after the ledger write failed.
    async fn release(&self, order_id: &str) -> AppResult<()>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct SubscriptionUseCases {
    subscriptions: Arc<dyn SubscriptionRepo>,
    orders: Arc<dyn PaymentOrderRepo>,
    fighters: Arc<dyn FighterRepo>,
    gateway: Arc<dyn PaymentGateway>,
    default_max_installments: i32,
}

impl SubscriptionUseCases {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepo>,
        orders: Arc<dyn PaymentOrderRepo>,
        fighters: Arc<dyn FighterRepo>,
        gateway: Arc<dyn PaymentGateway>,
        default_max_installments: i32,
    ) -> Self {
        Self {
            subscriptions,
            orders,
            fighters,
            gateway,
            default_max_installments,
        }
    }

    pub fn plans(&self) -> Vec<PlanInfo> {
        PlanType::all()
            .iter()
            .map(|plan| PlanInfo {
                plan_type: *plan,
                name: plan.display_name(),
                price: plan.fixed_price(),
                duration_months: plan.default_months(),
                supports_installments: plan.supports_installments(),
                self_serve: plan.is_self_serve(),
            })
            .collect()
    }

    // ========================================================================
    // Creation
    // ========================================================================

    #[instrument(skip(self))]
    pub async fn admin_create(&self, input: AdminCreateSubscription) -> AppResult<SubscriptionView> {
        self.ensure_fighter_exists(input.fighter_id).await?;

        let mark_paid = match input.status {
            None | Some(SubscriptionStatus::Created) => false,
            Some(SubscriptionStatus::Paid) => !input.plan_type.supports_installments(),
            Some(other) => {
                return Err(AppError::InvalidInput(format!(
                    "New subscriptions start as created or paid, not {other}"
                )));
            }
        };

        let method = input.payment_method.unwrap_or(PaymentMethod::Cash);
        if !method.is_manual() {
            return Err(AppError::InvalidInput(
                "Admin payments must be recorded as upi or cash".into(),
            ));
        }

        if !input.force_create {
            self.ensure_no_open_balance(input.fighter_id, input.plan_type)
                .await?;
        }

        let now = Utc::now();
        let subscription = Subscription::open(
            OpenSubscription {
                fighter_id: input.fighter_id,
                plan_type: input.plan_type,
                start_date: input.start_date.unwrap_or(now),
                end_date: input.end_date,
                total_fee: input.total_fee,
                initial_payment: input.initial_payment.map(|amount| InitialPayment {
                    amount,
                    method,
                    transaction_id: None,
                }),
                mark_paid,
                max_installments: Some(
                    input.max_installments.unwrap_or(self.default_max_installments),
                ),
                razorpay_order_id: None,
            },
            now,
        )?;

        self.subscriptions.insert(&subscription).await?;
        tracing::info!(
            subscription_id = %subscription.id,
            fighter_id = %subscription.fighter_id,
            plan_type = %subscription.plan_type,
            total_fee = subscription.total_fee,
            paid_amount = subscription.paid_amount,
            status = %subscription.status,
            "Subscription created by admin"
        );
        Ok(SubscriptionView::at(subscription, now))
    }

    /// Opens a pending subscription and a gateway order for its first payment.
    #[instrument(skip(self))]
    pub async fn create_order(
        &self,
        fighter_id: Uuid,
        request: CheckoutRequest,
    ) -> AppResult<CheckoutOrder> {
        let plan_type = request.plan_type;
        if !plan_type.is_self_serve() {
            return Err(AppError::InvalidInput(format!(
                "{} plans cannot be purchased online",
                plan_type.display_name()
            )));
        }
        self.ensure_fighter_exists(fighter_id).await?;

        let now = Utc::now();
        let mut subscription = Subscription::open(
            OpenSubscription {
                fighter_id,
                plan_type,
                start_date: request.start_date.unwrap_or(now),
                end_date: None,
                total_fee: None,
                initial_payment: None,
                mark_paid: false,
                max_installments: Some(self.default_max_installments),
                razorpay_order_id: None,
            },
            now,
        )?;
        let charge = subscription.total_fee;

        let receipt = format!("sub_{}", subscription.id.simple());
        let order = self
            .gateway
            .create_order(rupees_to_paise(charge)?, CURRENCY, &receipt)
            .await?;

        subscription.razorpay_order_id = Some(order.id.clone());
        self.subscriptions.insert(&subscription).await?;
        self.orders
            .insert(&PaymentOrder {
                order_id: order.id.clone(),
                subscription_id: subscription.id,
                purpose: OrderPurpose::Purchase,
                amount: charge,
                created_at: now,
                consumed_at: None,
            })
            .await?;

        tracing::info!(
            subscription_id = %subscription.id,
            order_id = %order.id,
            plan_type = %plan_type,
            amount = charge,
            "Checkout order created"
        );
        Ok(CheckoutOrder {
            order_id: order.id,
            amount: order.amount_paise,
            currency: order.currency,
            subscription_id: subscription.id,
            key_id: self.gateway.key_id().to_string(),
        })
    }

    /// Gateway order for the next installment on a fighter's own subscription.
    #[instrument(skip(self))]
    pub async fn installment_order(
        &self,
        actor: Actor,
        subscription_id: Uuid,
        amount: i64,
    ) -> AppResult<CheckoutOrder> {
        let subscription = self.load(subscription_id).await?;
        if subscription.fighter_id != actor.id {
            return Err(AppError::Forbidden);
        }
        subscription.check_installment(amount)?;

        let receipt = format!(
            "inst_{}_{}",
            subscription.id.simple(),
            subscription.installment_count + 1
        );
        let order = self
            .gateway
            .create_order(rupees_to_paise(amount)?, CURRENCY, &receipt)
            .await?;
        self.orders
            .insert(&PaymentOrder {
                order_id: order.id.clone(),
                subscription_id,
                purpose: OrderPurpose::Installment,
                amount,
                created_at: Utc::now(),
                consumed_at: None,
            })
            .await?;

        tracing::info!(
            subscription_id = %subscription_id,
            order_id = %order.id,
            amount,
            "Installment order created"
        );
        Ok(CheckoutOrder {
            order_id: order.id,
            amount: order.amount_paise,
            currency: order.currency,
            subscription_id,
            key_id: self.gateway.key_id().to_string(),
        })
    }

    // ========================================================================
    // Payments
    // ========================================================================

    #[instrument(skip(self, payment), fields(order_id = %payment.order_id, subscription_id = %payment.subscription_id))]
    pub async fn verify_payment(
        &self,
        actor: Actor,
        payment: GatewayPayment,
    ) -> AppResult<SubscriptionView> {
        if !self.gateway.verify_signature(
            &payment.order_id,
            &payment.payment_id,
            &payment.signature,
        ) {
            tracing::warn!(
                order_id = %payment.order_id,
                payment_id = %payment.payment_id,
                "Payment signature mismatch"
            );
            return Err(AppError::PaymentVerificationFailed);
        }

        let order = self
            .orders
            .get(&payment.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment order not found".into()))?;
        if order.subscription_id != payment.subscription_id {
            return Err(AppError::InvalidInput(
                "Order does not belong to this subscription".into(),
            ));
        }
        if order.is_consumed() {
            return Err(AppError::Conflict("Payment already verified".into()));
        }

        let subscription = self.load(payment.subscription_id).await?;
        actor.ensure_can_access(subscription.fighter_id)?;

        let now = Utc::now();
        let next = match order.purpose {
            OrderPurpose::Purchase => subscription.settle_with_gateway(
                order.amount,
                &payment.order_id,
                &payment.payment_id,
                &payment.signature,
                now,
            )?,
            OrderPurpose::Installment => subscription.apply_gateway_installment(
                order.amount,
                &payment.order_id,
                &payment.payment_id,
                &payment.signature,
                now,
            )?,
        };

        if !self.orders.mark_consumed(&order.order_id, now).await? {
            return Err(AppError::Conflict("Payment already verified".into()));
        }
        let saved = match self.save(&next).await {
            Ok(saved) => saved,
            Err(err) => {
                self.orders.release(&order.order_id).await?;
                return Err(err);
            }
        };

        tracing::info!(
            subscription_id = %saved.id,
            payment_id = %payment.payment_id,
            amount = order.amount,
            paid_amount = saved.paid_amount,
            remaining_balance = saved.remaining_balance,
            status = %saved.status,
            "Gateway payment applied"
        );
        Ok(SubscriptionView::at(saved, now))
    }

    #[instrument(skip(self))]
    pub async fn record_installment(
        &self,
        subscription_id: Uuid,
        amount: i64,
        method: PaymentMethod,
    ) -> AppResult<SubscriptionView> {
        if !method.is_manual() {
            return Err(AppError::InvalidInput(
                "Installments recorded by staff must be upi or cash".into(),
            ));
        }
        let subscription = self.load(subscription_id).await?;
        let now = Utc::now();
        let transaction_id = format!("manual_{}", Uuid::new_v4().simple());
        let next = subscription.apply_installment(amount, method, transaction_id, now)?;
        let saved = self.save(&next).await?;

        tracing::info!(
            subscription_id = %saved.id,
            amount,
            method = %method,
            paid_amount = saved.paid_amount,
            remaining_balance = saved.remaining_balance,
            installment_count = saved.installment_count,
            status = %saved.status,
            "Installment recorded"
        );
        Ok(SubscriptionView::at(saved, now))
    }

    // ========================================================================
    // Admin edits
    // ========================================================================

    #[instrument(skip(self))]
    pub async fn cancel(&self, subscription_id: Uuid) -> AppResult<SubscriptionView> {
        let subscription = self.load(subscription_id).await?;
        let now = Utc::now();
        let saved = self.save(&subscription.cancel(now)?).await?;
        tracing::info!(subscription_id = %saved.id, status = %saved.status, "Subscription cancelled");
        Ok(SubscriptionView::at(saved, now))
    }

    #[instrument(skip(self))]
    pub async fn update_plan(
        &self,
        subscription_id: Uuid,
        change: PlanChange,
    ) -> AppResult<SubscriptionView> {
        let subscription = self.load(subscription_id).await?;
        let now = Utc::now();
        let saved = self.save(&subscription.change_plan(change, now)?).await?;
        tracing::info!(
            subscription_id = %saved.id,
            plan_type = %saved.plan_type,
            total_fee = saved.total_fee,
            remaining_balance = saved.remaining_balance,
            status = %saved.status,
            "Subscription plan updated"
        );
        Ok(SubscriptionView::at(saved, now))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    #[instrument(skip(self))]
    pub async fn list_all(
        &self,
        filter: SubscriptionFilter,
        page: Pagination,
    ) -> AppResult<Paginated<SubscriptionView>> {
        let now = Utc::now();
        let (items, total) = self.subscriptions.list(filter, now, page).await?;
        Ok(Paginated::new(items, page, total).map(|s| SubscriptionView::at(s, now)))
    }

    #[instrument(skip(self))]
    pub async fn list_for_fighter(&self, fighter_id: Uuid) -> AppResult<Vec<SubscriptionView>> {
        let now = Utc::now();
        Ok(self
            .subscriptions
            .list_by_fighter(fighter_id)
            .await?
            .into_iter()
            .map(|s| SubscriptionView::at(s, now))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, actor: Actor, subscription_id: Uuid) -> AppResult<SubscriptionView> {
        let subscription = self.load(subscription_id).await?;
        actor.ensure_can_access(subscription.fighter_id)?;
        Ok(SubscriptionView::at(subscription, Utc::now()))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn load(&self, id: Uuid) -> AppResult<Subscription> {
        self.subscriptions
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription not found".into()))
    }

    async fn save(&self, next: &Subscription) -> AppResult<Subscription> {
        self.subscriptions.update_guarded(next).await?.ok_or_else(|| {
            tracing::warn!(subscription_id = %next.id, version = next.version, "Stale subscription write rejected");
            AppError::Conflict("Subscription was modified concurrently, reload and retry".into())
        })
    }

    async fn ensure_fighter_exists(&self, fighter_id: Uuid) -> AppResult<()> {
        match self.fighters.get_by_id(fighter_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Fighter not found".into())),
        }
    }

    async fn ensure_no_open_balance(&self, fighter_id: Uuid, plan_type: PlanType) -> AppResult<()> {
        if plan_type.supports_installments()
            && self
                .subscriptions
                .has_open_balance(fighter_id, plan_type)
                .await?
        {
            return Err(AppError::InvalidInput(format!(
                "Fighter already has a {} subscription with an outstanding balance",
                plan_type.display_name()
            )));
        }
        Ok(())
    }
}
