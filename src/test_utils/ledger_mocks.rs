//! In-memory mocks for fighters, subscriptions, payment orders, and the gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        password::hash_password,
        ports::payment_gateway::{GatewayOrder, PaymentGateway},
        use_cases::{
            Pagination,
            auth::AccountCredentials,
            fighter::{FighterRepo, NewFighter},
            subscription::{PaymentOrderRepo, SubscriptionFilter, SubscriptionRepo},
        },
    },
    domain::entities::{
        fighter::{Assessment, Fighter, FighterProfileUpdate},
        payment_order::PaymentOrder,
        plan_type::PlanType,
        role::Role,
        subscription::Subscription,
        subscription_status::SubscriptionStatus,
    },
    infra::payment_signature::{sign_payment, verify_payment_signature},
    test_utils::factories::TEST_FIGHTER_PASSWORD,
};

fn paginate<T>(mut items: Vec<T>, page: Pagination) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let start = (page.offset() as usize).min(items.len());
    let mut rest = items.split_off(start);
    rest.truncate(page.limit as usize);
    (rest, total)
}

// ============================================================================
// InMemoryFighterRepo
// ============================================================================

#[derive(Clone)]
struct FighterRecord {
    fighter: Fighter,
    password_hash: String,
}

/// In-memory implementation of FighterRepo for testing.
#[derive(Default)]
pub struct InMemoryFighterRepo {
    records: Mutex<HashMap<Uuid, FighterRecord>>,
    subscriptions: Option<Arc<InMemorySubscriptionRepo>>,
}

impl InMemoryFighterRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed fighters; each can log in with `TEST_FIGHTER_PASSWORD`.
    pub fn with_fighters(fighters: Vec<Fighter>) -> Self {
        let password_hash = hash_password(TEST_FIGHTER_PASSWORD).unwrap();
        let records = fighters
            .into_iter()
            .map(|fighter| {
                (
                    fighter.id,
                    FighterRecord {
                        fighter,
                        password_hash: password_hash.clone(),
                    },
                )
            })
            .collect();
        Self {
            records: Mutex::new(records),
            subscriptions: None,
        }
    }

    /// Share subscription state so anti-joins and cascades behave like Postgres.
    pub fn linked_to(mut self, subscriptions: Arc<InMemorySubscriptionRepo>) -> Self {
        self.subscriptions = Some(subscriptions);
        self
    }

    pub fn password_hash_for(&self, email: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.fighter.email == email)
            .map(|r| r.password_hash.clone())
    }

    pub fn get_all(&self) -> Vec<Fighter> {
        self.records
            .lock()
            .unwrap()
            .values()
            .map(|r| r.fighter.clone())
            .collect()
    }

    fn sorted(&self, keep: impl Fn(&Fighter) -> bool) -> Vec<Fighter> {
        let mut fighters: Vec<Fighter> = self
            .records
            .lock()
            .unwrap()
            .values()
            .map(|r| r.fighter.clone())
            .filter(|f| keep(f))
            .collect();
        fighters.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.name.cmp(&b.name)));
        fighters
    }
}

#[async_trait]
impl FighterRepo for InMemoryFighterRepo {
    async fn create(&self, new: &NewFighter) -> AppResult<Fighter> {
        let mut records = self.records.lock().unwrap();
        if records.values().any(|r| r.fighter.email == new.email) {
            return Err(AppError::InvalidInput(
                "A record with this value already exists".into(),
            ));
        }
        let now = Utc::now();
        let fighter = Fighter {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            date_of_birth: new.date_of_birth,
            address: new.address.clone(),
            emergency_contact: new.emergency_contact.clone(),
            belt_rank: new.belt_rank.clone(),
            assessment: None,
            created_at: now,
            updated_at: now,
        };
        records.insert(
            fighter.id,
            FighterRecord {
                fighter: fighter.clone(),
                password_hash: new.password_hash.clone(),
            },
        );
        Ok(fighter)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Fighter>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&id)
            .map(|r| r.fighter.clone()))
    }

    async fn find_credentials(&self, email: &str) -> AppResult<Option<AccountCredentials>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.fighter.email == email)
            .map(|r| AccountCredentials {
                id: r.fighter.id,
                name: r.fighter.name.clone(),
                email: r.fighter.email.clone(),
                password_hash: r.password_hash.clone(),
                role: Role::Fighter,
            }))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Fighter not found".into()))?;
        record.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: Pagination,
    ) -> AppResult<(Vec<Fighter>, i64)> {
        let needle = search.map(str::to_lowercase);
        let fighters = self.sorted(|f| match &needle {
            Some(n) => f.name.to_lowercase().contains(n) || f.email.contains(n),
            None => true,
        });
        Ok(paginate(fighters, page))
    }

    async fn list_without_subscription(&self, page: Pagination) -> AppResult<(Vec<Fighter>, i64)> {
        let subscribed = self
            .subscriptions
            .as_ref()
            .map(|s| s.fighter_ids())
            .unwrap_or_default();
        let fighters = self.sorted(|f| !subscribed.contains(&f.id));
        Ok(paginate(fighters, page))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: &FighterProfileUpdate,
    ) -> AppResult<Option<Fighter>> {
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.get_mut(&id) else {
            return Ok(None);
        };
        let f = &mut record.fighter;
        if let Some(name) = &update.name {
            f.name = name.clone();
        }
        if let Some(phone) = &update.phone {
            f.phone = Some(phone.clone());
        }
        if let Some(dob) = update.date_of_birth {
            f.date_of_birth = Some(dob);
        }
        if let Some(address) = &update.address {
            f.address = Some(address.clone());
        }
        if let Some(contact) = &update.emergency_contact {
            f.emergency_contact = Some(contact.clone());
        }
        if let Some(belt) = &update.belt_rank {
            f.belt_rank = Some(belt.clone());
        }
        f.updated_at = Utc::now();
        Ok(Some(f.clone()))
    }

    async fn set_assessment(
        &self,
        id: Uuid,
        assessment: &Assessment,
    ) -> AppResult<Option<Fighter>> {
        let mut records = self.records.lock().unwrap();
        Ok(records.get_mut(&id).map(|record| {
            record.fighter.assessment = Some(assessment.clone());
            record.fighter.updated_at = Utc::now();
            record.fighter.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let removed = self.records.lock().unwrap().remove(&id).is_some();
        if removed && let Some(subscriptions) = &self.subscriptions {
            subscriptions.remove_for_fighter(id);
        }
        Ok(removed)
    }
}

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

/// In-memory implementation of SubscriptionRepo for testing.
#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    subscriptions: Mutex<HashMap<Uuid, Subscription>>,
    fail_next_guard: AtomicBool,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, subscription: Subscription) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(subscription.id, subscription);
    }

    /// Get all subscriptions, oldest first (for test assertions).
    pub fn get_all(&self) -> Vec<Subscription> {
        let mut all: Vec<Subscription> =
            self.subscriptions.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        all
    }

    /// Make the next guarded write lose its race.
    pub fn fail_next_guard(&self) {
        self.fail_next_guard.store(true, Ordering::SeqCst);
    }

    pub fn fighter_ids(&self) -> HashSet<Uuid> {
        self.subscriptions
            .lock()
            .unwrap()
            .values()
            .map(|s| s.fighter_id)
            .collect()
    }

    pub fn remove_for_fighter(&self, fighter_id: Uuid) {
        self.subscriptions
            .lock()
            .unwrap()
            .retain(|_, s| s.fighter_id != fighter_id);
    }
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn insert(&self, subscription: &Subscription) -> AppResult<()> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if subscriptions.contains_key(&subscription.id) {
            return Err(AppError::InvalidInput(
                "A record with this value already exists".into(),
            ));
        }
        subscriptions.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self.subscriptions.lock().unwrap().get(&id).cloned())
    }

    async fn list(
        &self,
        filter: SubscriptionFilter,
        now: DateTime<Utc>,
        page: Pagination,
    ) -> AppResult<(Vec<Subscription>, i64)> {
        let mut items: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| filter.plan_type.is_none_or(|p| s.plan_type == p))
            .filter(|s| filter.status.is_none_or(|st| s.effective_status(now) == st))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(items, page))
    }

    async fn list_by_fighter(&self, fighter_id: Uuid) -> AppResult<Vec<Subscription>> {
        let mut items: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.fighter_id == fighter_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn has_open_balance(&self, fighter_id: Uuid, plan_type: PlanType) -> AppResult<bool> {
        Ok(self.subscriptions.lock().unwrap().values().any(|s| {
            s.fighter_id == fighter_id
                && s.plan_type == plan_type
                && s.status != SubscriptionStatus::Cancelled
                && s.remaining_balance > 0
        }))
    }

    async fn update_guarded(&self, next: &Subscription) -> AppResult<Option<Subscription>> {
        if self.fail_next_guard.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        let mut subscriptions = self.subscriptions.lock().unwrap();
        match subscriptions.get_mut(&next.id) {
            Some(stored) if stored.version == next.version => {
                let mut saved = next.clone();
                saved.version += 1;
                *stored = saved.clone();
                Ok(Some(saved))
            }
            _ => Ok(None),
        }
    }

    async fn repair_installment_counts(&self) -> AppResult<u64> {
        let mut fixed = 0;
        for s in self.subscriptions.lock().unwrap().values_mut() {
            let actual = s.payment_history.len() as i32;
            if s.installment_count != actual {
                s.installment_count = actual;
                s.version += 1;
                fixed += 1;
            }
        }
        Ok(fixed)
    }
}

// ============================================================================
// InMemoryPaymentOrderRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryPaymentOrderRepo {
    orders: Mutex<HashMap<String, PaymentOrder>>,
}

impl InMemoryPaymentOrderRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentOrderRepo for InMemoryPaymentOrderRepo {
    async fn insert(&self, order: &PaymentOrder) -> AppResult<()> {
        self.orders
            .lock()
            .unwrap()
            .insert(order.order_id.clone(), order.clone());
        Ok(())
    }

    async fn get(&self, order_id: &str) -> AppResult<Option<PaymentOrder>> {
        Ok(self.orders.lock().unwrap().get(order_id).cloned())
    }

    async fn mark_consumed(&self, order_id: &str, at: DateTime<Utc>) -> AppResult<bool> {
        let mut orders = self.orders.lock().unwrap();
        match orders.get_mut(order_id) {
            Some(order) if order.consumed_at.is_none() => {
                order.consumed_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, order_id: &str) -> AppResult<()> {
        if let Some(order) = self.orders.lock().unwrap().get_mut(order_id) {
            order.consumed_at = None;
        }
        Ok(())
    }
}

// ============================================================================
// DummyGateway
// ============================================================================

/// Gateway that mints order ids locally and signs with a fixed test secret.
pub struct DummyGateway {
    key_id: String,
    secret: String,
    counter: AtomicU64,
    unavailable: AtomicBool,
}

impl Default for DummyGateway {
    fn default() -> Self {
        Self {
            key_id: "rzp_test_dummy".to_string(),
            secret: "dummy_gateway_secret".to_string(),
            counter: AtomicU64::new(0),
            unavailable: AtomicBool::new(false),
        }
    }
}

impl DummyGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signature the real gateway would hand the client after payment.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        sign_payment(&self.secret, order_id, payment_id)
    }

    /// Make order creation fail like a gateway outage.
    pub fn set_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for DummyGateway {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
    ) -> AppResult<GatewayOrder> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Gateway("dummy gateway unavailable".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GatewayOrder {
            id: format!("order_dummy{n:06}"),
            amount_paise,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_payment_signature(&self.secret, order_id, payment_id, signature)
    }
}
