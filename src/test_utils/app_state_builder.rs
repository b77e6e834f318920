//! Test app state builder for HTTP-level integration testing.
//!
//! `TestAppStateBuilder` wires every use case to in-memory mocks so route
//! tests can run against a real `AppState` without Postgres, Redis, or the
//! payment gateway.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;
use url::Url;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        jwt,
        use_cases::{
            auth::AuthUseCases, fighter::FighterUseCases, password_reset::PasswordResetUseCases,
            subscription::SubscriptionUseCases,
        },
    },
    domain::entities::{fighter::Fighter, role::Role, subscription::Subscription},
    infra::{config::AppConfig, rate_limit::RateLimiterTrait},
    test_utils::{
        CapturingResetChannel, DummyGateway, InMemoryAdminRepo, InMemoryFighterRepo,
        InMemoryPaymentOrderRepo, InMemoryRateLimiter, InMemoryResetTicketStore,
        InMemorySubscriptionRepo,
    },
};

pub const TEST_JWT_SECRET: &str = "test_jwt_secret";

/// Mint an access token the test app state will accept.
pub fn test_token(user_id: Uuid, role: Role) -> String {
    jwt::issue(
        user_id,
        role,
        &SecretString::new(TEST_JWT_SECRET.into()),
        Duration::hours(1),
    )
    .unwrap()
}

/// Handles to the mocks behind a built `AppState`, for assertions.
pub struct TestMocks {
    pub admins: Arc<InMemoryAdminRepo>,
    pub fighters: Arc<InMemoryFighterRepo>,
    pub subscriptions: Arc<InMemorySubscriptionRepo>,
    pub orders: Arc<InMemoryPaymentOrderRepo>,
    pub gateway: Arc<DummyGateway>,
    pub reset_store: Arc<InMemoryResetTicketStore>,
    pub reset_channel: Arc<CapturingResetChannel>,
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let fighter = create_test_fighter(|f| f.email = "asha@example.com".into());
/// let (app_state, mocks) = TestAppStateBuilder::new()
///     .with_admin("Coach", "coach@dojo.in", "adminpass1")
///     .with_fighter(fighter)
///     .build_with_mocks();
/// ```
#[derive(Default)]
pub struct TestAppStateBuilder {
    admins: Vec<(String, String, String)>,
    fighters: Vec<Fighter>,
    subscriptions: Vec<Subscription>,
    rate_limiter: Option<Arc<dyn RateLimiterTrait>>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an admin who can log in with `password`.
    pub fn with_admin(mut self, name: &str, email: &str, password: &str) -> Self {
        self.admins
            .push((name.to_string(), email.to_string(), password.to_string()));
        self
    }

    pub fn with_fighter(mut self, fighter: Fighter) -> Self {
        self.fighters.push(fighter);
        self
    }

    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiterTrait>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Build the AppState with all configured mocks.
    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    /// Build the AppState and hand back the mocks behind it.
    pub fn build_with_mocks(self) -> (AppState, TestMocks) {
        let config = Arc::new(test_config());

        let admins = Arc::new(InMemoryAdminRepo::new());
        for (name, email, password) in &self.admins {
            admins.add(name, email, password);
        }

        let subscriptions = Arc::new(InMemorySubscriptionRepo::new());
        for subscription in self.subscriptions {
            subscriptions.seed(subscription);
        }
        let fighters = Arc::new(
            InMemoryFighterRepo::with_fighters(self.fighters).linked_to(subscriptions.clone()),
        );
        let orders = Arc::new(InMemoryPaymentOrderRepo::new());
        let gateway = Arc::new(DummyGateway::new());
        let reset_store = Arc::new(InMemoryResetTicketStore::new());
        let reset_channel = Arc::new(CapturingResetChannel::new());

        let auth_use_cases = Arc::new(AuthUseCases::new(
            admins.clone(),
            fighters.clone(),
            config.jwt_secret.clone(),
            config.access_token_ttl,
        ));
        let password_reset_use_cases = Arc::new(PasswordResetUseCases::new(
            admins.clone(),
            fighters.clone(),
            reset_store.clone(),
            reset_channel.clone(),
            config.reset_code_ttl_minutes,
            config.reset_max_attempts,
        ));
        let fighter_use_cases = Arc::new(FighterUseCases::new(fighters.clone()));
        let subscription_use_cases = Arc::new(SubscriptionUseCases::new(
            subscriptions.clone(),
            orders.clone(),
            fighters.clone(),
            gateway.clone(),
            config.default_max_installments,
        ));

        let rate_limiter = self
            .rate_limiter
            .unwrap_or_else(|| Arc::new(InMemoryRateLimiter::permissive()));

        let app_state = AppState {
            config,
            auth_use_cases,
            password_reset_use_cases,
            fighter_use_cases,
            subscription_use_cases,
            rate_limiter,
        };
        let mocks = TestMocks {
            admins,
            fighters,
            subscriptions,
            orders,
            gateway,
            reset_store,
            reset_channel,
        };
        (app_state, mocks)
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        access_token_ttl: Duration::hours(24),
        app_origin: Url::parse("http://localhost:3000").unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
        database_url: String::new(),
        redis_url: String::new(),
        rate_limit_window_secs: 60,
        rate_limit_per_ip: 60,
        rate_limit_per_email: 30,
        trust_proxy: false,
        resend_api_key: SecretString::new("test_resend_key".into()),
        email_from: "Dojo <noreply@dojo.test>".to_string(),
        razorpay_key_id: "rzp_test_dummy".to_string(),
        razorpay_key_secret: SecretString::new("dummy_gateway_secret".into()),
        razorpay_api_base: Url::parse("http://localhost:9999/v1/").unwrap(),
        reset_code_ttl_minutes: 10,
        reset_max_attempts: 5,
        default_max_installments: 4,
    }
}
