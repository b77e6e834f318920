use std::sync::Arc;

use crate::{
    infra::{config::AppConfig, rate_limit::RateLimiterTrait},
    use_cases::{
        auth::AuthUseCases, fighter::FighterUseCases, password_reset::PasswordResetUseCases,
        subscription::SubscriptionUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_use_cases: Arc<AuthUseCases>,
    pub password_reset_use_cases: Arc<PasswordResetUseCases>,
    pub fighter_use_cases: Arc<FighterUseCases>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}
