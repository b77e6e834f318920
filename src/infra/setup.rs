use crate::{
    adapters::{
        email::resend::ResendEmailSender,
        http::app_state::AppState,
    },
    application::ports::payment_gateway::PaymentGateway,
    infra::{
        config::AppConfig, postgres_persistence, rate_limit::RedisRateLimiter,
        razorpay_client::RazorpayClient, reset_codes::RedisResetTicketStore,
    },
    use_cases::{
        auth::{AdminRepo, AuthUseCases},
        fighter::{FighterRepo, FighterUseCases},
        password_reset::{EmailResetChannel, EmailSender, PasswordResetUseCases},
        subscription::{PaymentOrderRepo, SubscriptionRepo, SubscriptionUseCases},
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);
    let admins = postgres_arc.clone() as Arc<dyn AdminRepo>;
    let fighters = postgres_arc.clone() as Arc<dyn FighterRepo>;

    let rate_limiter = RedisRateLimiter::new(
        &config.redis_url,
        config.rate_limit_window_secs,
        config.rate_limit_per_ip,
        config.rate_limit_per_email,
    )
    .await?;
    let reset_store = RedisResetTicketStore::new(&config.redis_url).await?;

    let email = Arc::new(ResendEmailSender::new(
        config.resend_api_key.clone(),
        config.email_from.clone(),
    )) as Arc<dyn EmailSender>;
    let reset_channel = EmailResetChannel::new(email, config.app_origin.to_string());

    let gateway = Arc::new(RazorpayClient::new(
        config.razorpay_api_base.clone(),
        config.razorpay_key_id.clone(),
        config.razorpay_key_secret.clone(),
    )) as Arc<dyn PaymentGateway>;

    let auth_use_cases = AuthUseCases::new(
        admins.clone(),
        fighters.clone(),
        config.jwt_secret.clone(),
        config.access_token_ttl,
    );

    let password_reset_use_cases = PasswordResetUseCases::new(
        admins,
        fighters.clone(),
        Arc::new(reset_store),
        Arc::new(reset_channel),
        config.reset_code_ttl_minutes,
        config.reset_max_attempts,
    );

    let fighter_use_cases = FighterUseCases::new(fighters.clone());

    let subscription_use_cases = SubscriptionUseCases::new(
        postgres_arc.clone() as Arc<dyn SubscriptionRepo>,
        postgres_arc as Arc<dyn PaymentOrderRepo>,
        fighters,
        gateway,
        config.default_max_installments,
    );

    Ok(AppState {
        config: Arc::new(config),
        auth_use_cases: Arc::new(auth_use_cases),
        password_reset_use_cases: Arc::new(password_reset_use_cases),
        fighter_use_cases: Arc::new(fighter_use_cases),
        subscription_use_cases: Arc::new(subscription_use_cases),
        rate_limiter: Arc::new(rate_limiter),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dojo_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    // File (structured JSON logs), skipped when the working directory is read-only
    let json_layer = match File::create("app.log") {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
        ),
        Err(err) => {
            eprintln!("app.log unavailable, logging to console only: {err}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
