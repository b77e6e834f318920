use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::{
    application::use_cases::password_reset::{
        DEFAULT_RESET_CODE_TTL_MINUTES, DEFAULT_RESET_MAX_ATTEMPTS,
    },
    domain::entities::subscription::DEFAULT_MAX_INSTALLMENTS,
    infra::razorpay_client::RAZORPAY_API_BASE,
};

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub access_token_ttl: Duration,
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub redis_url: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    pub rate_limit_per_email: u64,
    /// Whether to trust X-Forwarded-For headers. Set to true when behind a reverse proxy.
    /// SECURITY: Only enable this when the API is not directly exposed to the internet.
    pub trust_proxy: bool,
    pub resend_api_key: SecretString,
    pub email_from: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: SecretString,
    pub razorpay_api_base: Url,
    pub reset_code_ttl_minutes: i64,
    pub reset_max_attempts: u32,
    pub default_max_installments: i32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let access_token_ttl_secs: i64 = get_env_default("ACCESS_TOKEN_TTL_SECS", 86_400);

        let app_origin: Url = get_env("APP_ORIGIN");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 60);
        let rate_limit_per_email: u64 = get_env_default("RATE_LIMIT_PER_EMAIL", 30);
        // Default to false - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let resend_api_key = SecretString::new(get_env::<String>("RESEND_API_KEY").into());
        let email_from: String = get_env("EMAIL_FROM");

        let razorpay_key_id: String = get_env("RAZORPAY_KEY_ID");
        let razorpay_key_secret =
            SecretString::new(get_env::<String>("RAZORPAY_KEY_SECRET").into());
        let razorpay_api_base: Url = get_env_default(
            "RAZORPAY_API_BASE",
            Url::parse(RAZORPAY_API_BASE).unwrap(),
        );

        let reset_code_ttl_minutes: i64 =
            get_env_default("RESET_CODE_TTL_MINUTES", DEFAULT_RESET_CODE_TTL_MINUTES);
        let reset_max_attempts: u32 =
            get_env_default("RESET_MAX_ATTEMPTS", DEFAULT_RESET_MAX_ATTEMPTS);
        let default_max_installments: i32 =
            get_env_default("DEFAULT_MAX_INSTALLMENTS", DEFAULT_MAX_INSTALLMENTS);

        Self {
            jwt_secret,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
            app_origin,
            cors_origin,
            bind_addr,
            database_url,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            rate_limit_per_email,
            trust_proxy,
            resend_api_key,
            email_from,
            razorpay_key_id,
            razorpay_key_secret,
            razorpay_api_base,
            reset_code_ttl_minutes,
            reset_max_attempts,
            default_max_installments,
        }
    }

    /// Cookies get the `Secure` flag whenever the app is served over https.
    pub fn secure_cookies(&self) -> bool {
        self.app_origin.scheme() == "https"
    }
}
