use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::SecretString;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        jwt,
        password::{hash_password, verify_password},
        use_cases::fighter::{FighterRepo, NewFighter},
        validators::{
            MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, is_valid_email, is_valid_password, is_valid_phone,
            normalize_email,
        },
    },
    domain::entities::role::Role,
};

/// What login needs to know about an account, whichever table it lives in.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[async_trait]
pub trait AdminRepo: Send + Sync {
    async fn find_credentials(&self, email: &str) -> AppResult<Option<AccountCredentials>>;
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Clone)]
pub struct RegisterFighter {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

#[derive(Clone)]
pub struct AuthUseCases {
    admins: Arc<dyn AdminRepo>,
    fighters: Arc<dyn FighterRepo>,
    jwt_secret: SecretString,
    token_ttl: time::Duration,
}

impl AuthUseCases {
    pub fn new(
        admins: Arc<dyn AdminRepo>,
        fighters: Arc<dyn FighterRepo>,
        jwt_secret: SecretString,
        token_ttl: time::Duration,
    ) -> Self {
        Self {
            admins,
            fighters,
            jwt_secret,
            token_ttl,
        }
    }

    pub fn token_ttl(&self) -> time::Duration {
        self.token_ttl
    }

    /// Resolve an email to an account: admins take precedence over fighters.
    pub async fn find_account(&self, email: &str) -> AppResult<Option<AccountCredentials>> {
        if let Some(admin) = self.admins.find_credentials(email).await? {
            return Ok(Some(admin));
        }
        self.fighters.find_credentials(email).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Session> {
        let email = normalize_email(email);
        if !is_valid_email(&email) || password.is_empty() {
            return Err(AppError::InvalidCredentials);
        }

        let Some(account) = self.find_account(&email).await? else {
            tracing::info!("Login attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        };
        if !verify_password(password, &account.password_hash) {
            tracing::info!(account_id = %account.id, role = %account.role, "Login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(account_id = %account.id, role = %account.role, "Login succeeded");
        self.issue_session(SessionUser {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
        })
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register_fighter(&self, input: RegisterFighter) -> AppResult<Session> {
        let email = normalize_email(&input.email);
        if !is_valid_email(&email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Name is required".into()));
        }
        if !is_valid_password(&input.password) {
            return Err(AppError::InvalidInput(format!(
                "Password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
            )));
        }
        if let Some(phone) = input.phone.as_deref()
            && !is_valid_phone(phone)
        {
            return Err(AppError::InvalidInput("Invalid phone number".into()));
        }
        if self.find_account(&email).await?.is_some() {
            return Err(AppError::InvalidInput("Email already registered".into()));
        }

        let fighter = self
            .fighters
            .create(&NewFighter {
                name,
                email,
                password_hash: hash_password(&input.password)?,
                phone: input.phone,
                date_of_birth: input.date_of_birth,
                address: input.address,
                emergency_contact: input.emergency_contact,
                belt_rank: None,
            })
            .await?;

        tracing::info!(fighter_id = %fighter.id, "Fighter registered");
        self.issue_session(SessionUser {
            id: fighter.id,
            name: fighter.name,
            email: fighter.email,
            role: Role::Fighter,
        })
    }

    fn issue_session(&self, user: SessionUser) -> AppResult<Session> {
        let token = jwt::issue(user.id, user.role, &self.jwt_secret, self.token_ttl)?;
        Ok(Session { token, user })
    }
}
