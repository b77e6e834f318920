use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        email_templates::{password_changed_email, password_reset_code_email},
        password::hash_password,
        use_cases::{
            auth::{AccountCredentials, AdminRepo},
            fighter::FighterRepo,
        },
        validators::{
            MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, is_valid_email, is_valid_password,
            is_valid_reset_code, normalize_email,
        },
    },
    domain::entities::{
        reset_state::{ResetState, ResetTicket},
        role::Role,
    },
};

pub const DEFAULT_RESET_CODE_TTL_MINUTES: i64 = 10;
pub const DEFAULT_RESET_MAX_ATTEMPTS: u32 = 5;

/// Expiring storage for outstanding reset tickets, keyed by email.
/// An entry that outlives its TTL is gone, which puts the flow back to idle.
#[async_trait]
pub trait ResetTicketStore: Send + Sync {
    async fn save(&self, email: &str, ticket: &ResetTicket, ttl_secs: u64) -> AppResult<()>;
    /// Overwrite an existing ticket without extending its lifetime.
    async fn update(&self, email: &str, ticket: &ResetTicket) -> AppResult<()>;
    async fn get(&self, email: &str) -> AppResult<Option<ResetTicket>>;
    async fn delete(&self, email: &str) -> AppResult<()>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()>;
}

/// How a reset code reaches its owner.
#[async_trait]
pub trait ResetCodeChannel: Send + Sync {
    async fn deliver_code(&self, to: &str, code: &str, ttl_minutes: i64) -> AppResult<()>;
    async fn confirm_change(&self, to: &str, name: &str) -> AppResult<()>;
}

/// Delivers codes as branded emails.
pub struct EmailResetChannel {
    sender: Arc<dyn EmailSender>,
    app_origin: String,
}

impl EmailResetChannel {
    pub fn new(sender: Arc<dyn EmailSender>, app_origin: String) -> Self {
        Self { sender, app_origin }
    }
}

#[async_trait]
impl ResetCodeChannel for EmailResetChannel {
    async fn deliver_code(&self, to: &str, code: &str, ttl_minutes: i64) -> AppResult<()> {
        let (subject, html) = password_reset_code_email(&self.app_origin, code, ttl_minutes);
        self.sender.send(to, &subject, &html).await
    }

    async fn confirm_change(&self, to: &str, name: &str) -> AppResult<()> {
        let (subject, html) = password_changed_email(&self.app_origin, name);
        self.sender.send(to, &subject, &html).await
    }
}

#[derive(Clone)]
pub struct PasswordResetUseCases {
    admins: Arc<dyn AdminRepo>,
    fighters: Arc<dyn FighterRepo>,
    store: Arc<dyn ResetTicketStore>,
    channel: Arc<dyn ResetCodeChannel>,
    code_ttl_minutes: i64,
    max_attempts: u32,
}

impl PasswordResetUseCases {
    pub fn new(
        admins: Arc<dyn AdminRepo>,
        fighters: Arc<dyn FighterRepo>,
        store: Arc<dyn ResetTicketStore>,
        channel: Arc<dyn ResetCodeChannel>,
        code_ttl_minutes: i64,
        max_attempts: u32,
    ) -> Self {
        Self {
            admins,
            fighters,
            store,
            channel,
            code_ttl_minutes: code_ttl_minutes.max(1),
            max_attempts: max_attempts.max(1),
        }
    }

    async fn find_account(&self, email: &str) -> AppResult<Option<AccountCredentials>> {
        if let Some(admin) = self.admins.find_credentials(email).await? {
            return Ok(Some(admin));
        }
        self.fighters.find_credentials(email).await
    }

    #[instrument(skip(self))]
    pub async fn request_reset(&self, email: &str) -> AppResult<()> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }
        let Some(account) = self.find_account(&email).await? else {
            return Err(AppError::NotFound("Email not registered".into()));
        };

        if let Some(existing) = self.store.get(&email).await? {
            tracing::debug!(state = %existing.state, "Replacing outstanding reset code");
        }

        let code = generate_reset_code();
        let ticket = ResetTicket {
            account_id: account.id,
            role: account.role,
            code_hash: hash_code(&code),
            state: ResetState::CodeRequested,
            failed_attempts: 0,
        };
        self.store
            .save(&email, &ticket, (self.code_ttl_minutes * 60) as u64)
            .await?;
        self.channel
            .deliver_code(&email, &code, self.code_ttl_minutes)
            .await?;

        tracing::info!(account_id = %account.id, role = %account.role, "Password reset code issued");
        Ok(())
    }

    #[instrument(skip(self, code))]
    pub async fn verify_reset(&self, email: &str, code: &str) -> AppResult<()> {
        let email = normalize_email(email);
        let mut ticket = self.check_code(&email, code).await?;

        if ticket.state == ResetState::CodeRequested {
            ticket.state = ResetState::CodeVerified;
            self.store.update(&email, &ticket).await?;
        }
        tracing::info!(account_id = %ticket.account_id, "Password reset code verified");
        Ok(())
    }

    #[instrument(skip(self, code, new_password))]
    pub async fn reset_password(&self, email: &str, code: &str, new_password: &str) -> AppResult<()> {
        let email = normalize_email(email);
        if !is_valid_password(new_password) {
            return Err(AppError::InvalidInput(format!(
                "Password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
            )));
        }

        let ticket = self.check_code(&email, code).await?;
        if !ticket.state.can_transition_to(ResetState::PasswordReset) {
            return Err(AppError::InvalidInput(
                "Verify the reset code before choosing a new password".into(),
            ));
        }

        let password_hash = hash_password(new_password)?;
        match ticket.role {
            Role::Admin => {
                self.admins
                    .set_password_hash(ticket.account_id, &password_hash)
                    .await?
            }
            Role::Fighter => {
                self.fighters
                    .set_password_hash(ticket.account_id, &password_hash)
                    .await?
            }
        }
        self.store.delete(&email).await?;

        tracing::info!(account_id = %ticket.account_id, role = %ticket.role, "Password reset completed");

        let name = self
            .find_account(&email)
            .await?
            .map(|account| account.name)
            .unwrap_or_default();
        if let Err(err) = self.channel.confirm_change(&email, &name).await {
            tracing::warn!(error = %err, "Failed to send password changed notice");
        }
        Ok(())
    }

    /// Loads the ticket and compares the code, spending one attempt on a miss.
    async fn check_code(&self, email: &str, code: &str) -> AppResult<ResetTicket> {
        let code = code.trim();
        if !is_valid_reset_code(code) {
            return Err(AppError::InvalidInput("Reset code must be 6 digits".into()));
        }
        let Some(mut ticket) = self.store.get(email).await? else {
            return Err(AppError::InvalidInput(
                "Reset code expired or was never requested".into(),
            ));
        };

        if hash_code(code) == ticket.code_hash {
            return Ok(ticket);
        }

        ticket.failed_attempts += 1;
        if ticket.failed_attempts >= self.max_attempts {
            self.store.delete(email).await?;
            tracing::warn!(account_id = %ticket.account_id, "Reset code attempts exhausted");
            return Err(AppError::InvalidInput(
                "Too many wrong codes. Request a new one".into(),
            ));
        }
        self.store.update(email, &ticket).await?;
        Err(AppError::InvalidInput("Invalid reset code".into()))
    }
}

fn generate_reset_code() -> String {
    let n: u32 = rand::rngs::OsRng.gen_range(0..1_000_000);
    format!("{n:06}")
}

fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}
