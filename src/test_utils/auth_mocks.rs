//! In-memory mocks for accounts, password reset, email, and rate limiting.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        password::hash_password,
        use_cases::{
            auth::{AccountCredentials, AdminRepo},
            password_reset::{EmailSender, ResetCodeChannel, ResetTicketStore},
        },
    },
    domain::entities::{reset_state::ResetTicket, role::Role},
    infra::rate_limit::RateLimiterTrait,
};

// ============================================================================
// InMemoryAdminRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryAdminRepo {
    pub admins: Mutex<HashMap<Uuid, AccountCredentials>>,
}

impl InMemoryAdminRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an admin who can log in with `password`. Returns the admin id.
    pub fn add(&self, name: &str, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        let account = AccountCredentials {
            id,
            name: name.to_string(),
            email: email.to_lowercase(),
            password_hash: hash_password(password).unwrap(),
            role: Role::Admin,
        };
        self.admins.lock().unwrap().insert(id, account);
        id
    }
}

#[async_trait]
impl AdminRepo for InMemoryAdminRepo {
    async fn find_credentials(&self, email: &str) -> AppResult<Option<AccountCredentials>> {
        Ok(self
            .admins
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut admins = self.admins.lock().unwrap();
        let admin = admins
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Admin not found".into()))?;
        admin.password_hash = password_hash.to_string();
        Ok(())
    }
}

// ============================================================================
// InMemoryResetTicketStore
// ============================================================================

/// Reset ticket store with real expiry semantics.
#[derive(Default)]
pub struct InMemoryResetTicketStore {
    entries: Mutex<HashMap<String, (ResetTicket, Instant)>>,
}

impl InMemoryResetTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current ticket for an email, if it has not expired (for test assertions).
    pub fn peek(&self, email: &str) -> Option<ResetTicket> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(email)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(ticket, _)| ticket.clone())
    }

    /// Simulate every TTL lapsing.
    pub fn expire_all(&self) {
        let past = Instant::now() - Duration::from_millis(1);
        for (_, expires_at) in self.entries.lock().unwrap().values_mut() {
            *expires_at = past;
        }
    }
}

#[async_trait]
impl ResetTicketStore for InMemoryResetTicketStore {
    async fn save(&self, email: &str, ticket: &ResetTicket, ttl_secs: u64) -> AppResult<()> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .lock()
            .unwrap()
            .insert(email.to_string(), (ticket.clone(), expires_at));
        Ok(())
    }

    async fn update(&self, email: &str, ticket: &ResetTicket) -> AppResult<()> {
        let mut entries = self.entries.lock().unwrap();
        if let Some((stored, expires_at)) = entries.get_mut(email)
            && *expires_at > Instant::now()
        {
            *stored = ticket.clone();
        }
        Ok(())
    }

    async fn get(&self, email: &str) -> AppResult<Option<ResetTicket>> {
        Ok(self.peek(email))
    }

    async fn delete(&self, email: &str) -> AppResult<()> {
        self.entries.lock().unwrap().remove(email);
        Ok(())
    }
}

// ============================================================================
// InMemoryEmailSender
// ============================================================================

#[derive(Debug, Clone)]
pub struct CapturedEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Email sender that records every message instead of sending it.
#[derive(Default)]
pub struct InMemoryEmailSender {
    sent: Mutex<Vec<CapturedEmail>>,
}

impl InMemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured_emails(&self) -> Vec<CapturedEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for InMemoryEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push(CapturedEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// CapturingResetChannel
// ============================================================================

/// Reset channel that keeps plaintext codes so tests can replay them.
#[derive(Default)]
pub struct CapturingResetChannel {
    codes: Mutex<Vec<(String, String)>>,
    confirmations: Mutex<Vec<String>>,
}

impl CapturingResetChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_code(&self) -> Option<String> {
        self.codes
            .lock()
            .unwrap()
            .last()
            .map(|(_, code)| code.clone())
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.confirmations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResetCodeChannel for CapturingResetChannel {
    async fn deliver_code(&self, to: &str, code: &str, _ttl_minutes: i64) -> AppResult<()> {
        self.codes
            .lock()
            .unwrap()
            .push((to.to_string(), code.to_string()));
        Ok(())
    }

    async fn confirm_change(&self, to: &str, _name: &str) -> AppResult<()> {
        self.confirmations.lock().unwrap().push(to.to_string());
        Ok(())
    }
}

// ============================================================================
// InMemoryRateLimiter
// ============================================================================

/// In-memory rate limiter for testing.
/// Uses HashMap to track request counts per key.
pub struct InMemoryRateLimiter {
    counts: Mutex<HashMap<String, u64>>,
    max_per_ip: u64,
    max_per_email: u64,
}

impl InMemoryRateLimiter {
    pub fn new(max_per_ip: u64, max_per_email: u64) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            max_per_ip,
            max_per_email,
        }
    }

    /// Create a permissive rate limiter that never blocks (for most tests).
    pub fn permissive() -> Self {
        Self::new(u64::MAX, u64::MAX)
    }
}

#[async_trait]
impl RateLimiterTrait for InMemoryRateLimiter {
    async fn check(&self, ip: &str, email: Option<&str>) -> AppResult<()> {
        let mut counts = self.counts.lock().unwrap();

        let ip_count = counts.entry(format!("rate:ip:{ip}")).or_insert(0);
        *ip_count += 1;
        if *ip_count > self.max_per_ip {
            return Err(AppError::RateLimited);
        }

        if let Some(email) = email {
            let email_count = counts
                .entry(format!("rate:email:{}", email.to_lowercase()))
                .or_insert(0);
            *email_count += 1;
            if *email_count > self.max_per_email {
                return Err(AppError::RateLimited);
            }
        }

        Ok(())
    }
}
