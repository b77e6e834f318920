use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use super::InfraError;
use crate::{
    app_error::{AppError, AppResult},
    domain::entities::reset_state::ResetTicket,
    use_cases::password_reset::ResetTicketStore,
};

/// Reset tickets as JSON values under `dojo:reset:{email}`. Redis expiry is
/// the only clock: once the key is gone the flow is back to idle.
#[derive(Clone)]
pub struct RedisResetTicketStore {
    manager: ConnectionManager,
}

impl RedisResetTicketStore {
    pub async fn new(redis_url: &str) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        Ok(Self { manager })
    }

    fn key(email: &str) -> String {
        format!("dojo:reset:{email}")
    }
}

fn encode(ticket: &ResetTicket) -> AppResult<String> {
    serde_json::to_string(ticket).map_err(|e| AppError::Internal(e.to_string()))
}

#[async_trait]
impl ResetTicketStore for RedisResetTicketStore {
    async fn save(&self, email: &str, ticket: &ResetTicket, ttl_secs: u64) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .set_ex(Self::key(email), encode(ticket)?, ttl_secs.max(1))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn update(&self, email: &str, ticket: &ResetTicket) -> AppResult<()> {
        let mut conn = self.manager.clone();
        // XX: never resurrect an expired ticket. KEEPTTL: the code's deadline is fixed at issue.
        let _: Option<String> = redis::cmd("SET")
            .arg(Self::key(email))
            .arg(encode(ticket)?)
            .arg("XX")
            .arg("KEEPTTL")
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, email: &str) -> AppResult<Option<ResetTicket>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn
            .get(Self::key(email))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        raw.map(|value| {
            serde_json::from_str(&value).map_err(|e| AppError::Internal(e.to_string()))
        })
        .transpose()
    }

    async fn delete(&self, email: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .del(Self::key(email))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }
}
