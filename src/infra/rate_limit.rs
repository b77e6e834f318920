use async_trait::async_trait;
use redis::{Script, aio::ConnectionManager};

use super::InfraError;
use crate::app_error::{AppError, AppResult};

#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Count one request against the IP bucket and, when known, the email bucket.
    /// Returns Err(AppError::RateLimited) once either bucket is over its limit.
    async fn check(&self, ip: &str, email: Option<&str>) -> AppResult<()>;
}

/// Atomic fixed-window counter. The window starts at the first hit; a key
/// that somehow lost its TTL gets one again rather than counting forever.
const INCR_WITH_TTL_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 or redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return current
"#;

pub fn ip_key(ip: &str) -> String {
    format!("dojo:rate:ip:{ip}")
}

pub fn email_key(email: &str) -> String {
    format!("dojo:rate:email:{}", email.trim().to_lowercase())
}

#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    window_secs: u64,
    max_per_ip: u64,
    max_per_email: u64,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(
        redis_url: &str,
        window_secs: u64,
        max_per_ip: u64,
        max_per_email: u64,
    ) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        Ok(Self {
            manager,
            window_secs,
            max_per_ip,
            max_per_email,
            script: Script::new(INCR_WITH_TTL_SCRIPT),
        })
    }

    async fn hit(&self, conn: &mut ConnectionManager, key: &str, limit: u64) -> AppResult<()> {
        let current: u64 = self
            .script
            .key(key)
            .arg(self.window_secs)
            .invoke_async(conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if current > limit {
            tracing::warn!(key = %key, current, limit, "Rate limit exceeded");
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}

#[async_trait]
impl RateLimiterTrait for RedisRateLimiter {
    async fn check(&self, ip: &str, email: Option<&str>) -> AppResult<()> {
        let mut conn = self.manager.clone();
        self.hit(&mut conn, &ip_key(ip), self.max_per_ip).await?;

        if let Some(email) = email {
            self.hit(&mut conn, &email_key(email), self.max_per_email)
                .await?;
        }
        Ok(())
    }
}
