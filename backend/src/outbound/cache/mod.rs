//! Redis-backed storage for password reset tokens.
//!
//! Tokens are stored under `forget-password:<sha256 of token>` with the user
//! id as value and a Redis `EX` expiry. Consumption uses `GETDEL`, so a token
//! can be redeemed at most once even under concurrent requests.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, RunError};
use bb8_redis::redis::{self, RedisError};
use tracing::debug;

use crate::domain::ports::{ResetTokenStore, ResetTokenStoreError};
use crate::domain::{ResetToken, UserId};

/// Key namespace for reset tokens.
pub const RESET_TOKEN_PREFIX: &str = "forget-password:";

/// Connection pool shared by Redis adapters.
pub type RedisPool = Pool<RedisConnectionManager>;

/// Build a Redis connection pool for `url` holding up to `max_size`
/// connections.
///
/// # Errors
///
/// Returns the driver error when the URL is invalid or the pool cannot start.
pub async fn connect_redis(url: &str, max_size: u32) -> Result<RedisPool, RedisError> {
    let manager = RedisConnectionManager::new(url)?;
    Pool::builder().max_size(max_size).build(manager).await
}

fn reset_key(token: &ResetToken) -> String {
    format!("{RESET_TOKEN_PREFIX}{}", token.digest())
}

fn map_run_error(error: RunError<RedisError>) -> ResetTokenStoreError {
    ResetTokenStoreError::backend(error.to_string())
}

fn map_redis_error(error: RedisError) -> ResetTokenStoreError {
    ResetTokenStoreError::backend(error.to_string())
}

fn decode_user(raw: Option<String>) -> Result<Option<UserId>, ResetTokenStoreError> {
    raw.map(|value| UserId::new(&value).map_err(|err| ResetTokenStoreError::corrupt(err.to_string())))
        .transpose()
}

/// `ResetTokenStore` adapter over a `bb8-redis` pool.
#[derive(Clone)]
pub struct RedisResetTokenStore {
    pool: RedisPool,
}

impl RedisResetTokenStore {
    /// Wrap an existing pool.
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetTokenStore for RedisResetTokenStore {
    async fn save(
        &self,
        token: &ResetToken,
        user_id: &UserId,
        ttl: Duration,
    ) -> Result<(), ResetTokenStoreError> {
        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let seconds = ttl.as_secs().max(1);
        redis::cmd("SET")
            .arg(reset_key(token))
            .arg(user_id.as_ref())
            .arg("EX")
            .arg(seconds)
            .query_async::<()>(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        debug!(ttl_secs = seconds, "stored reset token");
        Ok(())
    }

    async fn consume(&self, token: &ResetToken) -> Result<Option<UserId>, ResetTokenStoreError> {
        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let raw: Option<String> = redis::cmd("GETDEL")
            .arg(reset_key(token))
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        decode_user(raw)
    }
}
