//! Port for single-use password reset tokens.
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ResetToken, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by reset token store adapters.
    pub enum ResetTokenStoreError {
        /// Store backend is unavailable or timing out.
        Backend { message: String } => "reset token store backend failure: {message}",
        /// A stored value could not be decoded.
        Corrupt { message: String } => "reset token store returned invalid data: {message}",
    }
}

/// Key-value store mapping reset tokens to user ids with a TTL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    /// Remember `token` for `user_id` until `ttl` elapses.
    async fn save(
        &self,
        token: &ResetToken,
        user_id: &UserId,
        ttl: Duration,
    ) -> Result<(), ResetTokenStoreError>;

    /// Atomically read and remove `token`, returning its user if still live.
    async fn consume(&self, token: &ResetToken) -> Result<Option<UserId>, ResetTokenStoreError>;
}
