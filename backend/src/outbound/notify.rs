//! Reset link delivery through structured logs.
//!
//! Mail transport is outside this service. The default adapter records each
//! issued link at `info` with a token fingerprint only; the full link goes out
//! at `debug` on the [`RESET_LINK_TARGET`] target, so it stays out of logs
//! unless an operator enables that target explicitly.

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use crate::domain::ports::{NotifierError, PasswordResetNotifier};
use crate::domain::{EmailAddress, ResetToken};

/// Log target carrying full reset links, token included.
pub const RESET_LINK_TARGET: &str = "forum_backend::reset_link";

const FINGERPRINT_LEN: usize = 12;

/// Builds `<base>/change-password/<token>` links and logs them.
#[derive(Debug, Clone)]
pub struct TracingResetNotifier {
    base: Url,
}

impl TracingResetNotifier {
    /// Create a notifier rooted at `base`, the public web client origin.
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Link a user follows to choose a new password.
    ///
    /// # Errors
    ///
    /// Fails when `base` cannot carry path segments (for example `mailto:`).
    pub fn reset_link(&self, token: &ResetToken) -> Result<Url, NotifierError> {
        let mut link = self.base.clone();
        link.path_segments_mut()
            .map_err(|()| NotifierError::delivery("reset link base cannot hold a path"))?
            .pop_if_empty()
            .extend(["change-password", token.expose()]);
        Ok(link)
    }
}

#[async_trait]
impl PasswordResetNotifier for TracingResetNotifier {
    async fn send_reset_link(
        &self,
        email: &EmailAddress,
        token: &ResetToken,
    ) -> Result<(), NotifierError> {
        let link = self.reset_link(token)?;
        let digest = token.digest();
        let fingerprint = digest.get(..FINGERPRINT_LEN).unwrap_or(digest.as_str());
        info!(recipient = %email, token_fingerprint = fingerprint, "password reset link issued");
        debug!(target: RESET_LINK_TARGET, recipient = %email, %link, "password reset link");
        Ok(())
    }
}
