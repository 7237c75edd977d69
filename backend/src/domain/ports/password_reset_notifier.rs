//! Port for delivering password reset links.
use async_trait::async_trait;

use crate::domain::{EmailAddress, ResetToken};

use super::define_port_error;

define_port_error! {
    /// Errors raised by reset notification adapters.
    pub enum NotifierError {
        /// The message could not be built or handed off.
        Delivery { message: String } => "reset notification failed: {message}",
    }
}

/// Outbound channel for reset links.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordResetNotifier: Send + Sync {
    /// Send a link embedding `token` to `email`.
    async fn send_reset_link(
        &self,
        email: &EmailAddress,
        token: &ResetToken,
    ) -> Result<(), NotifierError>;
}
