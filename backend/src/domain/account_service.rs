//! Account workflows: registration, login, password reset and `me`.
//!
//! Field-level validation failures are returned as
//! [`AccountOutcome::Rejected`]; only infrastructure failures become
//! [`Error`]s.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    AccountCommand, AccountQuery, PasswordHasher, PasswordHasherError, PasswordResetNotifier,
    ResetTokenStore, ResetTokenStoreError, UserPersistenceError, UserRepository,
};
use crate::domain::{
    AccountLookup, AccountOutcome, Error, LoginCredentials, NewAccount, PlainPassword,
    RegistrationRequest, RequestContext, ResetToken, User, UserId, truncate_to_millis,
};

/// How long a password reset token stays redeemable.
pub const RESET_TOKEN_TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        duplicate @ (UserPersistenceError::DuplicateUsername
        | UserPersistenceError::DuplicateEmail) => Error::conflict(duplicate.to_string()),
    }
}

fn map_hasher_error(error: PasswordHasherError) -> Error {
    Error::internal(error.to_string())
}

fn map_token_error(error: ResetTokenStoreError) -> Error {
    match error {
        ResetTokenStoreError::Backend { message } => {
            Error::service_unavailable(format!("reset token store unavailable: {message}"))
        }
        ResetTokenStoreError::Corrupt { message } => {
            Error::internal(format!("reset token store error: {message}"))
        }
    }
}

/// Driven ports required by [`AccountService`].
#[derive(Clone)]
pub struct AccountServicePorts {
    /// User persistence.
    pub users: Arc<dyn UserRepository>,
    /// Password hashing.
    pub hasher: Arc<dyn PasswordHasher>,
    /// Reset token storage.
    pub reset_tokens: Arc<dyn ResetTokenStore>,
    /// Reset link delivery.
    pub notifier: Arc<dyn PasswordResetNotifier>,
}

/// Account service implementing [`AccountCommand`] and [`AccountQuery`].
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    reset_tokens: Arc<dyn ResetTokenStore>,
    notifier: Arc<dyn PasswordResetNotifier>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Create a new service from its ports and a clock.
    pub fn new(ports: AccountServicePorts, clock: Arc<dyn Clock>) -> Self {
        let AccountServicePorts {
            users,
            hasher,
            reset_tokens,
            notifier,
        } = ports;
        Self {
            users,
            hasher,
            reset_tokens,
            notifier,
            clock,
        }
    }

    async fn load_user(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.users.find_by_id(id).await.map_err(map_user_error)
    }
}

#[async_trait]
impl AccountCommand for AccountService {
    async fn register(&self, request: &RegistrationRequest) -> Result<AccountOutcome, Error> {
        let valid = match request.validate() {
            Ok(valid) => valid,
            Err(field_error) => return Ok(AccountOutcome::Rejected(vec![field_error])),
        };
        let password_hash = self
            .hasher
            .hash(&valid.password)
            .await
            .map_err(map_hasher_error)?;
        let now = truncate_to_millis(self.clock.utc());
        let user = User::new(UserId::random(), valid.username, valid.email, now, now);

        match self
            .users
            .create(&NewAccount {
                user,
                password_hash,
            })
            .await
        {
            Ok(created) => {
                info!(user_id = %created.id(), "user registered");
                Ok(AccountOutcome::Authenticated(created))
            }
            Err(err @ UserPersistenceError::DuplicateUsername) => {
                Ok(AccountOutcome::rejected("username", err.to_string()))
            }
            Err(err @ UserPersistenceError::DuplicateEmail) => {
                Ok(AccountOutcome::rejected("email", err.to_string()))
            }
            Err(err) => Err(map_user_error(err)),
        }
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<AccountOutcome, Error> {
        let Some(account) = self
            .users
            .find_by_lookup(credentials.lookup())
            .await
            .map_err(map_user_error)?
        else {
            return Ok(AccountOutcome::rejected(
                "usernameOrEmail",
                "User does not exist",
            ));
        };
        let valid = self
            .hasher
            .verify(credentials.password(), &account.password_hash)
            .await
            .map_err(map_hasher_error)?;
        if !valid {
            return Ok(AccountOutcome::rejected("password", "Incorrect password"));
        }
        debug!(user_id = %account.user.id(), "login verified");
        Ok(AccountOutcome::Authenticated(account.user))
    }

    async fn forgot_password(&self, email: &str) -> Result<bool, Error> {
        let lookup = AccountLookup::Email(email.to_owned());
        let Some(account) = self
            .users
            .find_by_lookup(&lookup)
            .await
            .map_err(map_user_error)?
        else {
            debug!("password reset requested for unknown email");
            return Ok(true);
        };

        let token = ResetToken::generate();
        self.reset_tokens
            .save(&token, account.user.id(), RESET_TOKEN_TTL)
            .await
            .map_err(map_token_error)?;
        info!(user_id = %account.user.id(), "password reset issued");

        if let Err(err) = self
            .notifier
            .send_reset_link(account.user.email(), &token)
            .await
        {
            warn!(user_id = %account.user.id(), error = %err, "reset link not delivered");
        }
        Ok(true)
    }

    async fn change_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<AccountOutcome, Error> {
        let password = match PlainPassword::new(new_password) {
            Ok(password) => password,
            Err(err) => return Ok(AccountOutcome::rejected("newPassword", err.to_string())),
        };

        let token = ResetToken::from_client(token);
        let Some(user_id) = self
            .reset_tokens
            .consume(&token)
            .await
            .map_err(map_token_error)?
        else {
            return Ok(AccountOutcome::rejected(
                "token",
                "token is invalid or expired",
            ));
        };

        let hash = self
            .hasher
            .hash(&password)
            .await
            .map_err(map_hasher_error)?;
        let updated = self
            .users
            .update_password_hash(&user_id, &hash, self.clock.utc())
            .await
            .map_err(map_user_error)?;
        let user = if updated {
            self.load_user(&user_id).await?
        } else {
            None
        };
        let Some(user) = user else {
            return Ok(AccountOutcome::rejected("token", "user no longer exists"));
        };
        info!(user_id = %user.id(), "password changed");
        Ok(AccountOutcome::Authenticated(user))
    }
}

#[async_trait]
impl AccountQuery for AccountService {
    async fn me(&self, ctx: &RequestContext) -> Result<Option<User>, Error> {
        match ctx.viewer() {
            Some(id) => self.load_user(id).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
