//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AccountLookup, NewAccount, PasswordHash, User, UserAccount, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the username.
        DuplicateUsername => "username is already taken",
        /// Another account already uses the email address.
        DuplicateEmail => "email is already taken",
    }
}

/// Port for reading and writing user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account, failing on username or email collisions.
    async fn create(&self, account: &NewAccount) -> Result<User, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user and stored credential by username or email.
    async fn find_by_lookup(
        &self,
        lookup: &AccountLookup,
    ) -> Result<Option<UserAccount>, UserPersistenceError>;

    /// Replace a user's password digest. Returns `false` when the user is gone.
    async fn update_password_hash(
        &self,
        id: &UserId,
        hash: &PasswordHash,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, UserPersistenceError>;
}

/// Fixture implementation for tests that do not exercise user persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserRepository;

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn create(&self, account: &NewAccount) -> Result<User, UserPersistenceError> {
        Ok(account.user.clone())
    }

    async fn find_by_id(&self, _id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(None)
    }

    async fn find_by_lookup(
        &self,
        _lookup: &AccountLookup,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        Ok(None)
    }

    async fn update_password_hash(
        &self,
        _id: &UserId,
        _hash: &PasswordHash,
        _updated_at: DateTime<Utc>,
    ) -> Result<bool, UserPersistenceError> {
        Ok(false)
    }
}
