//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Uniqueness of usernames and emails is enforced by the `users_username_key`
//! and `users_email_key` constraints, so concurrent registrations race safely.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{AccountLookup, NewAccount, PasswordHash, User, UserAccount, UserId};

use super::diesel_helpers::{DbFailure, classify_diesel_error};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(error.into_message())
}

const USERNAME_KEY: &str = "users_username_key";
const EMAIL_KEY: &str = "users_email_key";

fn map_failure(failure: DbFailure) -> UserPersistenceError {
    let constraint = failure.constraint();
    match failure {
        DbFailure::UniqueViolation { .. } => match constraint.as_deref() {
            Some(USERNAME_KEY) => UserPersistenceError::duplicate_username(),
            Some(EMAIL_KEY) => UserPersistenceError::duplicate_email(),
            _ => UserPersistenceError::query("unique violation"),
        },
        DbFailure::Connection(message) => UserPersistenceError::connection(message),
        DbFailure::ForeignKeyViolation { .. } => {
            UserPersistenceError::query("foreign key violation")
        }
        DbFailure::Query(message) => UserPersistenceError::query(message),
    }
}

fn map_diesel_error(error: diesel::result::Error, operation: &'static str) -> UserPersistenceError {
    map_failure(classify_diesel_error(error, operation))
}

fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    row.into_user().map_err(UserPersistenceError::query)
}

fn row_to_account(row: UserRow) -> Result<UserAccount, UserPersistenceError> {
    let password_hash = PasswordHash::new(row.password_hash.clone());
    Ok(UserAccount {
        user: row_to_user(row)?,
        password_hash,
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, account: &NewAccount) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user = &account.user;
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            username: user.username().as_ref(),
            email: user.email().as_ref(),
            password_hash: account.password_hash.as_ref(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        };

        let stored: UserRow = diesel::insert_into(users::table)
            .values(&row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "insert user"))?;
        row_to_user(stored)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "load user"))?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_lookup(
        &self,
        lookup: &AccountLookup,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let query = users::table.select(UserRow::as_select()).into_boxed();
        let query = match lookup {
            AccountLookup::Email(email) => query.filter(users::email.eq(email.as_str())),
            AccountLookup::Username(username) => {
                query.filter(users::username.eq(username.as_str()))
            }
        };

        let row: Option<UserRow> = query
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "look up account"))?;
        row.map(row_to_account).transpose()
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        hash: &PasswordHash,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::update(users::table.find(id.as_uuid()))
            .set((
                users::password_hash.eq(hash.as_ref()),
                users::updated_at.eq(updated_at),
            ))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "update password"))?;
        Ok(affected > 0)
    }
}
