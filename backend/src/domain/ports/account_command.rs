//! Driving port for account workflows: registration, login and password reset.
//!
//! Inbound adapters call this port and translate [`AccountOutcome`] into
//! their own envelope. Validation failures are data, so adapters never need
//! to inspect error codes to render field messages.

use async_trait::async_trait;

use crate::domain::{
    AccountOutcome, EmailAddress, Error, LoginCredentials, RegistrationRequest, RequestContext,
    User, UserId, Username,
};

/// Domain use-case port for account mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an account and sign it in.
    async fn register(&self, request: &RegistrationRequest) -> Result<AccountOutcome, Error>;

    /// Verify credentials.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AccountOutcome, Error>;

    /// Issue a reset link when `email` belongs to an account. Always `true`.
    async fn forgot_password(&self, email: &str) -> Result<bool, Error>;

    /// Redeem a reset token and set a new password.
    async fn change_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<AccountOutcome, Error>;
}

/// Domain use-case port for reading the signed-in account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    /// The session user, or `None` when anonymous or the user is gone.
    async fn me(&self, ctx: &RequestContext) -> Result<Option<User>, Error>;
}

const FIXTURE_USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

fn fixture_user() -> Result<User, Error> {
    let id = UserId::new(FIXTURE_USER_ID)
        .map_err(|err| Error::internal(format!("invalid fixture user id: {err}")))?;
    let username = Username::new("fixture-admin")
        .map_err(|err| Error::internal(format!("invalid fixture username: {err}")))?;
    let email = EmailAddress::new("admin@example.com")
        .map_err(|err| Error::internal(format!("invalid fixture email: {err}")))?;
    let epoch = chrono::DateTime::UNIX_EPOCH;
    Ok(User::new(id, username, email, epoch, epoch))
}

/// Deterministic account workflows used until persistence is wired.
///
/// `admin` / `password` signs in as a fixed user; every other login is
/// rejected. Registration is always refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAccountCommand;

#[async_trait]
impl AccountCommand for FixtureAccountCommand {
    async fn register(&self, _request: &RegistrationRequest) -> Result<AccountOutcome, Error> {
        Ok(AccountOutcome::rejected(
            "username",
            "registration is disabled",
        ))
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<AccountOutcome, Error> {
        let known = matches!(
            credentials.lookup(),
            crate::domain::AccountLookup::Username(name) if name == "admin"
        );
        if !known {
            return Ok(AccountOutcome::rejected(
                "usernameOrEmail",
                "User does not exist",
            ));
        }
        if credentials.password().expose() != "password" {
            return Ok(AccountOutcome::rejected("password", "Incorrect password"));
        }
        fixture_user().map(AccountOutcome::Authenticated)
    }

    async fn forgot_password(&self, _email: &str) -> Result<bool, Error> {
        Ok(true)
    }

    async fn change_password(
        &self,
        _token: &str,
        _new_password: &str,
    ) -> Result<AccountOutcome, Error> {
        Ok(AccountOutcome::rejected("token", "token is invalid or expired"))
    }
}

/// Account query that resolves only the fixture user.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAccountQuery;

#[async_trait]
impl AccountQuery for FixtureAccountQuery {
    async fn me(&self, ctx: &RequestContext) -> Result<Option<User>, Error> {
        let user = fixture_user()?;
        Ok(ctx.viewer().filter(|id| *id == user.id()).map(|_| user.clone()))
    }
}
