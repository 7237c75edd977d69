//! Authentication primitives: passwords, login lookups and request context.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use zeroize::Zeroizing;

use super::{Error, UserId};

/// Minimum number of characters in a password.
pub const PASSWORD_MIN: usize = 4;

/// Errors returned when validating a [`PlainPassword`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    /// Fewer than [`PASSWORD_MIN`] characters.
    #[error("password must be at least {min} characters long")]
    TooShort {
        /// Minimum accepted length.
        min: usize,
    },
}

/// Caller-supplied password, wiped from memory on drop.
///
/// Whitespace is kept as typed to avoid surprising credential comparisons.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainPassword(Zeroizing<String>);

impl PlainPassword {
    /// Validate a new password.
    pub fn new(raw: &str) -> Result<Self, PasswordError> {
        if raw.chars().count() < PASSWORD_MIN {
            return Err(PasswordError::TooShort { min: PASSWORD_MIN });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Wrap a password typed at login without applying strength rules.
    pub fn unchecked(raw: &str) -> Self {
        Self(Zeroizing::new(raw.to_owned()))
    }

    /// Borrow the password text.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(<redacted>)")
    }
}

/// Stored password digest in PHC string format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded digest.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// How a login identifier is resolved to an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountLookup {
    /// Input contained `@`.
    Email(String),
    /// Any other input.
    Username(String),
}

impl AccountLookup {
    /// Route the raw `usernameOrEmail` input.
    ///
    /// # Examples
    /// ```
    /// use forum_backend::domain::AccountLookup;
    ///
    /// assert!(matches!(AccountLookup::from_input("a@b.c"), AccountLookup::Email(_)));
    /// assert!(matches!(AccountLookup::from_input("alice"), AccountLookup::Username(_)));
    /// ```
    pub fn from_input(raw: &str) -> Self {
        if raw.contains('@') {
            Self::Email(raw.to_owned())
        } else {
            Self::Username(raw.to_owned())
        }
    }
}

/// Login request after lookup routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    lookup: AccountLookup,
    password: PlainPassword,
}

impl LoginCredentials {
    /// Build credentials from raw inputs.
    pub fn from_parts(username_or_email: &str, password: &str) -> Self {
        Self {
            lookup: AccountLookup::from_input(username_or_email),
            password: PlainPassword::unchecked(password),
        }
    }

    /// Account lookup derived from the identifier.
    pub fn lookup(&self) -> &AccountLookup {
        &self.lookup
    }

    /// Password supplied by the caller.
    pub fn password(&self) -> &PlainPassword {
        &self.password
    }
}

/// Per-request identity handed to every core operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    viewer: Option<UserId>,
}

impl RequestContext {
    /// Context for a request without a session.
    pub fn anonymous() -> Self {
        Self { viewer: None }
    }

    /// Context for a signed-in user.
    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            viewer: Some(user_id),
        }
    }

    /// Signed-in user, if any.
    pub fn viewer(&self) -> Option<&UserId> {
        self.viewer.as_ref()
    }

    /// Signed-in user or [`Error::unauthorized`].
    pub fn require_user(&self) -> Result<&UserId, Error> {
        self.viewer
            .as_ref()
            .ok_or_else(|| Error::unauthorized("not authenticated"))
    }
}

/// Whether `user_id` may edit or delete content owned by `creator_id`.
pub fn can_modify(user_id: &UserId, creator_id: &UserId) -> bool {
    user_id == creator_id
}
