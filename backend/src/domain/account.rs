//! Account workflow types: registration input, field errors and reset tokens.

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::{EmailAddress, PasswordHash, PlainPassword, User, Username};

/// Number of random bytes in a reset token.
const RESET_TOKEN_BYTES: usize = 32;

/// Validation failure tied to one input field.
///
/// # Examples
/// ```
/// use forum_backend::domain::FieldError;
///
/// let err = FieldError::new("username", "username is already taken");
/// assert_eq!(err.field(), "username");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    field: String,
    message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Name of the offending input field.
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Message shown next to the field.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Result of an account workflow.
///
/// Validation problems are returned as data, never as [`super::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    /// The workflow succeeded and the user should be signed in.
    Authenticated(User),
    /// Field-level validation failures.
    Rejected(Vec<FieldError>),
}

impl AccountOutcome {
    /// Shorthand for a single field error.
    pub fn rejected(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected(vec![FieldError::new(field, message)])
    }
}

/// Raw registration payload.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Requested handle.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Chosen password.
    pub password: String,
}

impl RegistrationRequest {
    /// Validate fields in order, returning the first failure.
    pub fn validate(&self) -> Result<ValidRegistration, FieldError> {
        let username = Username::new(self.username.as_str())
            .map_err(|err| FieldError::new("username", err.to_string()))?;
        let email = EmailAddress::new(self.email.as_str())
            .map_err(|err| FieldError::new("email", err.to_string()))?;
        let password = PlainPassword::new(&self.password)
            .map_err(|err| FieldError::new("password", err.to_string()))?;
        Ok(ValidRegistration {
            username,
            email,
            password,
        })
    }
}

/// Registration payload that passed validation.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
    /// Requested handle.
    pub username: Username,
    /// Contact address.
    pub email: EmailAddress,
    /// Chosen password.
    pub password: PlainPassword,
}

/// Insert payload handed to the user repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Fully populated user record.
    pub user: User,
    /// Digest of the chosen password.
    pub password_hash: PasswordHash,
}

/// User together with the credential needed to verify a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Public user record.
    pub user: User,
    /// Stored password digest.
    pub password_hash: PasswordHash,
}

/// Single-use password reset token.
///
/// Only [`ResetToken::digest`] is ever persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetToken(Zeroizing<String>);

impl ResetToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0_u8; RESET_TOKEN_BYTES]);
        OsRng.fill_bytes(bytes.as_mut());
        Self(Zeroizing::new(hex::encode(bytes.as_ref())))
    }

    /// Wrap a token received from a client.
    pub fn from_client(raw: &str) -> Self {
        Self(Zeroizing::new(raw.to_owned()))
    }

    /// Token text for building links.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Hex-encoded SHA-256 of the token used as the storage key.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl fmt::Debug for ResetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResetToken(<redacted>)")
    }
}
