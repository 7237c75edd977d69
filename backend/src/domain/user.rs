//! User account model.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Minimum number of characters in a username.
pub const USERNAME_MIN: usize = 6;

/// Errors returned when parsing a [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserIdError {
    /// The identifier was empty.
    #[error("user id must not be empty")]
    Empty,
    /// The identifier was not a canonical UUID.
    #[error("user id must be a valid UUID")]
    Invalid,
}

/// Errors returned when validating a [`Username`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    /// Fewer than [`USERNAME_MIN`] characters.
    #[error("username must be at least {min} characters long")]
    TooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// Contains `@`, which is reserved for email lookups.
    #[error("username cannot contain special characters")]
    ContainsAt,
}

/// Errors returned when validating an [`EmailAddress`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    /// The address has no `@`.
    #[error("invalid email")]
    MissingAt,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserIdError> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(UserIdError::Empty);
        }
        if id.trim() != id {
            return Err(UserIdError::Invalid);
        }
        let parsed = Uuid::parse_str(id).map_err(|_| UserIdError::Invalid)?;
        Ok(Self(parsed, id.to_owned()))
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Unique public handle.
///
/// ## Invariants
/// - At least [`USERNAME_MIN`] characters.
/// - Never contains `@`, so login input can be routed to email or username
///   lookups unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate a username.
    pub fn new(raw: impl Into<String>) -> Result<Self, UsernameError> {
        let raw = raw.into();
        if raw.chars().count() < USERNAME_MIN {
            return Err(UsernameError::TooShort { min: USERNAME_MIN });
        }
        if raw.contains('@') {
            return Err(UsernameError::ContainsAt);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contact address used for password resets. Only shown to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate an email address. Only the presence of `@` is checked.
    pub fn new(raw: impl Into<String>) -> Result<Self, EmailError> {
        let raw = raw.into();
        if !raw.contains('@') {
            return Err(EmailError::MissingAt);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registered user.
///
/// The password hash is deliberately absent; see
/// [`UserAccount`](crate::domain::UserAccount) for credential checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
    email: EmailAddress,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Assemble a user from validated components.
    pub fn new(
        id: UserId,
        username: Username,
        email: EmailAddress,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            created_at,
            updated_at,
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Public handle.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Contact address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Email as seen by `viewer`: the address for its owner, empty otherwise.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use forum_backend::domain::{EmailAddress, User, UserId, Username};
    ///
    /// let now = Utc::now();
    /// let user = User::new(
    ///     UserId::random(),
    ///     Username::new("lovelace").expect("valid username"),
    ///     EmailAddress::new("ada@example.com").expect("valid email"),
    ///     now,
    ///     now,
    /// );
    /// assert_eq!(user.email_for(Some(user.id())), "ada@example.com");
    /// assert_eq!(user.email_for(None), "");
    /// ```
    pub fn email_for(&self, viewer: Option<&UserId>) -> &str {
        match viewer {
            Some(viewer) if viewer == &self.id => self.email.as_ref(),
            _ => "",
        }
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    #[case("not-a-uuid")]
    fn user_id_rejects_malformed_input(#[case] raw: &str) {
        assert!(UserId::new(raw).is_err());
    }

    #[rstest]
    fn user_id_keeps_canonical_text() {
        let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
        assert_eq!(id.as_ref(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
        assert_eq!(UserId::from_uuid(*id.as_uuid()), id);
    }

    #[rstest]
    #[case("bob", UsernameError::TooShort { min: USERNAME_MIN })]
    #[case("abcde", UsernameError::TooShort { min: USERNAME_MIN })]
    #[case("bob@home", UsernameError::ContainsAt)]
    fn username_rules(#[case] raw: &str, #[case] expected: UsernameError) {
        assert_eq!(Username::new(raw), Err(expected));
    }

    #[rstest]
    fn username_messages_match_client_copy() {
        assert_eq!(
            UsernameError::TooShort { min: USERNAME_MIN }.to_string(),
            "username must be at least 6 characters long"
        );
        assert_eq!(
            UsernameError::ContainsAt.to_string(),
            "username cannot contain special characters"
        );
    }

    #[rstest]
    fn email_requires_at_sign() {
        assert_eq!(EmailAddress::new("nobody"), Err(EmailError::MissingAt));
        assert!(EmailAddress::new("a@b").is_ok());
    }
}
