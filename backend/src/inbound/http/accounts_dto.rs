//! Request and response payloads for the account endpoints.
//!
//! Field names are camelCase on the wire. A user's email is only rendered
//! for that user; every other viewer receives an empty string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AccountOutcome, FieldError, RegistrationRequest, User, UserId};

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    /// Stable user identifier.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    /// Public handle.
    #[schema(example = "lovelace")]
    pub username: String,
    /// Email address, empty unless the viewer is this user.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
    /// Last account change.
    pub updated_at: DateTime<Utc>,
}

impl UserDto {
    /// Render `user` for `viewer`.
    pub fn for_viewer(user: &User, viewer: Option<&UserId>) -> Self {
        Self {
            id: user.id().to_string(),
            username: user.username().as_ref().to_owned(),
            email: user.email_for(viewer).to_owned(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }

    /// Render `user` for themselves.
    pub fn own(user: &User) -> Self {
        Self::for_viewer(user, Some(user.id()))
    }
}

/// A validation failure tied to one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldErrorDto {
    /// Input field name, as sent by the client.
    #[schema(example = "username")]
    pub field: String,
    /// Message suitable for display next to the field.
    #[schema(example = "username is already taken")]
    pub message: String,
}

impl From<&FieldError> for FieldErrorDto {
    fn from(err: &FieldError) -> Self {
        Self {
            field: err.field().to_owned(),
            message: err.message().to_owned(),
        }
    }
}

/// Result of register, login and change-password.
///
/// Exactly one of `errors` and `user` is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Field errors when the operation was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldErrorDto>>,
    /// The signed-in user on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDto>,
}

impl From<&AccountOutcome> for UserResponse {
    fn from(outcome: &AccountOutcome) -> Self {
        match outcome {
            AccountOutcome::Authenticated(user) => Self {
                errors: None,
                user: Some(UserDto::own(user)),
            },
            AccountOutcome::Rejected(errors) => Self {
                errors: Some(errors.iter().map(FieldErrorDto::from).collect()),
                user: None,
            },
        }
    }
}

/// Body for `POST /api/v1/register`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Desired handle; more than five characters, no `@`.
    #[schema(example = "lovelace")]
    pub username: String,
    /// Contact address.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Password; more than three characters.
    pub password: String,
}

impl From<RegisterRequest> for RegistrationRequest {
    fn from(value: RegisterRequest) -> Self {
        Self {
            username: value.username,
            email: value.email,
            password: value.password,
        }
    }
}

/// Body for `POST /api/v1/login`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username, or email when it contains `@`.
    #[schema(example = "lovelace")]
    pub username_or_email: String,
    /// Account password.
    pub password: String,
}

/// Body for `POST /api/v1/forgot-password`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    /// Address to send the reset link to.
    #[schema(example = "ada@example.com")]
    pub email: String,
}

/// Body for `POST /api/v1/change-password`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Token from the reset link.
    pub token: String,
    /// Replacement password; more than three characters.
    pub new_password: String,
}
