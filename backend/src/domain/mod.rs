//! Domain primitives, services and ports.
//!
//! Purpose: Define strongly typed entities and the use-case services that
//! operate on them. Services depend only on the driven ports in [`ports`];
//! inbound adapters call the driving ports.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Post, FeedEntry: forum entities.
//! - AccountService, PostService, VoteAggregator, FeedPaginator: use cases.

mod account;
mod account_service;
mod auth;
pub mod error;
mod feed_paginator;
mod post;
mod post_service;
pub mod ports;
mod trace_id;
mod user;
mod vote_aggregator;

pub use self::account::{
    AccountOutcome, FieldError, NewAccount, RegistrationRequest, ResetToken, UserAccount,
    ValidRegistration,
};
pub use self::account_service::{AccountService, AccountServicePorts, RESET_TOKEN_TTL};
pub use self::auth::{
    AccountLookup, LoginCredentials, PASSWORD_MIN, PasswordError, PasswordHash, PlainPassword,
    RequestContext, can_modify,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::feed_paginator::{FeedPaginator, MAX_FEED_LIMIT};
pub use self::post::{
    FeedEntry, Post, PostDraft, PostId, PostIdError, PostValidationError, SNIPPET_LEN, VoteChange,
    VoteValue, VoteWrite, truncate_to_millis, validate_title,
};
pub use self::post_service::PostService;
pub use self::trace_id::TraceId;
pub use self::user::{
    EmailAddress, EmailError, USERNAME_MIN, User, UserId, UserIdError, Username, UsernameError,
};
pub use self::vote_aggregator::{MAX_VOTE_ATTEMPTS, VoteAggregator, plan_vote};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use forum_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
