//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod password_hasher;
mod password_reset_notifier;
mod post_command;
mod post_query;
mod post_repository;
mod reset_token_store;
mod user_repository;
mod vote_command;

#[cfg(test)]
pub use account_command::{MockAccountCommand, MockAccountQuery};
pub use account_command::{
    AccountCommand, AccountQuery, FixtureAccountCommand, FixtureAccountQuery,
};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use password_reset_notifier::MockPasswordResetNotifier;
pub use password_reset_notifier::{NotifierError, PasswordResetNotifier};
#[cfg(test)]
pub use post_command::MockPostCommand;
pub use post_command::{FixturePostCommand, PostCommand};
#[cfg(test)]
pub use post_query::MockPostQuery;
pub use post_query::{FeedPage, FixturePostQuery, PostQuery};
#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::{FeedQuery, FixturePostRepository, PostRepository, PostRepositoryError};
#[cfg(test)]
pub use reset_token_store::MockResetTokenStore;
pub use reset_token_store::{ResetTokenStore, ResetTokenStoreError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{FixtureUserRepository, UserPersistenceError, UserRepository};
#[cfg(test)]
pub use vote_command::MockVoteCommand;
pub use vote_command::{FixtureVoteCommand, VoteCommand};
