//! Port for post, vote and feed persistence.
//!
//! Vote writes are guarded so a racing writer is reported as
//! [`VoteWrite::Conflicted`] instead of being applied twice. Adapters must
//! update the vote row and the post's `points` in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{FeedEntry, Post, PostId, UserId, VoteChange, VoteValue, VoteWrite};

use super::define_port_error;

define_port_error! {
    /// Errors raised by post repository adapters.
    pub enum PostRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "post repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "post repository query failed: {message}",
        /// The referenced post does not exist.
        PostNotFound { post_id: String } => "post {post_id} not found",
    }
}

/// Parameters for one feed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    /// User whose votes annotate the entries.
    pub viewer: Option<UserId>,
    /// Only posts created strictly before this instant.
    pub before: Option<DateTime<Utc>>,
    /// Maximum number of rows to return, newest first.
    pub fetch: usize,
}

/// Port for reading and mutating posts and their votes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Persist a new post.
    async fn insert(&self, post: &Post) -> Result<(), PostRepositoryError>;

    /// Fetch a post by identifier.
    async fn find_by_id(&self, id: &PostId) -> Result<Option<Post>, PostRepositoryError>;

    /// Fetch a post with its author and the viewer's vote.
    async fn find_entry(
        &self,
        id: &PostId,
        viewer: Option<UserId>,
    ) -> Result<Option<FeedEntry>, PostRepositoryError>;

    /// Change a post's title, returning the updated post if it exists.
    async fn update_title(
        &self,
        id: &PostId,
        title: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostRepositoryError>;

    /// Delete a post and its votes. Returns `false` when nothing was removed.
    async fn delete(&self, id: &PostId) -> Result<bool, PostRepositoryError>;

    /// Read a user's current vote on a post.
    async fn find_vote(
        &self,
        user_id: &UserId,
        post_id: &PostId,
    ) -> Result<Option<VoteValue>, PostRepositoryError>;

    /// Apply a guarded vote change and the matching points delta atomically.
    ///
    /// Fails with [`PostRepositoryError::PostNotFound`] when the post is gone.
    async fn apply_vote(
        &self,
        user_id: &UserId,
        post_id: &PostId,
        change: VoteChange,
    ) -> Result<VoteWrite, PostRepositoryError>;

    /// List feed entries newest first.
    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<FeedEntry>, PostRepositoryError>;
}

/// Fixture implementation for tests that do not exercise post persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePostRepository;

#[async_trait]
impl PostRepository for FixturePostRepository {
    async fn insert(&self, _post: &Post) -> Result<(), PostRepositoryError> {
        Ok(())
    }

    async fn find_by_id(&self, _id: &PostId) -> Result<Option<Post>, PostRepositoryError> {
        Ok(None)
    }

    async fn find_entry(
        &self,
        _id: &PostId,
        _viewer: Option<UserId>,
    ) -> Result<Option<FeedEntry>, PostRepositoryError> {
        Ok(None)
    }

    async fn update_title(
        &self,
        _id: &PostId,
        _title: &str,
        _updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostRepositoryError> {
        Ok(None)
    }

    async fn delete(&self, _id: &PostId) -> Result<bool, PostRepositoryError> {
        Ok(false)
    }

    async fn find_vote(
        &self,
        _user_id: &UserId,
        _post_id: &PostId,
    ) -> Result<Option<VoteValue>, PostRepositoryError> {
        Ok(None)
    }

    async fn apply_vote(
        &self,
        _user_id: &UserId,
        post_id: &PostId,
        _change: VoteChange,
    ) -> Result<VoteWrite, PostRepositoryError> {
        Err(PostRepositoryError::post_not_found(post_id.to_string()))
    }

    async fn list_feed(&self, _query: &FeedQuery) -> Result<Vec<FeedEntry>, PostRepositoryError> {
        Ok(Vec::new())
    }
}
