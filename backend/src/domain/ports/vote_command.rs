//! Driving port for casting votes.

use async_trait::async_trait;

use crate::domain::{Error, PostId, RequestContext};

/// Domain use-case port for voting.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteCommand: Send + Sync {
    /// Record the signed-in user's vote. `raw == -1` downvotes, anything
    /// else upvotes.
    ///
    /// Returns `false` when the user already holds a vote of that sign.
    async fn cast_vote(&self, ctx: &RequestContext, post_id: &PostId, raw: i32)
    -> Result<bool, Error>;
}

/// Fixture vote command: every post is missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVoteCommand;

#[async_trait]
impl VoteCommand for FixtureVoteCommand {
    async fn cast_vote(
        &self,
        ctx: &RequestContext,
        post_id: &PostId,
        _raw: i32,
    ) -> Result<bool, Error> {
        ctx.require_user()?;
        Err(Error::not_found(format!("post {post_id} not found")))
    }
}
