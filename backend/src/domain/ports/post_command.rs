//! Driving port for post mutations.

use async_trait::async_trait;

use crate::domain::{Error, Post, PostId, RequestContext};

/// Domain use-case port for creating, editing and deleting posts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostCommand: Send + Sync {
    /// Create a post owned by the signed-in user.
    async fn create(&self, ctx: &RequestContext, title: &str, text: &str) -> Result<Post, Error>;

    /// Retitle a post. `None` leaves the title unchanged.
    ///
    /// Returns `Ok(None)` when the post does not exist.
    async fn update(
        &self,
        ctx: &RequestContext,
        id: &PostId,
        title: Option<String>,
    ) -> Result<Option<Post>, Error>;

    /// Delete a post and its votes. Returns `false` when it did not exist.
    async fn delete(&self, ctx: &RequestContext, id: &PostId) -> Result<bool, Error>;
}

/// Fixture post command that authenticates but stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePostCommand;

#[async_trait]
impl PostCommand for FixturePostCommand {
    async fn create(&self, ctx: &RequestContext, title: &str, text: &str) -> Result<Post, Error> {
        let creator_id = ctx.require_user()?.clone();
        let now = chrono::Utc::now();
        Ok(Post {
            id: PostId::random(),
            title: title.to_owned(),
            text: text.to_owned(),
            points: 0,
            creator_id,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        _id: &PostId,
        _title: Option<String>,
    ) -> Result<Option<Post>, Error> {
        ctx.require_user()?;
        Ok(None)
    }

    async fn delete(&self, ctx: &RequestContext, _id: &PostId) -> Result<bool, Error> {
        ctx.require_user()?;
        Ok(false)
    }
}
