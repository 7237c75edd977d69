//! Driving port for post reads and the paginated feed.

use async_trait::async_trait;
use pagination::TimestampCursor;

use crate::domain::{Error, FeedEntry, PostId, RequestContext};

/// One page of the reverse-chronological feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    /// Entries, newest first.
    pub entries: Vec<FeedEntry>,
    /// Whether older posts exist.
    pub has_more: bool,
    /// Cursor for the next page, present exactly when `has_more` is true.
    pub next_cursor: Option<TimestampCursor>,
}

impl FeedPage {
    /// A page with no entries.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            has_more: false,
            next_cursor: None,
        }
    }
}

/// Domain use-case port for reading posts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostQuery: Send + Sync {
    /// Fetch one post annotated for the viewer. `None` when it does not exist.
    async fn get_post(&self, ctx: &RequestContext, id: &PostId)
    -> Result<Option<FeedEntry>, Error>;

    /// List up to `limit` posts older than `cursor`.
    async fn list_posts(
        &self,
        ctx: &RequestContext,
        limit: i64,
        cursor: Option<TimestampCursor>,
    ) -> Result<FeedPage, Error>;
}

/// Fixture post query with an empty feed.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePostQuery;

#[async_trait]
impl PostQuery for FixturePostQuery {
    async fn get_post(
        &self,
        _ctx: &RequestContext,
        _id: &PostId,
    ) -> Result<Option<FeedEntry>, Error> {
        Ok(None)
    }

    async fn list_posts(
        &self,
        _ctx: &RequestContext,
        _limit: i64,
        _cursor: Option<TimestampCursor>,
    ) -> Result<FeedPage, Error> {
        Ok(FeedPage::empty())
    }
}
