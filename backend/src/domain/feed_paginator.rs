//! Reverse-chronological, cursor-paginated post feed.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageLimit, TimestampCursor};

use super::post_service::map_post_repository_error;
use crate::domain::ports::{FeedPage, FeedQuery, PostQuery, PostRepository};
use crate::domain::{Error, FeedEntry, PostId, RequestContext};

/// Largest page a client may request.
pub const MAX_FEED_LIMIT: usize = 50;

/// Post read service implementing [`PostQuery`].
///
/// Fetches one row more than the page size and uses its presence to set
/// `has_more`. Cursors are the creation timestamp of the last entry; the next
/// page holds posts created strictly before it.
#[derive(Clone)]
pub struct FeedPaginator<R> {
    repo: Arc<R>,
}

impl<R> FeedPaginator<R> {
    /// Create a new paginator over the given repository.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R> PostQuery for FeedPaginator<R>
where
    R: PostRepository,
{
    async fn get_post(
        &self,
        ctx: &RequestContext,
        id: &PostId,
    ) -> Result<Option<FeedEntry>, Error> {
        self.repo
            .find_entry(id, ctx.viewer().cloned())
            .await
            .map_err(map_post_repository_error)
    }

    async fn list_posts(
        &self,
        ctx: &RequestContext,
        limit: i64,
        cursor: Option<TimestampCursor>,
    ) -> Result<FeedPage, Error> {
        let limit = PageLimit::clamped(limit, MAX_FEED_LIMIT);
        let query = FeedQuery {
            viewer: ctx.viewer().cloned(),
            before: cursor.map(|cursor| cursor.at()),
            fetch: limit.probe_len(),
        };
        let rows = self
            .repo
            .list_feed(&query)
            .await
            .map_err(map_post_repository_error)?;

        let page = Page::from_probe(rows, limit);
        let next_cursor =
            page.next_cursor(|entry| TimestampCursor::from_datetime(entry.post.created_at));
        let (entries, has_more) = page.into_parts();
        Ok(FeedPage {
            entries,
            has_more,
            next_cursor,
        })
    }
}

#[cfg(test)]
#[path = "feed_paginator_tests.rs"]
mod tests;
