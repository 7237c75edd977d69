//! Request and response payloads for the post endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{FeedEntry, Post, UserId};
use crate::domain::ports::FeedPage;
use crate::inbound::http::accounts_dto::UserDto;

/// Default page size when `limit` is omitted.
pub const DEFAULT_FEED_LIMIT: i64 = 10;

/// A post as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    /// Post identifier.
    #[schema(example = "0b6f0c8e-6c47-4b8a-9a7b-1f6d1c2a3e4f")]
    pub id: String,
    /// Title.
    pub title: String,
    /// Full body text.
    pub text: String,
    /// Sum of all votes.
    pub points: i32,
    /// Author identifier.
    pub creator_id: String,
    /// Creation time; feed ordering key.
    pub created_at: DateTime<Utc>,
    /// Last edit.
    pub updated_at: DateTime<Utc>,
}

impl From<&Post> for PostDto {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.to_string(),
            title: post.title.clone(),
            text: post.text.clone(),
            points: post.points,
            creator_id: post.creator_id.to_string(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// A post annotated for the requesting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntryDto {
    /// The post.
    #[serde(flatten)]
    pub post: PostDto,
    /// First 50 characters of the text.
    pub text_snippet: String,
    /// Author profile.
    pub creator: UserDto,
    /// The requester's own vote: `1`, `-1` or `null`.
    #[schema(example = 1)]
    pub vote_status: Option<i32>,
}

impl FeedEntryDto {
    /// Render `entry` for `viewer`.
    pub fn for_viewer(entry: &FeedEntry, viewer: Option<&UserId>) -> Self {
        Self {
            post: PostDto::from(&entry.post),
            text_snippet: entry.post.text_snippet().to_owned(),
            creator: UserDto::for_viewer(&entry.creator, viewer),
            vote_status: entry.vote_status.map(|vote| vote.as_i32()),
        }
    }
}

/// One page of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedPostsDto {
    /// Posts, newest first.
    pub posts: Vec<FeedEntryDto>,
    /// Whether older posts exist.
    pub has_more: bool,
    /// Pass as `cursor` to fetch the next page; present when `hasMore`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "1714000000123")]
    pub next_cursor: Option<String>,
}

impl PaginatedPostsDto {
    /// Render `page` for `viewer`.
    pub fn for_viewer(page: &FeedPage, viewer: Option<&UserId>) -> Self {
        Self {
            posts: page
                .entries
                .iter()
                .map(|entry| FeedEntryDto::for_viewer(entry, viewer))
                .collect(),
            has_more: page.has_more,
            next_cursor: page.next_cursor.map(|cursor| cursor.encode()),
        }
    }
}

/// Query string for `GET /api/v1/posts`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedParams {
    /// Page size, clamped to `1..=50`. Defaults to 10.
    pub limit: Option<i64>,
    /// Millisecond timestamp from a previous page's `nextCursor`.
    pub cursor: Option<String>,
}

/// Body for `POST /api/v1/posts`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    /// Non-blank title.
    pub title: String,
    /// Non-blank body.
    pub text: String,
}

/// Body for `PATCH /api/v1/posts/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdatePostRequest {
    /// New title; omit to leave unchanged.
    #[serde(default)]
    pub title: Option<String>,
}

/// Body for `POST /api/v1/posts/{id}/vote`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VoteRequest {
    /// `-1` downvotes; any other number upvotes.
    #[schema(example = 1)]
    pub value: i32,
}
