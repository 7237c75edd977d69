//! Posts, votes and feed entries.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{User, UserId};

/// Maximum number of characters in a feed snippet.
pub const SNIPPET_LEN: usize = 50;

/// Errors returned when parsing a [`PostId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("post id must be a valid UUID")]
pub struct PostIdError;

/// Stable post identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostId(Uuid);

impl PostId {
    /// Parse a post identifier.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PostIdError> {
        Uuid::parse_str(raw.as_ref().trim())
            .map(Self)
            .map_err(|_| PostIdError)
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised while validating post content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostValidationError {
    /// The title was blank once trimmed.
    #[error("title must not be empty")]
    EmptyTitle,
    /// The body was blank once trimmed.
    #[error("text must not be empty")]
    EmptyText,
}

impl PostValidationError {
    /// Input field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "title",
            Self::EmptyText => "text",
        }
    }
}

/// Validated title and body for a new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    title: String,
    text: String,
}

impl PostDraft {
    /// Validate post content.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Result<Self, PostValidationError> {
        let title = title.into();
        let text = text.into();
        validate_title(&title)?;
        if text.trim().is_empty() {
            return Err(PostValidationError::EmptyText);
        }
        Ok(Self { title, text })
    }

    /// Post title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Post body.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }
}

/// Reject blank titles.
pub fn validate_title(title: &str) -> Result<(), PostValidationError> {
    if title.trim().is_empty() {
        return Err(PostValidationError::EmptyTitle);
    }
    Ok(())
}

/// Stored post.
///
/// `points` always equals the sum of vote values recorded for the post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Identifier.
    pub id: PostId,
    /// Title.
    pub title: String,
    /// Body.
    pub text: String,
    /// Running vote total.
    pub points: i32,
    /// Author.
    pub creator_id: UserId,
    /// Creation time; also the feed ordering key.
    pub created_at: DateTime<Utc>,
    /// Last edit time.
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// First [`SNIPPET_LEN`] characters of the body.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use forum_backend::domain::{Post, PostId, UserId};
    ///
    /// let post = Post {
    ///     id: PostId::random(),
    ///     title: "t".into(),
    ///     text: "x".repeat(80),
    ///     points: 0,
    ///     creator_id: UserId::random(),
    ///     created_at: Utc::now(),
    ///     updated_at: Utc::now(),
    /// };
    /// assert_eq!(post.text_snippet().chars().count(), 50);
    /// ```
    pub fn text_snippet(&self) -> &str {
        match self.text.char_indices().nth(SNIPPET_LEN) {
            Some((idx, _)) => &self.text[..idx],
            None => self.text.as_str(),
        }
    }
}

/// Direction of a single user's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteValue {
    /// +1
    Up,
    /// -1
    Down,
}

impl VoteValue {
    /// Normalise a client value: `-1` is a downvote, anything else an upvote.
    pub fn from_raw(raw: i32) -> Self {
        if raw == -1 { Self::Down } else { Self::Up }
    }

    /// Signed numeric value.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    /// Parse a stored value, rejecting anything but `1` and `-1`.
    pub fn from_stored(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Up),
            -1 => Some(Self::Down),
            _ => None,
        }
    }
}

/// Vote row mutation decided by the vote aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    /// First vote: insert the row if absent and add `value` to points.
    Cast {
        /// New vote.
        value: VoteValue,
    },
    /// Sign change: update the row if it still holds `from` and add
    /// `2 * to` to points.
    Flip {
        /// Value the row is expected to hold.
        from: VoteValue,
        /// Replacement value.
        to: VoteValue,
    },
}

impl VoteChange {
    /// Change applied to the post's running total.
    pub fn points_delta(self) -> i32 {
        match self {
            Self::Cast { value } => value.as_i32(),
            Self::Flip { to, .. } => 2 * to.as_i32(),
        }
    }

    /// Value the vote row holds after the change.
    pub fn target(self) -> VoteValue {
        match self {
            Self::Cast { value } => value,
            Self::Flip { to, .. } => to,
        }
    }
}

/// Outcome of a guarded vote write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteWrite {
    /// Row and points updated together.
    Applied,
    /// The row changed underneath the caller; nothing was written.
    Conflicted,
}

/// Post annotated for a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// The post itself.
    pub post: Post,
    /// Author profile.
    pub creator: User,
    /// The viewer's own vote, if any.
    pub vote_status: Option<VoteValue>,
}

/// Truncate a timestamp to whole milliseconds, the cursor resolution.
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case(-1, VoteValue::Down)]
    #[case(1, VoteValue::Up)]
    #[case(0, VoteValue::Up)]
    #[case(7, VoteValue::Up)]
    #[case(-5, VoteValue::Up)]
    fn normalises_raw_votes(#[case] raw: i32, #[case] expected: VoteValue) {
        assert_eq!(VoteValue::from_raw(raw), expected);
    }

    #[rstest]
    #[case(VoteChange::Cast { value: VoteValue::Up }, 1)]
    #[case(VoteChange::Cast { value: VoteValue::Down }, -1)]
    #[case(VoteChange::Flip { from: VoteValue::Up, to: VoteValue::Down }, -2)]
    #[case(VoteChange::Flip { from: VoteValue::Down, to: VoteValue::Up }, 2)]
    fn points_delta(#[case] change: VoteChange, #[case] expected: i32) {
        assert_eq!(change.points_delta(), expected);
    }

    #[rstest]
    #[case("", "body", PostValidationError::EmptyTitle)]
    #[case("title", "  ", PostValidationError::EmptyText)]
    fn drafts_require_content(
        #[case] title: &str,
        #[case] text: &str,
        #[case] expected: PostValidationError,
    ) {
        assert_eq!(PostDraft::new(title, text), Err(expected));
    }

    #[rstest]
    fn snippet_respects_char_boundaries() {
        let post = Post {
            id: PostId::random(),
            title: "t".into(),
            text: "é".repeat(60),
            points: 0,
            creator_id: UserId::random(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(post.text_snippet().chars().count(), SNIPPET_LEN);
    }

    #[rstest]
    fn truncation_drops_sub_millisecond_precision() {
        let at = Utc
            .timestamp_opt(1_700_000_000, 123_456_789)
            .single()
            .expect("valid timestamp");
        assert_eq!(truncate_to_millis(at).timestamp_subsec_nanos(), 123_000_000);
    }
}
