//! Opaque timestamp cursor.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while decoding a cursor supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    /// The cursor string was empty or whitespace.
    #[error("cursor must not be empty")]
    Empty,
    /// The cursor was not a decimal integer.
    #[error("cursor '{value}' is not a millisecond timestamp")]
    Malformed {
        /// Raw value received from the client.
        value: String,
    },
    /// The timestamp does not fit the supported date range.
    #[error("cursor timestamp {millis} is out of range")]
    OutOfRange {
        /// Parsed millisecond value.
        millis: i64,
    },
}

/// Position in a reverse-chronological listing.
///
/// Clients treat the value as opaque. It encodes the creation instant of the
/// last item they received, at millisecond precision, and the next page holds
/// items strictly older than it.
///
/// # Examples
///
/// ```
/// use pagination::TimestampCursor;
///
/// let cursor: TimestampCursor = "1700000000123".parse().expect("valid cursor");
/// assert_eq!(cursor.encode(), "1700000000123");
/// assert_eq!(cursor.at().timestamp_millis(), 1_700_000_000_123);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimestampCursor(DateTime<Utc>);

impl TimestampCursor {
    /// Build a cursor pointing at `at`, dropping sub-millisecond precision.
    #[must_use]
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let millis = at.timestamp_millis();
        DateTime::from_timestamp_millis(millis).map_or(Self(at), Self)
    }

    /// Instant the cursor points at.
    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        self.0
    }

    /// Wire representation: decimal milliseconds since the UNIX epoch.
    #[must_use]
    pub fn encode(&self) -> String {
        self.0.timestamp_millis().to_string()
    }
}

impl fmt::Display for TimestampCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.timestamp_millis())
    }
}

impl FromStr for TimestampCursor {
    type Err = CursorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CursorError::Empty);
        }
        let millis = trimmed
            .parse::<i64>()
            .map_err(|_| CursorError::Malformed {
                value: trimmed.to_owned(),
            })?;
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .ok_or(CursorError::OutOfRange { millis })
    }
}

impl TryFrom<String> for TimestampCursor {
    type Error = CursorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimestampCursor> for String {
    fn from(value: TimestampCursor) -> Self {
        value.encode()
    }
}
