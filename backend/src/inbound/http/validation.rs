//! Shared parsing helpers for inbound HTTP adapters.
//!
//! Failures become `invalid_request` errors whose details name the offending
//! field, the rejected value and a stable code.

use std::str::FromStr;

use pagination::TimestampCursor;
use serde_json::json;

use crate::domain::{Error, PostId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidCursor,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidCursor => "invalid_cursor",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn rejected(field: FieldName, code: ErrorCode, message: String, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

/// Parse a post identifier taken from the URL path.
pub(crate) fn parse_post_id(value: &str, field: FieldName) -> Result<PostId, Error> {
    PostId::new(value).map_err(|_| {
        rejected(
            field,
            ErrorCode::InvalidUuid,
            format!("{} must be a valid UUID", field.as_str()),
            value,
        )
    })
}

/// Parse an optional feed cursor.
pub(crate) fn parse_cursor(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<TimestampCursor>, Error> {
    value
        .map(|raw| {
            TimestampCursor::from_str(raw).map_err(|err| {
                rejected(field, ErrorCode::InvalidCursor, err.to_string(), raw)
            })
        })
        .transpose()
}
