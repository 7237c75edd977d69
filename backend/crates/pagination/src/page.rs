//! Page envelope built from an over-fetched row set.

use serde::Serialize;

use crate::{PageLimit, TimestampCursor};

/// One page of results plus a flag telling whether more exist.
///
/// ## Invariants
/// - `items.len() <= limit` for the limit the page was built with.
/// - The probe row used to detect `has_more` is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    has_more: bool,
}

impl<T> Page<T> {
    /// Build a page from rows fetched with [`PageLimit::probe_len`].
    ///
    /// `has_more` is true exactly when the adapter returned the extra probe
    /// row, which is then discarded.
    #[must_use]
    pub fn from_probe(mut rows: Vec<T>, limit: PageLimit) -> Self {
        let has_more = rows.len() >= limit.probe_len();
        rows.truncate(limit.get());
        Self {
            items: rows,
            has_more,
        }
    }

    /// Items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Whether another page follows.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Cursor for the following page, derived from the last item.
    ///
    /// Returns `None` on the final page.
    #[must_use]
    pub fn next_cursor<F>(&self, key: F) -> Option<TimestampCursor>
    where
        F: Fn(&T) -> TimestampCursor,
    {
        if !self.has_more {
            return None;
        }
        self.items.last().map(key)
    }

    /// Split into items and the `has_more` flag.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, bool) {
        (self.items, self.has_more)
    }
}
