//! Cursor pagination primitives shared by feed endpoints.
//!
//! The crate keeps three concerns apart:
//!
//! - [`PageLimit`] clamps caller-supplied page sizes into a safe window and
//!   knows how many rows to fetch so the adapter can probe for a next page.
//! - [`TimestampCursor`] is the opaque cursor handed to clients. On the wire
//!   it is the decimal millisecond UNIX timestamp of the last item seen.
//! - [`Page`] is the response envelope built from an over-fetched row set.
//!
//! # Examples
//!
//! ```
//! use pagination::{Page, PageLimit};
//!
//! let limit = PageLimit::clamped(2, 50);
//! let rows = vec![1, 2, 3];
//! assert_eq!(rows.len(), limit.probe_len());
//!
//! let page = Page::from_probe(rows, limit);
//! assert_eq!(page.items(), &[1, 2]);
//! assert!(page.has_more());
//! ```

mod cursor;
mod limit;
mod page;

pub use cursor::{CursorError, TimestampCursor};
pub use limit::PageLimit;
pub use page::Page;
