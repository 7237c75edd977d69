//! Page size clamping.

/// Page size after clamping into `1..=max`.
///
/// ## Invariants
/// - `value` is at least one and never exceeds the configured maximum.
///
/// # Examples
///
/// ```
/// use pagination::PageLimit;
///
/// assert_eq!(PageLimit::clamped(500, 50).get(), 50);
/// assert_eq!(PageLimit::clamped(-3, 50).get(), 1);
/// assert_eq!(PageLimit::clamped(10, 50).probe_len(), 11);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageLimit {
    value: usize,
}

impl PageLimit {
    /// Clamp a caller-supplied limit into `1..=max`.
    ///
    /// A `max` of zero is treated as one so a page always has room for an
    /// item.
    #[must_use]
    pub fn clamped(requested: i64, max: usize) -> Self {
        let ceiling = max.max(1);
        let value = usize::try_from(requested)
            .unwrap_or(0)
            .clamp(1, ceiling);
        Self { value }
    }

    /// Number of items a page may carry.
    #[must_use]
    pub const fn get(self) -> usize {
        self.value
    }

    /// Number of rows to fetch: one more than the page size so the extra row
    /// reveals whether another page exists.
    #[must_use]
    pub const fn probe_len(self) -> usize {
        self.value.saturating_add(1)
    }
}
