//! Pagination: zero-based page state and slicing of a filtered, sorted set.

use serde::{Deserialize, Serialize};

use crate::error::GymError;

/// Page size used when neither the caller nor config provides one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Zero-based page index and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageState {
    #[must_use]
    pub const fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// A single page large enough to hold every record.
    #[must_use]
    pub const fn everything() -> Self {
        Self {
            page: 0,
            page_size: usize::MAX,
        }
    }

    /// # Errors
    ///
    /// A zero page size is a validation error.
    pub fn validate(&self) -> Result<(), GymError> {
        if self.page_size == 0 {
            return Err(GymError::invalid("page_size", "Page size must be at least 1."));
        }
        Ok(())
    }

    /// Index of the first row on this page, saturating on overflow.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.page.saturating_mul(self.page_size)
    }

    /// Number of pages needed for `total` rows.
    #[must_use]
    pub const fn page_count(&self, total: usize) -> usize {
        if self.page_size == 0 {
            0
        } else {
            total.div_ceil(self.page_size)
        }
    }

    /// Slice `[offset, offset + page_size)` out of `rows`. Out-of-range
    /// pages yield an empty slice.
    #[must_use]
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let start = self.offset().min(rows.len());
        let end = start.saturating_add(self.page_size).min(rows.len());
        &rows[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWS: [char; 5] = ['A', 'B', 'C', 'D', 'E'];

    #[test]
    fn second_page_of_two() {
        assert_eq!(PageState::new(1, 2).slice(&ROWS), &['C', 'D']);
    }

    #[test]
    fn last_page_is_partial() {
        assert_eq!(PageState::new(2, 2).slice(&ROWS), &['E']);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        assert!(PageState::new(3, 2).slice(&ROWS).is_empty());
        assert!(PageState::new(usize::MAX, usize::MAX).slice(&ROWS).is_empty());
    }

    #[test]
    fn everything_returns_all_rows() {
        assert_eq!(PageState::everything().slice(&ROWS), &ROWS);
    }

    #[test]
    fn page_count_rounds_up() {
        let page = PageState::new(0, 2);
        assert_eq!(page.page_count(0), 0);
        assert_eq!(page.page_count(4), 2);
        assert_eq!(page.page_count(5), 3);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = PageState::new(0, 0).validate().unwrap_err();
        let errors = err.validation_errors().expect("validation error");
        assert!(errors.get("page_size").is_some());
    }
}
