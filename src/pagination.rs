//! This module defines the common functionality for paging data.

use serde::Serialize;

use crate::Error;

/// A validated page request.
///
/// Results are sliced as `[(page - 1) * limit, page * limit)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// The 1-based page number.
    pub page: u64,
    /// The number of records per page.
    pub limit: u64,
}

impl PageQuery {
    /// The page used when a request does not specify one.
    pub const DEFAULT_PAGE: u64 = 1;
    /// The page size used when a request does not specify one.
    pub const DEFAULT_LIMIT: u64 = 10;
    /// The largest page size a client may request.
    pub const MAX_LIMIT: u64 = 100;

    /// Validate a page request, falling back to the defaults for absent
    /// values.
    ///
    /// # Errors
    /// Returns [Error::Validation] when `page` is 0 or `limit` is outside
    /// `[1, 100]`.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Result<Self, Error> {
        let page = page.unwrap_or(Self::DEFAULT_PAGE);
        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT);

        if page < 1 {
            return Err(Error::single_field("page", "Page must be a positive integer"));
        }

        if limit < 1 || limit > Self::MAX_LIMIT {
            return Err(Error::single_field(
                "limit",
                "Limit must be between 1 and 100",
            ));
        }

        Ok(Self { page, limit })
    }

    /// The number of records to skip before this page starts.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// The pagination metadata returned alongside a page of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The page that was returned.
    pub current_page: u64,
    /// The total number of pages, i.e. the ceiling of `total / limit`.
    pub total_pages: u64,
    /// The total number of records matching the query across all pages.
    pub total_expenses: u64,
    /// Whether a later page exists.
    pub has_next_page: bool,
    /// Whether an earlier page exists.
    pub has_prev_page: bool,
}

impl Pagination {
    /// Derive the pagination metadata for `query` over `total` matching
    /// records.
    pub fn new(query: PageQuery, total: u64) -> Self {
        let total_pages = total.div_ceil(query.limit);

        Self {
            current_page: query.page,
            total_pages,
            total_expenses: total,
            has_next_page: query.page < total_pages,
            has_prev_page: query.page > 1,
        }
    }
}


#[cfg(test)]
mod pagination_tests {
    use crate::pagination::{PageQuery, Pagination};

    #[test]
    fn last_partial_page_has_prev_but_not_next() {
        let query = PageQuery::new(Some(2), Some(10)).unwrap();

        let got = Pagination::new(query, 15);

        assert_eq!(got.current_page, 2);
        assert_eq!(got.total_pages, 2);
        assert_eq!(got.total_expenses, 15);
        assert!(!got.has_next_page);
        assert!(got.has_prev_page);
    }

    #[test]
    fn first_of_many_pages_has_next_but_not_prev() {
        let query = PageQuery::default();

        let got = Pagination::new(query, 35);

        assert_eq!(got.total_pages, 4);
        assert!(got.has_next_page);
        assert!(!got.has_prev_page);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let got = Pagination::new(PageQuery::default(), 0);

        assert_eq!(got.total_pages, 0);
        assert!(!got.has_next_page);
        assert!(!got.has_prev_page);
    }
}
