//! Offset pagination helpers for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Maximum page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 200;

/// Page parameters parsed from query strings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// The 1-based page number, clamped to at least 1.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// The page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// The row offset for the current page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: None,
            limit: None,
        }
    }
}

/// Pagination metadata returned alongside list data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl PageMeta {
    /// Builds page metadata from the total row count and the request params.
    pub fn new(total: i64, params: &PageParams) -> Self {
        let limit = params.limit();
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            total,
            page: params.page(),
            limit,
            total_pages,
        }
    }
}
