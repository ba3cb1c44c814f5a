//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Number of items per page.
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    10
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Calculates the offset for database queries.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Builds the metadata for a result set of `total` rows.
    #[must_use]
    pub const fn meta(&self, total: u64) -> PageMeta {
        PageMeta::new(self.page, self.limit, total)
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Current page number.
    pub current_page: u64,
    /// Total number of pages; zero for an empty result.
    pub total_pages: u64,
    /// Total number of items across all pages.
    pub total_count: u64,
    /// Whether a later page exists.
    pub has_next_page: bool,
    /// Whether an earlier page exists.
    pub has_prev_page: bool,
}

impl PageMeta {
    /// Computes pagination metadata.
    #[must_use]
    pub const fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };

        Self {
            current_page: page,
            total_pages,
            total_count: total,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
