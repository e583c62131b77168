//! # Pagination
//!
//! Page math shared by every list screen. Pages are 1-based everywhere.
//!
//! ```text
//!   ListQuery ──► GET /api/v1/<resource>?page=2&limit=10&search=chain
//!                                 │
//!                                 ▼
//!   { data: [...], pagination: { page, limit, total, totalPages } }
//!                                 │
//!                                 ▼
//!   Pagination::clamp_page / page_window / page_after_delete
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::DEFAULT_PAGE_SIZE;

/// Pagination block returned alongside a page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            total: 0,
            total_pages: 1,
        }
    }
}

impl Pagination {
    /// Builds pagination for `total` rows, deriving `total_pages`.
    ///
    /// An empty list still has one (empty) page.
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = total_pages(total, limit);
        Pagination {
            page: page.clamp(1, total_pages),
            limit,
            total,
            total_pages,
        }
    }

    /// Pagination for a response that carried no pagination block: a single
    /// page holding everything.
    pub fn single_page(rows: usize) -> Self {
        Pagination {
            page: 1,
            limit: (rows as u32).max(1),
            total: rows as u64,
            total_pages: 1,
        }
    }

    /// Clamps a requested page into `[1, total_pages]`.
    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages.max(1))
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Up to `width` consecutive page numbers centred on the current page,
    /// always inside `[1, total_pages]`.
    ///
    /// ## Example
    /// ```rust
    /// use partsdesk_core::pagination::Pagination;
    ///
    /// let p = Pagination::new(5, 10, 100);
    /// assert_eq!(p.page_window(5), vec![3, 4, 5, 6, 7]);
    /// assert_eq!(Pagination::new(1, 10, 100).page_window(5), vec![1, 2, 3, 4, 5]);
    /// ```
    pub fn page_window(&self, width: u32) -> Vec<u32> {
        let last = self.total_pages.max(1);
        let width = width.clamp(1, last);
        let current = self.clamp_page(self.page);

        let mut start = current.saturating_sub(width / 2).max(1);
        if start + width - 1 > last {
            start = last - width + 1;
        }
        (start..start + width).collect()
    }

    /// The page to show after deleting `deleted` rows from the current page
    /// which had `rows_on_page` rows.
    ///
    /// Emptying a page other than the first moves back one page.
    pub fn page_after_delete(&self, rows_on_page: usize, deleted: usize) -> u32 {
        if self.page > 1 && deleted >= rows_on_page {
            self.page - 1
        } else {
            self.page
        }
    }
}

fn total_pages(total: u64, limit: u32) -> u32 {
    let pages = total.div_ceil(limit as u64).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

// =============================================================================
// List Query
// =============================================================================

/// Query parameters of a list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    /// Screen-specific filters (`brandId`, `status`, ...), sent as-is.
    pub filters: Vec<(String, String)>,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            filters: Vec::new(),
        }
    }
}

impl ListQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        ListQuery {
            page: page.max(1),
            limit: limit.max(1),
            ..ListQuery::default()
        }
    }

    /// Sets the search term. Blank terms are dropped so the request is
    /// unfiltered.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        let trimmed = search.trim();
        self.search = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Sets (or replaces) a filter parameter.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.filters.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.filters.push((key, value)),
        }
        self
    }

    /// Query-string pairs in a stable order: page, limit, search, filters.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        pairs.extend(self.filters.iter().cloned());
        pairs
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
