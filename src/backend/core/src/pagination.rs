//! Offset-based pagination for listing endpoints.

use serde::{Deserialize, Serialize};

/// Default page size when the client does not specify one.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Upper bound on page size; larger requests are clamped, not rejected.
pub const MAX_PER_PAGE: u32 = 100;

/// Query parameters for paginated listings (`?page=2&per_page=50`).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    /// Normalize out-of-range values: page is 1-based, per_page clamped.
    pub fn normalize(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// SQL LIMIT for this page.
    pub fn limit(&self) -> i64 {
        i64::from(self.normalize().per_page)
    }

    /// SQL OFFSET for this page.
    pub fn offset(&self) -> i64 {
        let p = self.normalize();
        i64::from(p.page - 1) * i64::from(p.per_page)
    }
}

/// Metadata accompanying a page of results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMetadata {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PageMetadata {
    pub fn new(params: PaginationParams, total: u64) -> Self {
        let params = params.normalize();
        let total_pages = if total == 0 {
            0
        } else {
            ((total + u64::from(params.per_page) - 1) / u64::from(params.per_page)) as u32
        };
        Self {
            page: params.page,
            per_page: params.per_page,
            total,
            total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// A page of items plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PageMetadata,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, params: PaginationParams, total: u64) -> Self {
        Self {
            items,
            meta: PageMetadata::new(params, total),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_math() {
        let params = PaginationParams { page: 3, per_page: 25 };
        assert_eq!(params.limit(), 25);
        assert_eq!(params.offset(), 50);
    }

    #[test]
    fn test_page_zero_normalizes_to_one() {
        let params = PaginationParams { page: 0, per_page: 10 };
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_per_page_clamped() {
        let params = PaginationParams { page: 1, per_page: 10_000 };
        assert_eq!(params.limit(), i64::from(MAX_PER_PAGE));
    }

    #[test]
    fn test_metadata_total_pages() {
        let params = PaginationParams { page: 1, per_page: 20 };
        let meta = PageMetadata::new(params, 41);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next());

        let empty = PageMetadata::new(params, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next());
    }
}
