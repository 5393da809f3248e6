//! Pagination utilities for clincura-api
//!
//! All list endpoints page at a fixed 50 rows per page.

/// Page size constant for all pagination
pub const PAGE_SIZE: i64 = 50;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages]
///
/// # Arguments
/// * `total_results` - Total number of rows in result set
/// * `requested_page` - Page number requested by user (may be out of bounds)
///
/// # Returns
/// Pagination metadata with sanitized page number and calculated offset
///
/// # Examples
/// ```
/// use clincura_api::pagination::calculate_pagination;
///
/// // 173 total results = 4 pages (50 + 50 + 50 + 23)
/// let p = calculate_pagination(173, 3);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.total_pages, 4);
/// assert_eq!(p.offset, 100);
///
/// // Requesting a page past the end gets clamped
/// let p = calculate_pagination(173, 40);
/// assert_eq!(p.page, 4);  // Clamped to last page
/// assert_eq!(p.offset, 150);
/// ```
pub fn calculate_pagination(total_results: i64, requested_page: i64) -> Pagination {
    let total_pages = (total_results + PAGE_SIZE - 1) / PAGE_SIZE;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;

    Pagination {
        page,
        total_pages,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = calculate_pagination(173, 3);
        assert_eq!(p.page, 3);
        assert_eq!(p.total_pages, 4);
        assert_eq!(p.offset, 100);
    }

    #[test]
    fn test_pagination_first_page() {
        let p = calculate_pagination(85, 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_last_partial_page() {
        let p = calculate_pagination(173, 4);
        assert_eq!(p.page, 4);
        assert_eq!(p.total_pages, 4);
        assert_eq!(p.offset, 150);
    }

    #[test]
    fn test_pagination_out_of_bounds_high() {
        let p = calculate_pagination(120, 7);
        assert_eq!(p.page, 3);  // Clamped to last page
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 100);
    }

    #[test]
    fn test_pagination_out_of_bounds_low() {
        let p = calculate_pagination(60, 0);
        assert_eq!(p.page, 1);  // Clamped to first page
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_exact_page_boundary() {
        let p = calculate_pagination(150, 3);
        assert_eq!(p.page, 3);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 100);
    }

    #[test]
    fn test_pagination_single_short_page() {
        let p = calculate_pagination(12, 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 1);
        assert_eq!(p.offset, 0);
    }
}
