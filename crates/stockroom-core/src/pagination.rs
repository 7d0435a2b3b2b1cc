//! Page requests and page math for list endpoints.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Builds a request, clamping `page` to at least 1 and `limit` to at
    /// least 1.
    pub fn new(page: i64, limit: i64) -> Self {
        PageRequest {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Rows to skip.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// `ceil(total_rows / limit)`, or 0 when there are no rows.
pub fn total_pages(total_rows: i64, limit: i64) -> i64 {
    if total_rows <= 0 || limit <= 0 {
        return 0;
    }
    (total_rows + limit - 1) / limit
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub total_rows: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_rows: i64) -> Self {
        Paginated {
            items,
            page: request.page,
            limit: request.limit,
            total_pages: total_pages(total_rows, request.limit),
            total_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }

    #[test]
    fn test_offset_and_clamping() {
        let req = PageRequest::new(0, 0);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 1);
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
    }
}
