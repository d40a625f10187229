//! Pagination and sorting contract shared by every listing.

use serde::{Deserialize, Serialize};

/// Sort direction requested by a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest / smallest first.
    Asc,
    /// Newest / largest first.
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse a client value. Anything other than `asc` (any case) means descending.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }
}

/// Raw listing parameters as they arrive on the query string.
///
/// Numbers are signed so that out-of-range values reach clamping instead of
/// failing to parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Normalized listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u64,
    /// Items per page, always within `1..=max`.
    pub page_size: u64,
    /// Requested sort field, resolved against a per-resource allow-list later.
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

impl PageRequest {
    /// Normalize a raw query. Page numbers below 1 become 1 and page sizes are
    /// clamped to `1..=max_page_size`. Page numbers are also capped so the
    /// row offset always fits a signed 64-bit SQL `OFFSET`.
    #[must_use]
    pub fn resolve(query: &PageQuery, default_page_size: u64, max_page_size: u64) -> Self {
        let max_page_size = max_page_size.max(1);
        let page_size = query
            .page_size
            .map_or(default_page_size, non_negative)
            .max(1)
            .min(max_page_size);
        let last_page = (i64::MAX.unsigned_abs() / page_size).max(1);

        Self {
            page: query.page.map_or(1, non_negative).max(1).min(last_page),
            page_size,
            sort_by: query.sort_by.clone(),
            sort_order: SortOrder::parse(query.sort_order.as_deref()),
        }
    }

    /// Zero-based page index, as expected by sea-orm paginators.
    #[must_use]
    pub const fn page_index(&self) -> u64 {
        self.page - 1
    }

    /// Number of rows skipped before this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page_index().saturating_mul(self.page_size)
    }
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// A page of results together with its position in the full result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T> Page<T> {
    /// Build a page from its items and the total number of matching rows.
    #[must_use]
    pub fn new(items: Vec<T>, request: &PageRequest, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(request.page_size);
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_count,
            total_pages,
            has_next_page: request.page < total_pages,
            has_previous_page: request.page > 1,
        }
    }

    /// A page with no matches.
    #[must_use]
    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Convert the items while keeping the page metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        let (items, meta) = self.into_parts();
        Page::with_items(items.into_iter().map(f).collect(), &meta)
    }

    /// Split off the items, keeping the metadata as an empty page.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, Page<()>) {
        let Self {
            items,
            page,
            page_size,
            total_count,
            total_pages,
            has_next_page,
            has_previous_page,
        } = self;
        let meta = Page {
            items: Vec::new(),
            page,
            page_size,
            total_count,
            total_pages,
            has_next_page,
            has_previous_page,
        };
        (items, meta)
    }

    /// A page holding `items` with the metadata of `other`.
    pub fn with_items<U>(items: Vec<T>, other: &Page<U>) -> Self {
        Self {
            items,
            page: other.page,
            page_size: other.page_size,
            total_count: other.total_count,
            total_pages: other.total_pages,
            has_next_page: other.has_next_page,
            has_previous_page: other.has_previous_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(page: i64, page_size: i64) -> PageRequest {
        PageRequest::resolve(
            &PageQuery {
                page: Some(page),
                page_size: Some(page_size),
                ..Default::default()
            },
            20,
            100,
        )
    }

    #[test]
    fn test_defaults() {
        let req = PageRequest::resolve(&PageQuery::default(), 12, 100);
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, 12);
        assert_eq!(req.sort_order, SortOrder::Desc);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_bounds_are_clamped() {
        assert_eq!(request(0, 20).page, 1);
        assert_eq!(request(1, 0).page_size, 1);
        assert_eq!(request(1, 5000).page_size, 100);
        assert_eq!(request(3, 10).offset(), 20);
    }

    #[test]
    fn test_negative_values_clamp_to_one() {
        assert_eq!(request(-1, 20).page, 1);
        assert_eq!(request(i64::MIN, 20).page, 1);
        assert_eq!(request(1, -5).page_size, 1);
    }

    #[test]
    fn test_huge_page_keeps_offset_in_range() {
        let req = request(i64::MAX, 100);
        assert_eq!(req.page, i64::MAX.unsigned_abs() / 100);
        assert!(req.offset() <= i64::MAX.unsigned_abs());

        let page = Page::<u8>::new(Vec::new(), &req, 15);
        assert!(!page.has_next_page);
        assert!(page.has_previous_page);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("ASC")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(None), SortOrder::Desc);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        for (total, size, expected) in [
            (0, 10, 0),
            (1, 10, 1),
            (10, 10, 1),
            (11, 10, 2),
            (95, 20, 5),
        ] {
            let page = Page::<u8>::new(Vec::new(), &request(1, size), total);
            assert_eq!(page.total_pages, expected, "total={total} size={size}");
        }
    }

    #[test]
    fn test_navigation_flags() {
        let total = 45;
        let last = Page::<u8>::new(Vec::new(), &request(5, 10), total);
        assert!(!last.has_next_page);
        assert!(last.has_previous_page);

        let middle = Page::<u8>::new(Vec::new(), &request(2, 10), total);
        assert!(middle.has_next_page);
        assert!(middle.has_previous_page);

        let first = Page::<u8>::new(Vec::new(), &request(1, 10), total);
        assert!(first.has_next_page);
        assert!(!first.has_previous_page);
    }

    #[test]
    fn test_page_past_the_end() {
        let page = Page::<u8>::new(Vec::new(), &request(9, 10), 15);
        assert!(!page.has_next_page);
        assert!(page.has_previous_page);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let page = Page::new(vec![1, 2], &request(1, 2), 3).map(|n| n * 10);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["items"], serde_json::json!([10, 20]));
        assert_eq!(json["totalCount"], 3);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["hasNextPage"], true);
        assert_eq!(json["hasPreviousPage"], false);
    }
}
