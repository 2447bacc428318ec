//! "Load more" pagination over search params.

use serde::Serialize;

use crate::search::params::SearchParams;

pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// A 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// Read `page` and `page_size` from params. Invalid or zero values fall back
    /// to page 1 / `default_size`; the size is clamped to `max_size`.
    pub fn from_params(params: &SearchParams, default_size: u32, max_size: u32) -> Self {
        let number = params
            .get(PAGE_PARAM)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(1);
        let size = params
            .get(PAGE_SIZE_PARAM)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(default_size)
            .min(max_size);
        Self { number, size }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number.saturating_sub(1)) * u64::from(self.size)
    }

    /// Whether another page exists after this one.
    pub fn has_more(&self, total_count: u64) -> bool {
        self.offset() + u64::from(self.size) < total_count
    }
}

/// Params for the following page; every other key is left untouched.
pub fn next_page_params(params: &SearchParams, page: Page) -> SearchParams {
    params.with(PAGE_PARAM, page.number.saturating_add(1).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        let page = Page::from_params(&SearchParams::parse("?q=tops"), 20, 100);
        assert_eq!(page, Page { number: 1, size: 20 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_page_invalid_and_clamped() {
        let params = SearchParams::parse("?page=0&page_size=500");
        assert_eq!(Page::from_params(&params, 20, 100), Page { number: 1, size: 100 });

        let params = SearchParams::parse("?page=abc");
        assert_eq!(Page::from_params(&params, 20, 100).number, 1);
    }

    #[test]
    fn test_offset_and_has_more() {
        let page = Page { number: 3, size: 10 };
        assert_eq!(page.offset(), 20);
        assert!(page.has_more(31));
        assert!(!page.has_more(30));
    }

    #[test]
    fn test_next_page_keeps_facets() {
        let params = SearchParams::parse("?q=tops&Size=M&page=2");
        let page = Page::from_params(&params, 20, 100);
        assert_eq!(
            next_page_params(&params, page).to_query_string(),
            "?q=tops&Size=M&page=3"
        );
    }

    #[test]
    fn test_next_page_at_last_representable_page() {
        let params = SearchParams::parse("?q=tops&page=4294967295");
        let page = Page::from_params(&params, 20, 100);
        assert_eq!(page.number, u32::MAX);
        assert_eq!(
            next_page_params(&params, page).get(PAGE_PARAM),
            Some("4294967295")
        );
    }
}
