//! Faceted search subsystem.
//!
//! # Data Flow
//! ```text
//! URL query string / params record
//!     → params.rs (normalized multi-map, toggle, canonical string)
//!     → facets.rs (facet filters, sort order)
//!     → pagination.rs (page window, "load more" params)
//!     → SearchRequest (sent to the commerce backend)
//! ```
//!
//! # Design Decisions
//! - The canonical query string doubles as the cache key for backend search
//!   calls, so serialization is deterministic
//! - Params are immutable values; each UI action yields a new instance

pub mod facets;
pub mod pagination;
pub mod params;

use serde::Serialize;

pub use facets::{FacetFilter, FacetValue, SortDirection, SortOrder};
pub use pagination::Page;
pub use params::{ParamValue, SearchParams};

/// Free-text query key.
pub const QUERY_PARAM: &str = "q";
/// Sort key.
pub const SORT_PARAM: &str = "sort_by";

/// A backend search built from URL params.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub keyword: Option<String>,
    pub filters: Vec<FacetFilter>,
    pub sort: Option<SortOrder>,
    pub page: Page,
}

impl SearchRequest {
    /// Build a search from params. `extra_reserved` names keys that are not
    /// facets (e.g. the content id appended by the router).
    pub fn from_params(
        params: &SearchParams,
        default_page_size: u32,
        max_page_size: u32,
        extra_reserved: &[&str],
    ) -> Self {
        let mut reserved = vec![
            QUERY_PARAM,
            SORT_PARAM,
            pagination::PAGE_PARAM,
            pagination::PAGE_SIZE_PARAM,
        ];
        reserved.extend_from_slice(extra_reserved);

        Self {
            keyword: params
                .get(QUERY_PARAM)
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            filters: FacetFilter::from_params(params, &reserved),
            sort: params.get(SORT_PARAM).and_then(SortOrder::parse),
            page: Page::from_params(params, default_page_size, max_page_size),
        }
    }

    /// Backend filter expression for the selected facets.
    pub fn filter_expression(&self) -> String {
        facets::to_filter_expression(&self.filters)
    }
}
