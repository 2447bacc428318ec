//! Commerce/CMS backend subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext (path + query, forwarded headers, refreshed cookies)
//!     → client.rs (GraphQL POST with timeout)
//!     → types.rs (envelope → closed Classification / SearchPage)
//!     → BackendReply { data, set_cookies }
//! ```
//!
//! # Design Decisions
//! - One trait seam (`CommerceBackend`) so routing can be exercised without a network
//! - `__typename` is decoded exactly once into `ContentClass`
//! - Every reply carries its `Set-Cookie` lines; callers decide where they go
//! - No retries: a failed call surfaces to the caller

pub mod client;
pub mod queries;
pub mod types;

use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::search::SearchRequest;

pub use client::GraphQlBackend;
pub use types::{
    BackendError, BackendReply, BackendResult, Classification, ContentClass, SearchPage,
};

/// Operations the edge needs from the commerce backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommerceBackend: Send + Sync {
    /// Classify `url` (path + query) for the session described by `headers`.
    async fn classify(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> BackendResult<BackendReply<Classification>>;

    /// Clear the session's cart.
    async fn clear_cart(&self, headers: &HeaderMap) -> BackendResult<BackendReply<()>>;

    /// Create a fresh cart for the session.
    async fn create_cart(&self, headers: &HeaderMap) -> BackendResult<BackendReply<()>>;

    async fn search_products(
        &self,
        request: &SearchRequest,
        headers: &HeaderMap,
    ) -> BackendResult<BackendReply<SearchPage>>;
}
