//! Storefront edge library.
//!
//! Classifies every storefront request against the commerce GraphQL backend
//! and redirects, rewrites onto a renderer template, or answers with a bare
//! status, keeping the auth, cart and channel cookies in step. Also serves a
//! faceted search API over canonical URL params.

pub mod backend;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod search;
pub mod session;

pub use backend::{CommerceBackend, GraphQlBackend};
pub use config::EdgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use search::SearchParams;
