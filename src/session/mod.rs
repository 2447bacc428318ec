//! Session state subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (URI, headers, Cookie)
//!     → context.rs (RequestContext: jar + pending response cookies)
//!     → backend Set-Cookie lines → cookies.rs (verbatim to response, parsed into jar)
//!     → outbound headers for the next backend call / the renderer
//! ```
//!
//! # Design Decisions
//! - No ambient request state: the context is passed explicitly
//! - Cookie changes are returned as data, applied by the HTTP layer
//! - The auth token family is enumerated, never discovered by prefix scan

pub mod context;
pub mod cookies;

pub use context::RequestContext;
pub use cookies::{CookieFamily, ResponseCookies};
