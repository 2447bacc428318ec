//! Request identification.
//!
//! # Responsibilities
//! - Assign a UUID `x-request-id` as early as possible
//! - Propagate it to the response and the renderer
//! - Expose it for structured log fields

use axum::http::{HeaderMap, HeaderName};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The request id assigned by the request-id layer, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
