//! Externally visible origin of a request.
//!
//! Behind a load balancer the `Host` header names the edge itself, so the
//! `X-Forwarded-*` headers take precedence.

use axum::http::{header::HOST, HeaderMap};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// `scheme://host` as seen by the client, or `None` without any host header.
pub fn external_origin(headers: &HeaderMap) -> Option<String> {
    let host = first_value(headers, X_FORWARDED_HOST)
        .or_else(|| headers.get(HOST).and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|h| !h.is_empty())?;
    let scheme = first_value(headers, X_FORWARDED_PROTO)
        .map(|p| p.to_ascii_lowercase())
        .filter(|p| p == "http" || p == "https")
        .unwrap_or_else(|| "http".to_string());
    Some(format!("{}://{}", scheme, host))
}

/// Turn a path-relative location into an absolute URL when the origin is known.
pub fn absolute_location(location: &str, headers: &HeaderMap) -> String {
    if location.starts_with('/') && !location.starts_with("//") {
        if let Some(origin) = external_origin(headers) {
            return format!("{}{}", origin, location);
        }
    }
    location.to_string()
}

/// First entry of a possibly comma-separated header.
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
