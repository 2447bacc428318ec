//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, page sizes > 0)
//! - Validate URLs, authorities, header and cookie names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::str::FromStr;

use axum::http::{uri::Authority, HeaderName};
use thiserror::Error;

use crate::config::schema::EdgeConfig;

/// Upper bound for the auth token chunk family.
pub const MAX_TOKEN_CHUNKS: u8 = 32;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be > 0"));
    }

    match url::Url::parse(&config.backend.graphql_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "backend.graphql_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("backend.graphql_url", e.to_string())),
    }
    if config.backend.timeout_secs == 0 {
        errors.push(ValidationError::new("backend.timeout_secs", "must be > 0"));
    }
    for name in &config.backend.forwarded_headers {
        if HeaderName::from_str(name).is_err() {
            errors.push(ValidationError::new(
                "backend.forwarded_headers",
                format!("'{}' is not a valid header name", name),
            ));
        }
    }

    if Authority::from_str(&config.renderer.address).is_err() {
        errors.push(ValidationError::new(
            "renderer.address",
            format!("'{}' is not a valid host:port", config.renderer.address),
        ));
    }

    for prefix in &config.routing.bypass_prefixes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::new(
                "routing.bypass_prefixes",
                format!("'{}' must start with '/'", prefix),
            ));
        }
    }
    if HeaderName::from_str(&config.routing.original_url_header).is_err() {
        errors.push(ValidationError::new(
            "routing.original_url_header",
            "not a valid header name",
        ));
    }
    if !is_path_segment(&config.routing.error_template) {
        errors.push(ValidationError::new(
            "routing.error_template",
            "must be a single non-empty path segment",
        ));
    }
    if config.routing.content_id_param.is_empty() {
        errors.push(ValidationError::new("routing.content_id_param", "must not be empty"));
    }

    for (field, name) in [
        ("cookies.token_cookie", &config.cookies.token_cookie),
        ("cookies.channel_cookie", &config.cookies.channel_cookie),
        ("cookies.cart_cookie", &config.cookies.cart_cookie),
        ("cookies.reset_marker_cookie", &config.cookies.reset_marker_cookie),
    ] {
        if !is_cookie_name(name) {
            errors.push(ValidationError::new(
                field,
                format!("'{}' is not a valid cookie name", name),
            ));
        }
    }
    if config.cookies.reset_marker_cookie == config.cookies.cart_cookie {
        errors.push(ValidationError::new(
            "cookies.reset_marker_cookie",
            "must differ from cookies.cart_cookie",
        ));
    }
    if config.cookies.token_chunks > MAX_TOKEN_CHUNKS {
        errors.push(ValidationError::new(
            "cookies.token_chunks",
            format!("must be <= {}", MAX_TOKEN_CHUNKS),
        ));
    }
    if !config.cookies.path.starts_with('/') {
        errors.push(ValidationError::new("cookies.path", "must start with '/'"));
    }

    if config.search.page_size == 0 {
        errors.push(ValidationError::new("search.page_size", "must be > 0"));
    }
    if config.search.max_page_size < config.search.page_size {
        errors.push(ValidationError::new(
            "search.max_page_size",
            "must be >= search.page_size",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_path_segment(s: &str) -> bool {
    !s.is_empty() && !s.contains(['/', '?', '#'])
}

/// RFC 6265 cookie-name token.
fn is_cookie_name(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(
                    b,
                    b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"'
                        | b'/' | b'[' | b']' | b'?' | b'=' | b'{' | b'}'
                )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EdgeConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EdgeConfig::default();
        config.backend.graphql_url = "ftp://example.com".into();
        config.timeouts.request_secs = 0;
        config.routing.bypass_prefixes.push("images".into());
        config.cookies.channel_cookie = "bad name".into();
        config.cookies.token_chunks = 64;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            [
                "backend.graphql_url",
                "routing.bypass_prefixes",
                "cookies.channel_cookie",
                "cookies.token_chunks",
                "timeouts.request_secs",
            ]
        );
    }

    #[test]
    fn test_rejects_bad_renderer_and_header() {
        let mut config = EdgeConfig::default();
        config.renderer.address = "not a host".into();
        config.routing.original_url_header = "x url".into();
        config.routing.error_template = "Error/Page".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].to_string().starts_with("renderer.address"));
    }

    #[test]
    fn test_reset_marker_must_differ_from_cart() {
        let mut config = EdgeConfig::default();
        config.cookies.reset_marker_cookie = config.cookies.cart_cookie.clone();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "cookies.reset_marker_cookie");
    }

    #[test]
    fn test_cookie_name_rules() {
        assert!(is_cookie_name("auth_token"));
        assert!(is_cookie_name("auth-token.0"));
        assert!(!is_cookie_name(""));
        assert!(!is_cookie_name("a=b"));
        assert!(!is_cookie_name("a;b"));
    }
}
