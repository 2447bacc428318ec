//! Request classification and rewrite subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → matcher.rs (bypass list: assets, /api)
//!     → classify.rs
//!         CLASSIFY      one backend query for path + query
//!         COOKIE_SYNC   backend Set-Cookie → response + request jar
//!         decide        redirect / rewrite / bare status
//!         CHANNEL_SYNC  channel changed → clear cart → create cart → channel cookie
//!     → RoutingOutcome (action + response cookies)
//! ```
//!
//! # Design Decisions
//! - Exhaustive match over the closed `ContentClass`; no default fallthrough
//! - Routing never touches the HTTP response; it returns data
//! - Cart reset is best-effort and never fails the page request

pub mod classify;
pub mod matcher;

use std::str::FromStr;

use axum::http::HeaderName;

use crate::config::EdgeConfig;
use crate::session::CookieFamily;

pub use classify::{route_request, RoutingAction, RoutingOutcome};
pub use matcher::{BypassMatcher, PathPrefixMatcher};

/// Name of the query parameter carrying the post-login return path.
pub const REDIRECT_URL_PARAM: &str = "redirectUrl";

const DEFAULT_ORIGINAL_URL_HEADER: &str = "x-url";

/// Settings the classifier needs, resolved once per config.
#[derive(Debug, Clone)]
pub struct RoutingSettings {
    pub original_url_header: HeaderName,
    pub error_template: String,
    pub content_id_param: String,
    pub token_family: CookieFamily,
    pub channel_cookie: String,
    pub cart_cookie: String,
    pub reset_marker_cookie: String,
    pub cookie_path: String,
    pub forwarded_headers: Vec<HeaderName>,
}

impl RoutingSettings {
    pub fn from_config(config: &EdgeConfig) -> Self {
        let original_url_header = HeaderName::from_str(&config.routing.original_url_header)
            .unwrap_or_else(|_| HeaderName::from_static(DEFAULT_ORIGINAL_URL_HEADER));
        let forwarded_headers = config
            .backend
            .forwarded_headers
            .iter()
            .filter_map(|name| HeaderName::from_str(name).ok())
            .collect();

        Self {
            original_url_header,
            error_template: config.routing.error_template.clone(),
            content_id_param: config.routing.content_id_param.clone(),
            token_family: CookieFamily::new(
                config.cookies.token_cookie.clone(),
                config.cookies.token_chunks,
            ),
            channel_cookie: config.cookies.channel_cookie.clone(),
            cart_cookie: config.cookies.cart_cookie.clone(),
            reset_marker_cookie: config.cookies.reset_marker_cookie.clone(),
            cookie_path: config.cookies.path.clone(),
            forwarded_headers,
        }
    }
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self::from_config(&EdgeConfig::default())
    }
}
