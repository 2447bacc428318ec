//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the storefront edge.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Commerce/CMS GraphQL backend.
    pub backend: BackendConfig,

    /// Page renderer upstream receiving rewrites and pass-through traffic.
    pub renderer: RendererConfig,

    /// Classification and rewrite settings.
    pub routing: RoutingConfig,

    /// Session cookie names.
    pub cookies: CookieConfig,

    /// Search API settings.
    pub search: SearchConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum in-flight requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// GraphQL backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// GraphQL endpoint URL.
    pub graphql_url: String,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,

    /// Inbound headers copied onto backend calls (the `Cookie` header is
    /// always rebuilt from the refreshed request cookies).
    pub forwarded_headers: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            graphql_url: "http://localhost:5000/graphql".to_string(),
            timeout_secs: 10,
            forwarded_headers: vec![
                "authorization".to_string(),
                "accept-language".to_string(),
                "user-agent".to_string(),
                "x-forwarded-for".to_string(),
                "x-forwarded-host".to_string(),
                "x-forwarded-proto".to_string(),
            ],
        }
    }
}

/// Page renderer upstream.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RendererConfig {
    /// Renderer address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Classification middleware settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RoutingConfig {
    /// Path prefixes that skip classification entirely.
    pub bypass_prefixes: Vec<String>,

    /// Header carrying the URL the rewritten page should render.
    pub original_url_header: String,

    /// Template route used for forbidden/not-found pages.
    pub error_template: String,

    /// Query parameter carrying the resolved content id.
    pub content_id_param: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            bypass_prefixes: vec![
                "/api".to_string(),
                "/_next/static".to_string(),
                "/_next/image".to_string(),
                "/favicon.ico".to_string(),
                "/images".to_string(),
            ],
            original_url_header: "x-url".to_string(),
            error_template: "ErrorPage".to_string(),
            content_id_param: "contentId".to_string(),
        }
    }
}

/// Session cookie names.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CookieConfig {
    /// Base name of the auth token cookie.
    pub token_cookie: String,

    /// Number of numbered chunks (`<base>.0 ..`) the auth layer may split the token into.
    pub token_chunks: u8,

    /// Active channel id cookie.
    pub channel_cookie: String,

    /// Cart context cookie.
    pub cart_cookie: String,

    /// Marker set when a cart reset failed part-way; the next request with a
    /// changed channel retries the reset while it is present.
    pub reset_marker_cookie: String,

    /// Path attribute for cookies written by the edge.
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            token_cookie: "auth_token".to_string(),
            token_chunks: 4,
            channel_cookie: "channel_id".to_string(),
            cart_cookie: "cart".to_string(),
            reset_marker_cookie: "cart_reset".to_string(),
            path: "/".to_string(),
        }
    }
}

/// Search API settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Default page size.
    pub page_size: u32,

    /// Upper bound for a client-requested page size.
    pub max_page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: 24,
            max_page_size: 100,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
