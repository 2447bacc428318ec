//! Classification state machine for one request.
//!
//! # Responsibilities
//! - Ask the backend what the requested URL is
//! - Turn the answer into a redirect, a template rewrite, or a bare status
//! - Keep auth, cart and channel cookies in step with the backend
//!
//! # Design Decisions
//! - Classification failure propagates; there is no fallback page here
//! - Redirect/rewrite targets are path + query; the HTTP layer adds the origin
//! - A failed cart reset leaves the channel cookie stale so the next request retries it

use axum::http::StatusCode;
use serde::{Serialize, Serializer};

use crate::backend::{BackendError, BackendResult, Classification, CommerceBackend, ContentClass};
use crate::routing::{RoutingSettings, REDIRECT_URL_PARAM};
use crate::session::{RequestContext, ResponseCookies};

/// What to do with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RoutingAction {
    /// Client-visible navigation to `location`.
    Redirect {
        location: String,
        #[serde(serialize_with = "serialize_status")]
        status: StatusCode,
    },
    /// Serve `target` from the renderer under the requested URL.
    Rewrite {
        target: String,
        /// Status forced onto the renderer's response, if any.
        #[serde(serialize_with = "serialize_optional_status")]
        status: Option<StatusCode>,
        /// Value for the original-URL header.
        original_url: String,
    },
    /// Answer with a bare status.
    Respond {
        #[serde(serialize_with = "serialize_status")]
        status: StatusCode,
    },
}

/// Routing decision plus the cookies the response must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingOutcome {
    pub action: RoutingAction,
    pub response_cookies: ResponseCookies,
}

fn serialize_status<S: Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

fn serialize_optional_status<S: Serializer>(
    status: &Option<StatusCode>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match status {
        Some(status) => s.serialize_some(&status.as_u16()),
        None => s.serialize_none(),
    }
}

/// Classify the request in `ctx` and decide how to route it.
///
/// On return the jar in `ctx` holds every cookie refreshed by the backend, so
/// a rewritten request can be forwarded with it.
pub async fn route_request(
    backend: &dyn CommerceBackend,
    settings: &RoutingSettings,
    ctx: &mut RequestContext,
) -> Result<RoutingOutcome, BackendError> {
    let url = ctx.path_and_query();
    let reply = backend
        .classify(&url, &ctx.outbound_headers(&settings.forwarded_headers))
        .await?;
    ctx.apply_set_cookies(&reply.set_cookies);

    let Classification {
        content,
        channel_id,
    } = reply.data;

    let action = match content {
        ContentClass::AuthorizationError { login_url } => {
            ctx.expire_cookie_family(&settings.token_family, &settings.cookie_path);
            match login_url {
                Some(login_url) => RoutingAction::Redirect {
                    location: append_to_url(&login_url, REDIRECT_URL_PARAM, &url),
                    status: StatusCode::TEMPORARY_REDIRECT,
                },
                None => RoutingAction::Respond {
                    status: StatusCode::UNAUTHORIZED,
                },
            }
        }
        ContentClass::ForbiddenError { forbidden_url } => {
            error_page(settings, forbidden_url, StatusCode::FORBIDDEN)
        }
        ContentClass::NotFoundError { not_found_url } => {
            error_page(settings, not_found_url, StatusCode::NOT_FOUND)
        }
        ContentClass::Redirect { url, permanent } => RoutingAction::Redirect {
            location: url,
            status: if permanent {
                StatusCode::PERMANENT_REDIRECT
            } else {
                StatusCode::TEMPORARY_REDIRECT
            },
        },
        ContentClass::Content { id, template } => {
            let query = append_to_query(
                ctx.query().unwrap_or_default(),
                &settings.content_id_param,
                &id,
            );
            RoutingAction::Rewrite {
                target: format!("/{}{}{}", template, leading_slash(ctx.path()), query_suffix(&query)),
                status: None,
                original_url: url.clone(),
            }
        }
    };

    tracing::debug!(url = %url, action = ?action, "Request classified");

    if let Some(channel_id) = channel_id {
        sync_channel(backend, settings, ctx, &channel_id).await;
    }

    Ok(RoutingOutcome {
        action,
        response_cookies: ctx.response_cookies().clone(),
    })
}

/// Rewrite to the error template for a configured page, or answer with the
/// bare status when no page is configured.
fn error_page(settings: &RoutingSettings, page_url: Option<String>, status: StatusCode) -> RoutingAction {
    match page_url {
        Some(page_url) => {
            let page = page_path(&page_url);
            RoutingAction::Rewrite {
                target: format!("/{}{}", settings.error_template, page),
                status: Some(status),
                original_url: page,
            }
        }
        None => RoutingAction::Respond { status },
    }
}

/// Compare the resolved channel with the channel cookie and reset the cart on change.
///
/// A reset runs when the request carries a cart, or when an earlier reset
/// failed part-way and left the marker cookie behind. While the marker is
/// set the channel cookie stays stale, so every request retries.
async fn sync_channel(
    backend: &dyn CommerceBackend,
    settings: &RoutingSettings,
    ctx: &mut RequestContext,
    channel_id: &str,
) {
    if ctx.cookie(&settings.channel_cookie) == Some(channel_id) {
        return;
    }

    let has_cart = ctx.cookie(&settings.cart_cookie).is_some();
    let pending = ctx.cookie(&settings.reset_marker_cookie).is_some();

    if has_cart || pending {
        tracing::info!(
            channel_id = %channel_id,
            previous = ?ctx.cookie(&settings.channel_cookie),
            retry = pending,
            "Channel changed, resetting cart"
        );
        if let Err(e) = reset_cart(backend, settings, ctx, has_cart).await {
            tracing::error!(
                channel_id = %channel_id,
                error = %e,
                "Cart reset failed, keeping previous channel cookie"
            );
            if !pending {
                ctx.set_cookie(&settings.reset_marker_cookie, "1", &settings.cookie_path);
            }
            return;
        }
        if pending {
            ctx.remove_cookie(&settings.reset_marker_cookie, &settings.cookie_path);
        }
    }

    ctx.set_cookie(&settings.channel_cookie, channel_id, &settings.cookie_path);
}

/// Clear (when a cart exists) then create, strictly in order; each step sees
/// the cookies the previous one set.
async fn reset_cart(
    backend: &dyn CommerceBackend,
    settings: &RoutingSettings,
    ctx: &mut RequestContext,
    clear: bool,
) -> BackendResult<()> {
    if clear {
        let cleared = backend
            .clear_cart(&ctx.outbound_headers(&settings.forwarded_headers))
            .await?;
        ctx.apply_set_cookies(&cleared.set_cookies);
    }

    let created = backend
        .create_cart(&ctx.outbound_headers(&settings.forwarded_headers))
        .await?;
    ctx.apply_set_cookies(&created.set_cookies);
    Ok(())
}

fn encode_pair(key: &str, value: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair(key, value)
        .finish()
}

/// Append a form-encoded `key=value` to a URL that may already carry a query.
fn append_to_url(url: &str, key: &str, value: &str) -> String {
    let sep = match url.find('?') {
        None => "?",
        Some(_) if url.ends_with('?') || url.ends_with('&') => "",
        Some(_) => "&",
    };
    format!("{}{}{}", url, sep, encode_pair(key, value))
}

/// Append a form-encoded `key=value` to a bare query string (no `?`).
fn append_to_query(query: &str, key: &str, value: &str) -> String {
    if query.is_empty() {
        encode_pair(key, value)
    } else {
        format!("{}&{}", query, encode_pair(key, value))
    }
}

fn query_suffix(query: &str) -> String {
    if query.is_empty() {
        String::new()
    } else {
        format!("?{}", query)
    }
}

fn leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Path (+ query) of a configured page URL, which may be absolute.
fn page_path(page_url: &str) -> String {
    match url::Url::parse(page_url) {
        Ok(parsed) if parsed.has_host() => match parsed.query() {
            Some(q) => format!("{}?{}", parsed.path(), q),
            None => parsed.path().to_string(),
        },
        _ => leading_slash(page_url),
    }
}
