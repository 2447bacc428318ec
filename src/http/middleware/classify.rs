//! Classification middleware.
//!
//! # Responsibilities
//! - Skip classification for bypassed paths (assets, `/api`)
//! - Run the routing state machine for everything else
//! - Materialize the routing decision as an HTTP response
//! - Attach every cookie change to the outgoing response
//!
//! # Design Decisions
//! - Rewrites are served by the inner handler under the requested URL; only
//!   the request URI changes
//! - A forced status never masks a renderer failure

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{COOKIE, LOCATION},
        HeaderMap, HeaderValue, Request, StatusCode, Uri,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::EdgeError;
use crate::http::host::absolute_location;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::routing::{route_request, RoutingAction, RoutingSettings};
use crate::session::RequestContext;

pub async fn classification_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let runtime = state.runtime();
    if runtime.bypass.matches(request.uri().path()) {
        return next.run(request).await;
    }

    let request_id = request_id(request.headers()).to_string();
    let mut ctx = RequestContext::new(request.uri(), request.headers());

    let outcome = match route_request(state.backend.as_ref(), &runtime.settings, &mut ctx).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                path = %ctx.path(),
                error = %e,
                "Classification failed"
            );
            return EdgeError::from(e).into_response();
        }
    };

    let mut response = match outcome.action {
        RoutingAction::Redirect { location, status } => {
            redirect(&location, status, request.headers()).unwrap_or_else(IntoResponse::into_response)
        }
        RoutingAction::Respond { status } => status.into_response(),
        RoutingAction::Rewrite {
            target,
            status,
            original_url,
        } => match rewrite(request, &target, &original_url, &runtime.settings, &ctx) {
            Ok(rewritten) => {
                tracing::debug!(request_id = %request_id, target = %target, "Rewriting request");
                let mut response = next.run(rewritten).await;
                if let Some(status) = status {
                    if !response.status().is_server_error() {
                        *response.status_mut() = status;
                    }
                }
                response
            }
            Err(e) => e.into_response(),
        },
    };

    outcome.response_cookies.append_to(response.headers_mut());
    response
}

fn redirect(location: &str, status: StatusCode, headers: &HeaderMap) -> Result<Response, EdgeError> {
    let location = absolute_location(location, headers);
    let value = HeaderValue::from_str(&location)
        .map_err(|_| EdgeError::InvalidRewrite(location.clone()))?;
    let mut response = status.into_response();
    response.headers_mut().insert(LOCATION, value);
    Ok(response)
}

/// Retarget the request at the template route, carrying the original URL and
/// the refreshed cookies.
fn rewrite(
    request: Request<Body>,
    target: &str,
    original_url: &str,
    settings: &RoutingSettings,
    ctx: &RequestContext,
) -> Result<Request<Body>, EdgeError> {
    let (mut parts, body) = request.into_parts();

    parts.uri = target
        .parse::<Uri>()
        .map_err(|_| EdgeError::InvalidRewrite(target.to_string()))?;
    let original = HeaderValue::from_str(original_url)
        .map_err(|_| EdgeError::InvalidRewrite(original_url.to_string()))?;
    parts
        .headers
        .insert(settings.original_url_header.clone(), original);

    match ctx.cookie_header() {
        Some(cookies) => {
            parts.headers.insert(COOKIE, cookies);
        }
        None => {
            parts.headers.remove(COOKIE);
        }
    }

    Ok(Request::from_parts(parts, body))
}
