//! Forwarding to the page renderer.
//!
//! Everything that is not answered by the edge itself (bypassed assets,
//! rewritten pages) ends up here and is streamed to the renderer.

use std::str::FromStr;

use axum::{
    body::Body,
    extract::State,
    http::{
        header,
        uri::{Authority, PathAndQuery, Scheme},
        HeaderMap, HeaderName, Request, Uri, Version,
    },
    response::Response,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::http::error::EdgeError;
use crate::http::request::request_id;
use crate::http::server::AppState;

/// Client used for renderer traffic.
pub type RendererClient = Client<HttpConnector, Body>;

pub fn renderer_client() -> RendererClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Parse the configured renderer `host:port`.
pub fn renderer_authority(address: &str) -> Result<Authority, EdgeError> {
    Authority::from_str(address)
        .map_err(|e| EdgeError::Config(format!("renderer.address '{}': {}", address, e)))
}

/// Connection-scoped headers that must not be forwarded.
const HOP_BY_HOP: [HeaderName; 6] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove("keep-alive");
    headers.remove(header::TRANSFER_ENCODING);
}

/// Point `uri` at the renderer, keeping its path and query.
fn renderer_uri(uri: &Uri, authority: &Authority) -> Result<Uri, EdgeError> {
    let mut parts = uri.clone().into_parts();
    parts.scheme = Some(Scheme::HTTP);
    parts.authority = Some(authority.clone());
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    Uri::from_parts(parts).map_err(|e| EdgeError::InvalidRewrite(e.to_string()))
}

/// Fallback handler: stream the request to the renderer and its answer back.
pub async fn forward_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, EdgeError> {
    let runtime = state.runtime();
    let (mut parts, body) = request.into_parts();

    parts.uri = renderer_uri(&parts.uri, &runtime.renderer_authority)?;
    parts.version = Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);

    tracing::debug!(
        request_id = %request_id(&parts.headers),
        method = %parts.method,
        uri = %parts.uri,
        "Forwarding to renderer"
    );

    let response = state
        .renderer
        .request(Request::from_parts(parts, body))
        .await?;

    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Ok(Response::from_parts(parts, Body::new(body)))
}
