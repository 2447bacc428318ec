//! `GET /api/search`: faceted product search over URL params.

use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::error::EdgeError;
use crate::http::server::AppState;
use crate::search::{pagination::next_page_params, SearchParams, SearchRequest};
use crate::session::{RequestContext, ResponseCookies};

/// JSON body returned to the storefront.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<serde_json::Value>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
    /// Canonical query string for the "load more" request, `null` on the last page.
    pub next_query: Option<String>,
}

pub async fn search_handler(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, EdgeError> {
    let runtime = state.runtime();
    let params = SearchParams::parse(uri.query().unwrap_or_default());
    let request = SearchRequest::from_params(
        &params,
        runtime.config.search.page_size,
        runtime.config.search.max_page_size,
        &[runtime.settings.content_id_param.as_str()],
    );

    tracing::debug!(
        query = %params,
        filter = %request.filter_expression(),
        page = request.page.number,
        "Searching products"
    );

    let ctx = RequestContext::new(&uri, &headers);
    let reply = state
        .backend
        .search_products(&request, &ctx.outbound_headers(&runtime.settings.forwarded_headers))
        .await?;

    let has_more = request.page.has_more(reply.data.total_count);
    let body = SearchResponse {
        items: reply.data.items,
        total_count: reply.data.total_count,
        page: request.page.number,
        page_size: request.page.size,
        has_more,
        next_query: has_more.then(|| next_page_params(&params, request.page).to_query_string()),
    };

    let mut cookies = ResponseCookies::default();
    for line in reply.set_cookies {
        cookies.push_raw(line);
    }
    let mut response = Json(body).into_response();
    cookies.append_to(response.headers_mut());
    Ok(response)
}
