//! GraphQL client for the commerce backend.
//!
//! # Responsibilities
//! - POST `{query, variables}` documents with forwarded headers
//! - Enforce the per-call timeout
//! - Collect `Set-Cookie` lines from every response
//! - Decode `{data, errors}` envelopes into typed replies

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header::SET_COOKIE, HeaderMap};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::json;

use crate::backend::queries;
use crate::backend::types::{
    BackendError, BackendReply, BackendResult, Classification, RawClassifyData, SearchPage,
};
use crate::backend::CommerceBackend;
use crate::config::BackendConfig;
use crate::search::SearchRequest;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: Option<SearchPage>,
}

/// `CommerceBackend` over GraphQL/HTTP.
#[derive(Clone)]
pub struct GraphQlBackend {
    client: reqwest::Client,
    endpoint: url::Url,
    timeout: Duration,
}

impl GraphQlBackend {
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let endpoint = url::Url::parse(&config.graphql_url).map_err(|e| {
            BackendError::Decode(format!("Invalid GraphQL URL '{}': {}", config.graphql_url, e))
        })?;
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        tracing::info!(endpoint = %endpoint, timeout_secs = config.timeout_secs, "GraphQL backend initialized");

        Ok(Self {
            client,
            endpoint,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &str,
        variables: serde_json::Value,
        headers: &HeaderMap,
    ) -> BackendResult<BackendReply<T>> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(headers.clone())
            .timeout(self.timeout)
            .json(&json!({ "operationName": operation, "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let set_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect();

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(operation, status = %status, "Backend returned non-success status");
            return Err(BackendError::Status(status.as_u16()));
        }

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        if !body.errors.is_empty() {
            let messages = body
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            if body.data.is_none() {
                return Err(BackendError::GraphQl(messages));
            }
            tracing::warn!(operation, errors = %messages, "Partial GraphQL response");
        }

        let data = body.data.ok_or(BackendError::MissingData(operation))?;
        Ok(BackendReply::with_cookies(data, set_cookies))
    }

    fn map_transport(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout.as_secs())
        } else {
            BackendError::Transport(e)
        }
    }
}

#[async_trait]
impl CommerceBackend for GraphQlBackend {
    async fn classify(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> BackendResult<BackendReply<Classification>> {
        let reply: BackendReply<RawClassifyData> = self
            .execute("ClassifyContent", queries::CLASSIFY_CONTENT, json!({ "url": url }), headers)
            .await?;
        Ok(BackendReply::with_cookies(
            reply.data.into_classification()?,
            reply.set_cookies,
        ))
    }

    async fn clear_cart(&self, headers: &HeaderMap) -> BackendResult<BackendReply<()>> {
        let reply: BackendReply<IgnoredAny> = self
            .execute("ClearCart", queries::CLEAR_CART, json!({}), headers)
            .await?;
        Ok(BackendReply::with_cookies((), reply.set_cookies))
    }

    async fn create_cart(&self, headers: &HeaderMap) -> BackendResult<BackendReply<()>> {
        let reply: BackendReply<IgnoredAny> = self
            .execute("CreateCart", queries::CREATE_CART, json!({}), headers)
            .await?;
        Ok(BackendReply::with_cookies((), reply.set_cookies))
    }

    async fn search_products(
        &self,
        request: &SearchRequest,
        headers: &HeaderMap,
    ) -> BackendResult<BackendReply<SearchPage>> {
        let filter = Some(request.filter_expression()).filter(|f| !f.is_empty());
        let variables = json!({
            "keyword": request.keyword,
            "filter": filter,
            "sort": request.sort.as_ref().map(ToString::to_string),
            "first": request.page.size,
            "skip": request.page.offset(),
        });
        let reply: BackendReply<ProductsData> = self
            .execute("SearchProducts", queries::SEARCH_PRODUCTS, variables, headers)
            .await?;
        Ok(BackendReply::with_cookies(
            reply.data.products.unwrap_or_default(),
            reply.set_cookies,
        ))
    }
}

impl std::fmt::Debug for GraphQlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQlBackend")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout_secs", &self.timeout.as_secs())
            .finish()
    }
}
