//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router (search API + renderer fallback)
//! - Wire up middleware (classification, in-flight limit, timeout, request ID, tracing)
//! - Swap routing settings when the config file changes
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    http::uri::Authority,
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::backend::CommerceBackend;
use crate::config::EdgeConfig;
use crate::http::error::EdgeError;
use crate::http::forward::{forward_handler, renderer_authority, renderer_client, RendererClient};
use crate::http::middleware::{classification_middleware, in_flight_limit, InFlightLimit};
use crate::http::search::search_handler;
use crate::routing::{BypassMatcher, RoutingSettings};

pub const SEARCH_PATH: &str = "/api/search";

/// Everything derived from one configuration snapshot.
#[derive(Debug)]
pub struct EdgeRuntime {
    pub config: EdgeConfig,
    pub settings: RoutingSettings,
    pub bypass: BypassMatcher,
    pub renderer_authority: Authority,
}

impl EdgeRuntime {
    pub fn new(config: EdgeConfig) -> Result<Self, EdgeError> {
        Ok(Self {
            settings: RoutingSettings::from_config(&config),
            bypass: BypassMatcher::from_config(&config.routing),
            renderer_authority: renderer_authority(&config.renderer.address)?,
            config,
        })
    }
}

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<EdgeRuntime>>,
    pub backend: Arc<dyn CommerceBackend>,
    pub renderer: RendererClient,
}

impl AppState {
    /// Current runtime snapshot.
    pub fn runtime(&self) -> Arc<EdgeRuntime> {
        self.inner.load_full()
    }
}

/// HTTP server for the storefront edge.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: EdgeConfig, backend: Arc<dyn CommerceBackend>) -> Result<Self, EdgeError> {
        let limit = InFlightLimit::new(config.listener.max_connections);
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(EdgeRuntime::new(config)?)),
            backend,
            renderer: renderer_client(),
        };

        let router = Self::build_router(state.clone(), limit, request_timeout);
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, limit: InFlightLimit, request_timeout: Duration) -> Router {
        Router::new()
            .route(SEARCH_PATH, get(search_handler))
            .fallback(forward_handler)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                classification_middleware,
            ))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(middleware::from_fn_with_state(limit, in_flight_limit))
                    .layer(TimeoutLayer::new(request_timeout)),
            )
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Config updates replace the routing snapshot in place. Listener,
    /// timeout and backend settings only change on restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<EdgeConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let inner = self.state.inner.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                apply_config_update(&inner, config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn apply_config_update(inner: &ArcSwap<EdgeRuntime>, config: EdgeConfig) {
    let current = inner.load();
    if current.config.backend != config.backend {
        tracing::warn!(
            graphql_url = %config.backend.graphql_url,
            "Backend settings changed; restart to apply"
        );
    }
    if current.config.listener != config.listener || current.config.timeouts != config.timeouts {
        tracing::warn!("Listener or timeout settings changed; restart to apply");
    }
    match EdgeRuntime::new(config) {
        Ok(runtime) => {
            inner.store(Arc::new(runtime));
            tracing::info!("Routing configuration reloaded");
        }
        Err(e) => tracing::error!(error = %e, "Rejected config update"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_update_swaps_runtime() {
        let inner = ArcSwap::from_pointee(EdgeRuntime::new(EdgeConfig::default()).unwrap());

        let mut config = EdgeConfig::default();
        config.routing.bypass_prefixes = vec!["/static".into()];
        config.renderer.address = "renderer:4000".into();
        apply_config_update(&inner, config);

        let runtime = inner.load();
        assert!(runtime.bypass.matches("/static/app.js"));
        assert!(!runtime.bypass.matches("/api/search"));
        assert_eq!(runtime.renderer_authority.as_str(), "renderer:4000");
    }

    #[test]
    fn test_bad_config_update_is_rejected() {
        let inner = ArcSwap::from_pointee(EdgeRuntime::new(EdgeConfig::default()).unwrap());

        let mut config = EdgeConfig::default();
        config.renderer.address = "not a host".into();
        apply_config_update(&inner, config);

        assert_eq!(inner.load().renderer_authority.as_str(), "127.0.0.1:3000");
    }
}
