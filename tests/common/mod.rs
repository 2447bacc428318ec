//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header::COOKIE, HeaderMap};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use storefront_edge::backend::{
    BackendError, BackendReply, BackendResult, Classification, CommerceBackend, ContentClass,
    SearchPage,
};
use storefront_edge::config::EdgeConfig;
use storefront_edge::http::HttpServer;
use storefront_edge::lifecycle::Shutdown;
use storefront_edge::search::SearchRequest;

/// Start a mock renderer that answers 200 with the raw request head as body.
pub async fn start_echo_renderer() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let body = String::from_utf8_lossy(&head).to_string();
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCall {
    pub operation: &'static str,
    pub url: Option<String>,
    pub cookie: Option<String>,
}

/// In-memory commerce backend keyed by requested path + query.
#[derive(Default)]
pub struct FakeBackend {
    pub pages: Mutex<HashMap<String, BackendReply<Classification>>>,
    pub search: Mutex<SearchPage>,
    pub cart_cookies: Mutex<Vec<String>>,
    /// When set, `create_cart` answers with a backend error.
    pub fail_create: AtomicBool,
    pub calls: Mutex<Vec<BackendCall>>,
}

impl FakeBackend {
    pub fn page(self, url: &str, content: ContentClass, channel_id: Option<&str>) -> Self {
        self.page_with_cookies(url, content, channel_id, &[])
    }

    pub fn page_with_cookies(
        self,
        url: &str,
        content: ContentClass,
        channel_id: Option<&str>,
        set_cookies: &[&str],
    ) -> Self {
        let reply = BackendReply::with_cookies(
            Classification {
                content,
                channel_id: channel_id.map(str::to_string),
            },
            set_cookies.iter().map(|c| c.to_string()).collect(),
        );
        self.pages.lock().unwrap().insert(url.to_string(), reply);
        self
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.calls().iter().map(|c| c.operation).collect()
    }

    fn record(&self, operation: &'static str, url: Option<&str>, headers: &HeaderMap) {
        self.calls.lock().unwrap().push(BackendCall {
            operation,
            url: url.map(str::to_string),
            cookie: headers
                .get(COOKIE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });
    }
}

#[async_trait]
impl CommerceBackend for FakeBackend {
    async fn classify(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> BackendResult<BackendReply<Classification>> {
        self.record("classify", Some(url), headers);
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(BackendError::Status(500))
    }

    async fn clear_cart(&self, headers: &HeaderMap) -> BackendResult<BackendReply<()>> {
        self.record("clear_cart", None, headers);
        Ok(BackendReply::with_cookies((), vec!["cart=; Max-Age=0; Path=/".to_string()]))
    }

    async fn create_cart(&self, headers: &HeaderMap) -> BackendResult<BackendReply<()>> {
        self.record("create_cart", None, headers);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(BackendError::Status(503));
        }
        Ok(BackendReply::with_cookies(
            (),
            self.cart_cookies.lock().unwrap().clone(),
        ))
    }

    async fn search_products(
        &self,
        _request: &SearchRequest,
        headers: &HeaderMap,
    ) -> BackendResult<BackendReply<SearchPage>> {
        self.record("search_products", None, headers);
        Ok(BackendReply::new(self.search.lock().unwrap().clone()))
    }
}

/// A running edge in front of an echo renderer.
pub struct TestEdge {
    pub addr: SocketAddr,
    pub backend: Arc<FakeBackend>,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<EdgeConfig>,
}

impl TestEdge {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the edge on an ephemeral port.
pub async fn start_edge(backend: FakeBackend) -> TestEdge {
    let renderer = start_echo_renderer().await;

    let mut config = EdgeConfig::default();
    config.renderer.address = renderer.to_string();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let backend = Arc::new(backend);
    let server = HttpServer::new(config, backend.clone()).unwrap();
    let shutdown = Shutdown::new();
    let (config_tx, config_rx) = mpsc::unbounded_channel();

    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_rx, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestEdge {
        addr,
        backend,
        shutdown,
        config_tx,
    }
}

/// HTTP client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// All `Set-Cookie` lines of a response.
pub fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
