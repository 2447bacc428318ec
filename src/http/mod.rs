//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers, config swaps)
//!     → request.rs (request ID)
//!     → middleware/limit.rs (in-flight cap)
//!     → middleware/classify.rs (bypass or classify → redirect / rewrite / status)
//!     → search.rs (/api/search) | forward.rs (renderer)
//!     → Send to client
//! ```

pub mod error;
pub mod forward;
pub mod host;
pub mod middleware;
pub mod request;
pub mod search;
pub mod server;

pub use error::EdgeError;
pub use request::{request_id, X_REQUEST_ID};
pub use server::{AppState, EdgeRuntime, HttpServer, SEARCH_PATH};
