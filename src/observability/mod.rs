//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (request_id, path, channel_id)
//!     → logging.rs (pretty or JSON to stdout)
//! ```

pub mod logging;

pub use logging::init as init_logging;
