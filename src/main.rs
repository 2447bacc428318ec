//! Storefront edge server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http server ──▶ classification middleware ──▶ renderer
//!                    │                 │        ▲
//!                    │                 ▼        │ Set-Cookie
//!                    │            routing ◀── backend (GraphQL)
//!                    │                 │
//!                    │                 └─ redirect / bare status
//!                    └──▶ /api/search ──▶ backend (GraphQL)
//!
//!     Cross-cutting: config (+ hot reload), observability, lifecycle
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "storefront-edge", version, about = "Storefront request classification edge")]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "STOREFRONT_EDGE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match storefront_edge::lifecycle::run(args.config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("storefront-edge: {}", e);
            ExitCode::FAILURE
        }
    }
}
