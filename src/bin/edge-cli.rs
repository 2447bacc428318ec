use std::path::PathBuf;

use axum::http::Uri;
use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde_json::json;

use storefront_edge::backend::{CommerceBackend, GraphQlBackend};
use storefront_edge::config::{load_config, EdgeConfig};
use storefront_edge::routing::{route_request, RoutingSettings};
use storefront_edge::search::{SearchParams, SearchRequest};
use storefront_edge::session::RequestContext;

#[derive(Parser)]
#[command(name = "edge-cli")]
#[command(about = "Inspect storefront classification and search params", long_about = None)]
struct Cli {
    /// Edge configuration file (backend URL, cookie names).
    #[arg(short, long, env = "STOREFRONT_EDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the GraphQL endpoint.
    #[arg(long)]
    graphql_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a URL and print the routing decision. Performs the same
    /// backend calls as the edge, including a cart reset on channel change.
    Classify {
        /// Path and query, e.g. "/shoes?color=red".
        url: String,
        /// Request cookies as name=value.
        #[arg(long = "cookie")]
        cookies: Vec<String>,
    },
    /// Toggle filters on a query string and print the canonical result.
    Toggle {
        query: String,
        /// Filters as key=value.
        filters: Vec<String>,
        /// Replace instead of adding to existing values.
        #[arg(long)]
        single: bool,
    },
    /// Run a product search for a query string and print the page.
    Search { query: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Toggle {
            query,
            filters,
            single,
        } => {
            let pairs = filters
                .iter()
                .map(|f| parse_pair(f))
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", SearchParams::parse(&query).toggle(pairs, single));
        }
        Commands::Classify { url, cookies } => {
            let config = load(cli.config, cli.graphql_url)?;
            let backend = GraphQlBackend::new(&config.backend)?;
            let settings = RoutingSettings::from_config(&config);

            let mut headers = HeaderMap::new();
            if !cookies.is_empty() {
                headers.insert(COOKIE, HeaderValue::from_str(&cookies.join("; "))?);
            }
            let mut ctx = RequestContext::new(&url.parse::<Uri>()?, &headers);
            let outcome = route_request(&backend, &settings, &mut ctx).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Search { query } => {
            let config = load(cli.config, cli.graphql_url)?;
            let backend = GraphQlBackend::new(&config.backend)?;
            let params = SearchParams::parse(&query);
            let request = SearchRequest::from_params(
                &params,
                config.search.page_size,
                config.search.max_page_size,
                &[config.routing.content_id_param.as_str()],
            );
            let reply = backend.search_products(&request, &HeaderMap::new()).await?;
            let body = json!({
                "request": request,
                "filter": request.filter_expression(),
                "total_count": reply.data.total_count,
                "items": reply.data.items,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}

fn load(
    path: Option<PathBuf>,
    graphql_url: Option<String>,
) -> Result<EdgeConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => load_config(&path)?,
        None => EdgeConfig::default(),
    };
    if let Some(url) = graphql_url {
        config.backend.graphql_url = url;
    }
    Ok(config)
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}
