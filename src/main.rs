use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing_subscriber::EnvFilter;

use stay_booking::adapters::cache::memory_cache::MemoryCache;
use stay_booking::adapters::http::client::RestBookingClient;
use stay_booking::adapters::session::file_store::FileTokenStore;
use stay_booking::adapters::session::memory_store::MemoryTokenStore;
use stay_booking::config::load_config;
use stay_booking::config::types::SessionConfig;
use stay_booking::domain::session::Session;
use stay_booking::mcp::server::BookingMcpServer;
use stay_booking::ports::booking_api::BookingApi;
use stay_booking::ports::cache::ResponseCache;
use stay_booking::ports::session::TokenStore;

const TOKEN_ENV: &str = "STAY_BOOKING_TOKEN";

fn find_config_path() -> PathBuf {
    let candidates = [PathBuf::from("config.yaml"), binary_dir().join("config.yaml")];

    for path in &candidates {
        if path.exists() {
            return path.clone();
        }
    }

    candidates[0].clone()
}

fn binary_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn token_store(config: &SessionConfig) -> Result<Arc<dyn TokenStore>> {
    Ok(match &config.token_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using file token store");
            Arc::new(FileTokenStore::open(path).context("failed to open token file")?)
        }
        None => Arc::new(MemoryTokenStore::default()),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries MCP JSON-RPC, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting stay-booking server");

    let config_path = find_config_path();
    let config = load_config(&config_path)?;

    let tokens = token_store(&config.session)?;
    let session = Session::new(Arc::clone(&tokens));
    if let Ok(token) = std::env::var(TOKEN_ENV)
        && !token.trim().is_empty()
    {
        session.set_access_token(token.trim());
        tracing::info!("Access token taken from {TOKEN_ENV}");
    }
    if !session.is_authenticated() {
        tracing::warn!("No access token; reservation and profile tools will fail until one is set");
    }

    let cache: Arc<dyn ResponseCache> = Arc::new(MemoryCache::new(config.cache.max_entries));
    let api: Arc<dyn BookingApi> = Arc::new(
        RestBookingClient::new(&config.api, &config.cache, cache, tokens)
            .context("failed to build backend client")?,
    );
    tracing::info!(base_url = %config.api.base_url, "Backend client ready");

    let server = BookingMcpServer::new(api, session, config.pricing);

    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}
