//! ocache server entry point.
//!
//! Loads configuration, opens the generation store, installs and activates
//! the configured generation, then serves the interception hook as MCP tools
//! on stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use ocache_client::{FetchClient, FetchConfig};
use ocache_core::{AppConfig, CacheDb, SessionRegistry, Worker};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let scope = config.scope_url()?;

    tracing::info!(generation = %config.generation, scope = %scope, db_path = %config.db_path.display(), "starting ocache");

    let storage = Arc::new(CacheDb::open(&config.db_path).await?);
    let transport = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let sessions = Arc::new(SessionRegistry::new());
    sessions.connect(handler::STDIO_SESSION).await;

    let worker = Arc::new(Worker::from_config(&config, storage, transport, sessions.clone())?);
    worker.install().await?;
    worker.activate().await?;

    let handler = handler::OcacheServer::new(worker.clone(), sessions, scope);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    worker.wait_background().await;
    tracing::info!("ocache stopped");

    Ok(())
}
