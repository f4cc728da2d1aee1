//! API Server Entry Point
//!
//! Initializes logging, loads configuration, registers the built-in resource
//! kinds and serves them over HTTP.

use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use resource_api_server::core::{ApiServer, Config, HttpTransport};
use resource_api_server::domains::resources::{MemoryStore, ResourceRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);
    if config.api_server.read_only {
        info!("API server configured in read-only mode");
    }

    // A registry that fails to build is unsafe to serve from
    let registry = ResourceRegistry::with_defaults()?;
    let transport = HttpTransport::new(config.http.clone());

    let mut server = ApiServer::new(config, registry, Arc::new(MemoryStore::new()));
    server.start()?;

    info!("Server initialized");

    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
