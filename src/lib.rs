//! Resource API Server Library
//!
//! This crate provides a generic control-plane API server. Resource kinds are
//! registered with a display name, a URL path segment and a pair of factories;
//! the server then exposes uniform CRUD endpoints over all of them without any
//! per-kind handler code. A read-only mode restricts the server to retrieval.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the server lifecycle and the HTTP transport
//! - **domains**: business logic organized by bounded contexts
//!   - **resources**: resource model, kind definitions, registry, dispatch policy and storage
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use resource_api_server::core::{ApiServer, Config, HttpTransport};
//! use resource_api_server::domains::resources::{MemoryStore, ResourceRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let registry = ResourceRegistry::with_defaults()?;
//!     let transport = HttpTransport::new(config.http.clone());
//!
//!     let mut server = ApiServer::new(config, registry, Arc::new(MemoryStore::new()));
//!     server.start()?;
//!     transport.run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use crate::core::{ApiServer, Config, Error, Result};
