//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the API server,
//! including error handling, configuration, server lifecycle management,
//! and the HTTP transport.

pub mod config;
pub mod error;
pub mod server;
pub mod transport;

pub use config::{ApiServerConfig, Config, ConfigError, default_config};
pub use error::{Error, Result};
pub use server::{ApiError, ApiResponse, ApiServer, ServerState};
pub use transport::{HttpTransport, TransportError};
