//! Error types and handling for the API server.
//!
//! This module defines a unified error type that can represent errors from
//! all domains and external dependencies, providing consistent error handling
//! across the entire application.

use thiserror::Error;

/// A specialized Result type for API server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the API server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the resource registry.
    #[error("Registry error: {0}")]
    Registry(#[from] crate::domains::resources::RegistryError),

    /// Error originating from resource storage.
    #[error("Store error: {0}")]
    Store(#[from] crate::domains::resources::StoreError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Error originating from the transport layer.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),

    /// The server was started twice.
    #[error("Server is already running")]
    AlreadyRunning,
}
