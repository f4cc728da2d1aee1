//! Configuration management for the API server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables or defaults. Loading and validation
//! are separate steps: `Config::from_env` only parses, and the server calls
//! `ApiServerConfig::validate` once before binding its listener.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default port of the API server.
pub const DEFAULT_PORT: i32 = 5681;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configuration is structurally invalid.
    #[error("{0}")]
    Invalid(String),

    /// An environment variable holds a value that cannot be parsed.
    #[error("Invalid value '{value}' for {var}")]
    Env { var: &'static str, value: String },
}

impl ConfigError {
    /// Create a new "invalid configuration" error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Main configuration structure for the API server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// API server policy: port and read-only mode.
    pub api_server: ApiServerConfig,

    /// HTTP listener settings.
    pub http: HttpConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// API server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiServerConfig {
    /// Port of the API server. `0` lets the operating system pick a free port.
    pub port: i32,

    /// If true, the API server only serves read requests.
    pub read_only: bool,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Host address to bind to.
    pub host: String,

    /// Enable CORS for browser clients.
    pub enable_cors: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "resource-api-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            read_only: false,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            enable_cors: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// The canonical API server configuration used when nothing else is supplied.
pub fn default_config() -> ApiServerConfig {
    ApiServerConfig::default()
}

impl ApiServerConfig {
    /// Check that the configuration can be served.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port < 0 {
            return Err(ConfigError::invalid("port cannot be negative"));
        }
        if self.port > i32::from(u16::MAX) {
            return Err(ConfigError::invalid("port cannot exceed 65535"));
        }
        Ok(())
    }

    /// The port to bind, once validated.
    pub fn bind_port(&self) -> Result<u16, ConfigError> {
        self.validate()?;
        u16::try_from(self.port).map_err(|_| ConfigError::invalid("port out of range"))
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    /// Recognized variables: `API_SERVER_NAME`, `API_SERVER_PORT`,
    /// `API_SERVER_READ_ONLY`, `API_SERVER_HOST`, `API_SERVER_CORS`,
    /// `API_SERVER_LOG_LEVEL`. The port and read-only flag also accept the
    /// legacy `KUMA_API_SERVER_PORT` and `KUMA_API_SERVER_READ_ONLY`; the
    /// unprefixed name wins when both are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("API_SERVER_NAME") {
            config.server.name = name;
        }

        let port_vars = ["API_SERVER_PORT", "KUMA_API_SERVER_PORT"];
        if let Some(port) = parse_var(&port_vars, |v| v.parse::<i32>().ok())? {
            config.api_server.port = port;
        }

        let read_only_vars = ["API_SERVER_READ_ONLY", "KUMA_API_SERVER_READ_ONLY"];
        if let Some(read_only) = parse_var(&read_only_vars, parse_bool)? {
            config.api_server.read_only = read_only;
        }

        if let Ok(host) = std::env::var("API_SERVER_HOST") {
            config.http.host = host;
        }

        if let Some(enable_cors) = parse_var(&["API_SERVER_CORS"], parse_bool)? {
            config.http.enable_cors = enable_cors;
        }

        if let Ok(level) = std::env::var("API_SERVER_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }
}

/// Parse the first of `vars` that is set.
fn parse_var<T>(
    vars: &[&'static str],
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
    let Some((var, value)) = vars
        .iter()
        .find_map(|&var| std::env::var(var).ok().map(|value| (var, value)))
    else {
        return Ok(None);
    };

    parse(value.trim())
        .map(Some)
        .ok_or(ConfigError::Env { var, value })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 8] = [
        "API_SERVER_NAME",
        "API_SERVER_PORT",
        "API_SERVER_READ_ONLY",
        "API_SERVER_HOST",
        "API_SERVER_CORS",
        "API_SERVER_LOG_LEVEL",
        "KUMA_API_SERVER_PORT",
        "KUMA_API_SERVER_READ_ONLY",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_default_config_values() {
        let config = default_config();
        assert_eq!(config.port, 5681);
        assert!(!config.read_only);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(default_config().validate().is_ok());
        assert!(Config::default().api_server.validate().is_ok());
    }

    #[test]
    fn test_validate_port_boundaries() {
        let negative = ApiServerConfig {
            port: -1,
            read_only: false,
        };
        assert_eq!(
            negative.validate(),
            Err(ConfigError::Invalid("port cannot be negative".to_string()))
        );

        let zero = ApiServerConfig {
            port: 0,
            read_only: false,
        };
        assert!(zero.validate().is_ok());

        let read_only = ApiServerConfig {
            port: 5681,
            read_only: true,
        };
        assert!(read_only.validate().is_ok());

        let too_large = ApiServerConfig {
            port: 65536,
            read_only: false,
        };
        assert!(too_large.validate().is_err());
    }

    #[test]
    fn test_bind_port() {
        assert_eq!(default_config().bind_port(), Ok(5681));
        let negative = ApiServerConfig {
            port: -5,
            read_only: false,
        };
        assert!(negative.bind_port().is_err());
    }

    #[test]
    fn test_from_env_overrides() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("API_SERVER_PORT", "8081");
            std::env::set_var("API_SERVER_READ_ONLY", "true");
            std::env::set_var("API_SERVER_CORS", "0");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_server.port, 8081);
        assert!(config.api_server.read_only);
        assert!(!config.http.enable_cors);

        clear_env();
    }

    #[test]
    fn test_from_env_accepts_legacy_names() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("KUMA_API_SERVER_PORT", "9090");
            std::env::set_var("KUMA_API_SERVER_READ_ONLY", "true");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_server.port, 9090);
        assert!(config.api_server.read_only);

        unsafe {
            std::env::set_var("API_SERVER_PORT", "8081");
        }
        assert_eq!(Config::from_env().unwrap().api_server.port, 8081);

        clear_env();
    }

    #[test]
    fn test_from_env_keeps_negative_port_for_validation() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("API_SERVER_PORT", "-1");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_server.port, -1);
        assert!(config.api_server.validate().is_err());

        clear_env();
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("API_SERVER_READ_ONLY", "maybe");
        }

        assert_eq!(
            Config::from_env().unwrap_err(),
            ConfigError::Env {
                var: "API_SERVER_READ_ONLY",
                value: "maybe".to_string()
            }
        );

        clear_env();
    }
}
