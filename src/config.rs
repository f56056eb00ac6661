use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HopperError, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Forwarding configuration
    pub forward: ForwardConfig,
    /// Proxy pool configuration
    pub pool: PoolConfig,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the API server (default: 8080)
    pub port: u16,
    /// Host to bind to (default: 0.0.0.0)
    pub host: String,
}

#[derive(Debug, Clone)]
pub struct ForwardConfig {
    /// Connection timeout per attempt in seconds
    pub connect_timeout: u64,
    /// Request timeout per attempt in seconds
    pub request_timeout: u64,
}

impl ForwardConfig {
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Newline-delimited proxy list loaded at startup, if set
    pub proxy_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            server: ServerConfig {
                port: get_env_or("SERVER_PORT", "8080").parse().map_err(|_| {
                    HopperError::InvalidConfig("SERVER_PORT must be a valid port number".into())
                })?,
                host: get_env_or("SERVER_HOST", "0.0.0.0"),
            },
            forward: ForwardConfig {
                connect_timeout: get_env_or("FORWARD_CONNECT_TIMEOUT", "10")
                    .parse()
                    .map_err(|_| {
                        HopperError::InvalidConfig(
                            "FORWARD_CONNECT_TIMEOUT must be a number of seconds".into(),
                        )
                    })?,
                request_timeout: get_env_or("FORWARD_REQUEST_TIMEOUT", "30")
                    .parse()
                    .map_err(|_| {
                        HopperError::InvalidConfig(
                            "FORWARD_REQUEST_TIMEOUT must be a number of seconds".into(),
                        )
                    })?,
            },
            pool: PoolConfig {
                proxy_file: env::var("PROXY_FILE").ok().map(PathBuf::from),
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "pretty"),
            },
        })
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
