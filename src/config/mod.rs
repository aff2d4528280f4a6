//! Environment-driven server configuration

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub log_level: String,
    /// Comma-separated list of allowed CORS origins
    pub client_origin: String,
}

impl Config {
    /// Read configuration from the environment. `PORT` alone is enough for
    /// container platforms; `SERVER_ADDR` overrides the full bind address.
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{port}")
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8765".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(server_addr))?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid server address: {0}")]
    InvalidAddress(String),
}
