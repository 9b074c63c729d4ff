//! Process configuration read from the environment.

use std::net::{IpAddr, SocketAddr};

/// Errors raised while reading [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CODEBREAKER_HOST must be an IP address, got {0:?}")]
    InvalidHost(String),

    #[error("CODEBREAKER_PORT must be a port number, got {0:?}")]
    InvalidPort(String),
}

/// Where the server listens and how loudly it logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Default `tracing` filter. `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl ServerConfig {
    /// Reads `CODEBREAKER_HOST`, `CODEBREAKER_PORT` and `CODEBREAKER_LOG`.
    ///
    /// Unset variables fall back to `127.0.0.1`, `8080` and `info`. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the host or port does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = match lookup("CODEBREAKER_HOST") {
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidHost(raw))?,
            None => IpAddr::from([127, 0, 0, 1]),
        };
        let port = match lookup("CODEBREAKER_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => 8080,
        };
        let log_level = lookup("CODEBREAKER_LOG").unwrap_or_else(|| "info".to_owned());

        Ok(Self {
            host,
            port,
            log_level,
        })
    }

    /// The socket address to bind.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8080,
            log_level: "info".to_owned(),
        }
    }
}
