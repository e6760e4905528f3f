use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("unknown connector type: {0}")]
    UnknownConnector(String),

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("{feed} WebSocket connection timed out after {after:?}")]
    ConnectionTimeout { feed: String, after: Duration },

    #[error("price not available yet from {0}")]
    PriceUnavailable(String),

    #[error("Credentials missing: {0}")]
    Credentials(String),

    #[error("order backlog full: {0} submissions still in flight")]
    OrderBacklog(usize),

    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
