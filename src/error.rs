//! Error types for the live-proxy-pool crate.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while harvesting, probing or persisting proxies.
///
/// A candidate failing validation is not an error: the validator reports it
/// as `None`.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Connection, timeout or proxy failure talking to a source or the reference endpoint.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest_middleware::Error),
    /// The remote answered, but not with 200.
    #[error("unexpected response status {0}")]
    Status(StatusCode),
    /// Markup or JSON did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
    /// Reading or writing the durable snapshot failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),
    /// The durable snapshot could not be encoded or decoded.
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<reqwest::Error> for PoolError {
    fn from(err: reqwest::Error) -> Self {
        PoolError::Transport(reqwest_middleware::Error::Reqwest(err))
    }
}

impl PoolError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        PoolError::Parse(msg.into())
    }

    /// True for failures that concern the network rather than the payload.
    pub fn is_transport(&self) -> bool {
        matches!(self, PoolError::Transport(_) | PoolError::Status(_))
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
