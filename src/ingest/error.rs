// src/ingest/error.rs
use std::time::Duration;
use thiserror::Error;

/// Why a single source contributed nothing this cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or body read failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request exceeded its per-source deadline
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Server answered with a non-2xx status
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Transport error raised by a non-HTTP transport (fixtures, tests)
    #[error("transport error: {0}")]
    Unreachable(String),

    /// Body is not a well-formed RSS or Atom document
    #[error("feed parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// True for the HTTP-class failures (everything except parse errors).
    pub fn is_transport(&self) -> bool {
        !matches!(self, FetchError::Parse(_))
    }
}
