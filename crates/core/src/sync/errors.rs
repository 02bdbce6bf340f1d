//! Scan-ingest error types
//!
//! Classifies remote ingest failures so hosts can decide when a later drain
//! is worth triggering. The drain itself never retries within a pass.

use std::time::Duration;

use thiserror::Error;
use tnt_domain::{impl_label_conversions, TntError};

/// Categories of ingest errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestErrorCategory {
    /// 401/403: the API key was rejected
    Authentication,
    /// 429 or 503: endpoint asked us to slow down
    RateLimit,
    /// 5xx
    Server,
    /// 4xx other than auth, or an unserializable record
    Client,
    /// Connection refused, DNS, TLS, timeouts
    Network,
    /// Client misconfiguration
    Config,
}

impl_label_conversions!(IngestErrorCategory {
    Authentication => "authentication",
    RateLimit => "rate_limit",
    Server => "server",
    Client => "client",
    Network => "network",
    Config => "config",
});

/// Remote ingest failure for a single scan record
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl IngestError {
    /// Get the error category for this error
    pub const fn category(&self) -> IngestErrorCategory {
        match self {
            Self::Auth(_) => IngestErrorCategory::Authentication,
            Self::RateLimit(_) => IngestErrorCategory::RateLimit,
            Self::Server(_) => IngestErrorCategory::Server,
            Self::Client(_) => IngestErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => IngestErrorCategory::Network,
            Self::Config(_) => IngestErrorCategory::Config,
        }
    }

    /// Whether sending the same record again later can succeed.
    ///
    /// Connectivity and server-side problems are transient; a record the
    /// endpoint rejected as malformed will be rejected again.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self.category(),
            IngestErrorCategory::RateLimit
                | IngestErrorCategory::Server
                | IngestErrorCategory::Network
        )
    }
}

impl From<TntError> for IngestError {
    fn from(err: TntError) -> Self {
        match err {
            TntError::Network(message) => Self::Network(message),
            TntError::Auth(message) => Self::Auth(message),
            TntError::Config(message) => Self::Config(message),
            TntError::NotFound(message)
            | TntError::InvalidInput(message)
            | TntError::Serialization(message) => Self::Client(message),
            TntError::Database(message) | TntError::Internal(message) => Self::Server(message),
        }
    }
}
