//! # Router Error Types

use bridge_codec::ProtocolError;
use thiserror::Error;

/// Router operation errors
#[derive(Error, Debug)]
pub enum RouterError {
    /// No link attached, or the link dropped during the write
    ///
    /// Recoverable: the supervisor reattaches and later sends succeed.
    #[error("Link unavailable: {reason}")]
    LinkUnavailable { reason: String },

    /// Frame could not be encoded (oversized payload)
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Connecting to the configured endpoint failed
    #[error("Failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
}

impl RouterError {
    pub fn link_unavailable(reason: impl Into<String>) -> Self {
        Self::LinkUnavailable {
            reason: reason.into(),
        }
    }

    /// Whether retrying later can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RouterError::LinkUnavailable { .. } | RouterError::Connect { .. })
    }
}

/// Result type alias for router operations
pub type RouterResult<T> = std::result::Result<T, RouterError>;
