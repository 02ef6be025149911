//! Error types for chunk loading.
//!
//! Load failures are cached on the registry entry and delivered to every
//! waiter, so every error that crosses the registry is `Clone`.

use std::time::Duration;

use lazyroute_types::ChunkId;
use thiserror::Error;

/// Failures reported by a [`ChunkTransport`](crate::ChunkTransport).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The transport has no code for this chunk.
    #[error("chunk not found: {0}")]
    NotFound(ChunkId),

    /// The fetch did not complete within the transport's deadline.
    #[error("timed out after {after:?}")]
    Timeout { after: Duration },

    /// The chunk was fetched but could not be initialized.
    #[error("malformed chunk: {reason}")]
    Malformed { reason: String },

    /// The chunk identifier cannot be mapped by this transport.
    #[error("invalid chunk id {id:?}: {reason}")]
    InvalidId { id: String, reason: String },

    /// The load was dropped before it settled (e.g. the loading task panicked
    /// or the runtime shut down).
    #[error("load interrupted before it settled")]
    Interrupted,

    /// I/O failure in the underlying medium.
    #[error("I/O error: {0}")]
    Io(String),

    /// Any other transport-specific failure.
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// A chunk failed to load. Wraps the transport's cause unchanged.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to load chunk {chunk_id}: {cause}")]
pub struct ChunkLoadError {
    pub chunk_id: ChunkId,
    #[source]
    pub cause: TransportError,
}

impl ChunkLoadError {
    pub fn new(chunk_id: ChunkId, cause: TransportError) -> Self {
        Self { chunk_id, cause }
    }

    /// Returns `true` if the transport gave up on a deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, TransportError::Timeout { .. })
    }
}

/// Errors from registry bookkeeping operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// An entry cannot be reset while its load is in flight.
    #[error("cannot reset chunk {0} while it is loading")]
    ResetWhileLoading(ChunkId),
}

/// Result alias for transport calls.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result alias for chunk loads.
pub type LoadResult<T> = Result<T, ChunkLoadError>;

/// Result alias for registry bookkeeping.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_message_includes_cause() {
        let err = ChunkLoadError::new(
            ChunkId::new("dyn-chunk"),
            TransportError::Other("network timeout".into()),
        );
        assert_eq!(
            err.to_string(),
            "failed to load chunk dyn-chunk: network timeout"
        );
        assert!(!err.is_timeout());
    }

    #[test]
    fn timeout_detection() {
        let err = ChunkLoadError::new(
            ChunkId::new("slow"),
            TransportError::Timeout {
                after: Duration::from_millis(50),
            },
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn io_errors_become_strings() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: TransportError = io.into();
        assert_eq!(err, TransportError::Io("denied".into()));
    }
}
