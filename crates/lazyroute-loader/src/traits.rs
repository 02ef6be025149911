//! The [`ChunkTransport`] trait: the physical side of chunk loading.
//!
//! Any medium (network fetch, bundler runtime, filesystem) implements this
//! trait. The loader treats it as opaque.

use async_trait::async_trait;
use lazyroute_types::{ChunkId, ModuleHandle};

use crate::error::TransportResult;

/// Fetches and initializes the code behind a chunk identifier.
///
/// Implementations must be thread-safe and must not cache: the registry owns
/// caching and calls the transport at most once per chunk per generation.
/// Deadlines, if any, are the transport's responsibility and are reported as
/// [`TransportError::Timeout`](crate::TransportError::Timeout).
#[async_trait]
pub trait ChunkTransport: Send + Sync {
    async fn fetch_and_initialize(&self, chunk_id: &ChunkId) -> TransportResult<ModuleHandle>;
}
