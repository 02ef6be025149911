use std::sync::Arc;
use std::time::Instant;

use lazyroute_types::{ChunkId, ModuleHandle};
use tracing::{info, warn};

use crate::error::{ChunkLoadError, LoadResult, TransportError};
use crate::traits::ChunkTransport;

/// Fetches and initializes chunks through a [`ChunkTransport`].
///
/// The loader is a pure function from identifier to handle-or-error: it keeps
/// no cache and never retries. Transport failures come back as
/// [`ChunkLoadError`] with the transport's cause attached.
#[derive(Clone)]
pub struct ChunkLoader {
    transport: Arc<dyn ChunkTransport>,
}

impl ChunkLoader {
    pub fn new(transport: Arc<dyn ChunkTransport>) -> Self {
        Self { transport }
    }

    /// Load the code unit behind `chunk_id`.
    pub async fn load(&self, chunk_id: &ChunkId) -> LoadResult<ModuleHandle> {
        let started = Instant::now();
        match self.transport.fetch_and_initialize(chunk_id).await {
            Ok(handle) if handle.chunk_id() != chunk_id => {
                let cause = TransportError::Malformed {
                    reason: format!("transport returned chunk {}", handle.chunk_id()),
                };
                warn!(chunk_id = %chunk_id, %cause, "chunk load failed");
                Err(ChunkLoadError::new(chunk_id.clone(), cause))
            }
            Ok(handle) => {
                info!(
                    chunk_id = %chunk_id,
                    exports = handle.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "chunk loaded"
                );
                Ok(handle)
            }
            Err(cause) => {
                warn!(chunk_id = %chunk_id, %cause, "chunk load failed");
                Err(ChunkLoadError::new(chunk_id.clone(), cause))
            }
        }
    }
}

impl std::fmt::Debug for ChunkLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkLoader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryTransport;
    use lazyroute_types::ComponentRef;

    fn loader_with(transport: InMemoryTransport) -> (Arc<InMemoryTransport>, ChunkLoader) {
        let transport = Arc::new(transport);
        let loader = ChunkLoader::new(transport.clone());
        (transport, loader)
    }

    #[tokio::test]
    async fn load_success() {
        let module = ModuleHandle::new("a").with_default(ComponentRef::new("A"));
        let (_, loader) = loader_with(InMemoryTransport::new().with_module(module.clone()));
        let handle = loader.load(&ChunkId::new("a")).await.unwrap();
        assert_eq!(handle, module);
    }

    #[tokio::test]
    async fn load_wraps_transport_error() {
        let (transport, loader) = loader_with(InMemoryTransport::new());
        transport.fail("a", TransportError::Other("network timeout".into()));

        let err = loader.load(&ChunkId::new("a")).await.unwrap_err();
        assert_eq!(err.chunk_id, ChunkId::new("a"));
        assert_eq!(err.cause, TransportError::Other("network timeout".into()));
    }

    #[tokio::test]
    async fn transport_timeout_propagates() {
        let (transport, loader) = loader_with(InMemoryTransport::new());
        transport.fail(
            "slow",
            TransportError::Timeout {
                after: std::time::Duration::from_secs(1),
            },
        );
        let err = loader.load(&ChunkId::new("slow")).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn no_caching_in_loader() {
        let module = ModuleHandle::new("a").with_default(ComponentRef::new("A"));
        let (transport, loader) = loader_with(InMemoryTransport::new().with_module(module));
        let id = ChunkId::new("a");
        loader.load(&id).await.unwrap();
        loader.load(&id).await.unwrap();
        assert_eq!(transport.fetch_count(&id), 2);
    }

    #[tokio::test]
    async fn mismatched_handle_is_malformed() {
        let module = ModuleHandle::new("other").with_default(ComponentRef::new("X"));
        let transport = InMemoryTransport::new();
        transport.insert(module);
        // Serve "other"'s handle under the id "a".
        struct Redirecting(InMemoryTransport);
        #[async_trait::async_trait]
        impl ChunkTransport for Redirecting {
            async fn fetch_and_initialize(
                &self,
                _chunk_id: &ChunkId,
            ) -> crate::TransportResult<ModuleHandle> {
                self.0.fetch_and_initialize(&ChunkId::new("other")).await
            }
        }
        let loader = ChunkLoader::new(Arc::new(Redirecting(transport)));
        let err = loader.load(&ChunkId::new("a")).await.unwrap_err();
        assert!(matches!(err.cause, TransportError::Malformed { .. }));
    }
}
