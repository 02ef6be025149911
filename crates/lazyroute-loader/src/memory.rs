//! In-memory chunk transport for tests and embedding.
//!
//! [`InMemoryTransport`] serves pre-registered [`ModuleHandle`]s and can be
//! scripted to fail, to fail a fixed number of times, or to hold a fetch
//! open until a [`TransportGate`] is released. Every call is counted so
//! callers can assert how often the transport was reached.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use lazyroute_types::{ChunkId, ModuleHandle};
use tokio::sync::watch;
use tracing::debug;

use crate::error::{TransportError, TransportResult};
use crate::traits::ChunkTransport;

/// Scripted failure for a chunk.
#[derive(Clone, Debug)]
enum Failure {
    Always(TransportError),
    Times { error: TransportError, remaining: usize },
}

#[derive(Debug, Default)]
struct Scripted {
    module: Option<ModuleHandle>,
    failure: Option<Failure>,
}

impl Scripted {
    /// Consume one scripted failure, if any is due.
    fn take_failure(&mut self) -> Option<TransportError> {
        match self.failure.take()? {
            Failure::Always(error) => {
                self.failure = Some(Failure::Always(error.clone()));
                Some(error)
            }
            Failure::Times { error, remaining } => {
                if remaining > 1 {
                    self.failure = Some(Failure::Times {
                        error: error.clone(),
                        remaining: remaining - 1,
                    });
                }
                Some(error)
            }
        }
    }
}

/// Releases fetches held by [`InMemoryTransport::hold`].
///
/// Dropping the gate without opening it fails the held fetches with
/// [`TransportError::Interrupted`].
#[derive(Debug)]
pub struct TransportGate {
    sender: watch::Sender<bool>,
}

impl TransportGate {
    /// Let every held and future fetch of the chunk proceed.
    pub fn open(&self) {
        self.sender.send_replace(true);
    }
}

/// An in-memory implementation of [`ChunkTransport`].
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    chunks: RwLock<HashMap<ChunkId, Scripted>>,
    gates: RwLock<HashMap<ChunkId, watch::Receiver<bool>>>,
    fetches: Mutex<HashMap<ChunkId, usize>>,
}

impl InMemoryTransport {
    /// Create an empty transport. Unknown chunks fail with `NotFound`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the module served for its chunk id.
    pub fn insert(&self, module: ModuleHandle) {
        let mut chunks = self.chunks.write().expect("transport lock poisoned");
        let chunk_id = module.chunk_id().clone();
        chunks.entry(chunk_id).or_default().module = Some(module);
    }

    /// Builder-style [`Self::insert`].
    pub fn with_module(self, module: ModuleHandle) -> Self {
        self.insert(module);
        self
    }

    /// Fail every fetch of `chunk_id` with `error`.
    pub fn fail(&self, chunk_id: impl Into<ChunkId>, error: TransportError) {
        self.script_failure(chunk_id.into(), Failure::Always(error));
    }

    /// Fail the next `times` fetches of `chunk_id`, then serve the module.
    pub fn fail_times(&self, chunk_id: impl Into<ChunkId>, error: TransportError, times: usize) {
        if times == 0 {
            return;
        }
        self.script_failure(
            chunk_id.into(),
            Failure::Times {
                error,
                remaining: times,
            },
        );
    }

    /// Stop failing fetches of `chunk_id`.
    pub fn heal(&self, chunk_id: &ChunkId) {
        let mut chunks = self.chunks.write().expect("transport lock poisoned");
        if let Some(scripted) = chunks.get_mut(chunk_id) {
            scripted.failure = None;
        }
    }

    /// Hold every fetch of `chunk_id` until the returned gate is opened.
    pub fn hold(&self, chunk_id: impl Into<ChunkId>) -> TransportGate {
        let (sender, receiver) = watch::channel(false);
        self.gates
            .write()
            .expect("transport lock poisoned")
            .insert(chunk_id.into(), receiver);
        TransportGate { sender }
    }

    /// Number of fetches issued for `chunk_id`.
    pub fn fetch_count(&self, chunk_id: &ChunkId) -> usize {
        self.fetches
            .lock()
            .expect("transport lock poisoned")
            .get(chunk_id)
            .copied()
            .unwrap_or(0)
    }

    /// Number of fetches issued across all chunks.
    pub fn total_fetches(&self) -> usize {
        self.fetches
            .lock()
            .expect("transport lock poisoned")
            .values()
            .sum()
    }

    fn script_failure(&self, chunk_id: ChunkId, failure: Failure) {
        let mut chunks = self.chunks.write().expect("transport lock poisoned");
        chunks.entry(chunk_id).or_default().failure = Some(failure);
    }
}

#[async_trait]
impl ChunkTransport for InMemoryTransport {
    async fn fetch_and_initialize(&self, chunk_id: &ChunkId) -> TransportResult<ModuleHandle> {
        *self
            .fetches
            .lock()
            .expect("transport lock poisoned")
            .entry(chunk_id.clone())
            .or_insert(0) += 1;

        let gate = self
            .gates
            .read()
            .expect("transport lock poisoned")
            .get(chunk_id)
            .cloned();
        if let Some(mut gate) = gate {
            debug!(chunk_id = %chunk_id, "fetch held at gate");
            gate.wait_for(|open| *open)
                .await
                .map_err(|_| TransportError::Interrupted)?;
        }

        let mut chunks = self.chunks.write().expect("transport lock poisoned");
        let scripted = chunks
            .get_mut(chunk_id)
            .ok_or_else(|| TransportError::NotFound(chunk_id.clone()))?;
        if let Some(error) = scripted.take_failure() {
            return Err(error);
        }
        scripted
            .module
            .clone()
            .ok_or_else(|| TransportError::NotFound(chunk_id.clone()))
    }
}
