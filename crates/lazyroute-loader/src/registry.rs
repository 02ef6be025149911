//! The process-wide chunk registry.
//!
//! [`ChunkRegistry`] is the only mutable shared state in lazyroute. It maps
//! each [`ChunkId`] to exactly one entry and funnels every state change
//! through [`ChunkRegistry::get_or_load`], [`ChunkRegistry::prefetch`] and
//! [`ChunkRegistry::reset`].
//!
//! # Single flight
//!
//! The first request for a chunk moves its entry to `Loading` and spawns a
//! detached task that drives the load. Requests arriving while the entry is
//! `Loading` are queued as waiters. When the load settles, the entry moves to
//! `Loaded` or `Failed` and every queued waiter receives the same result, in
//! enqueue order. The load task is detached so that a requester going away
//! never cancels the fetch.
//!
//! Each load belongs to a generation; `reset` starts a new one. A settlement
//! from an older generation is ignored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use lazyroute_types::{ChunkId, ChunkState, ModuleHandle};
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::error::{ChunkLoadError, LoadResult, RegistryError, RegistryResult, TransportError};
use crate::loader::ChunkLoader;
use crate::traits::ChunkTransport;

type Waiter = oneshot::Sender<LoadResult<Arc<ModuleHandle>>>;
type Table = Arc<Mutex<HashMap<ChunkId, ChunkEntry>>>;

/// Load state plus the data that is present only in that state.
enum Slot {
    NotRequested,
    Loading { waiters: Vec<Waiter> },
    Loaded(Arc<ModuleHandle>),
    Failed(ChunkLoadError),
}

struct ChunkEntry {
    chunk_id: ChunkId,
    slot: Slot,
    /// Incremented every time a load starts.
    generation: u64,
}

impl ChunkEntry {
    fn new(chunk_id: ChunkId) -> Self {
        Self {
            chunk_id,
            slot: Slot::NotRequested,
            generation: 0,
        }
    }

    fn state(&self) -> ChunkState {
        match self.slot {
            Slot::NotRequested => ChunkState::NotRequested,
            Slot::Loading { .. } => ChunkState::Loading,
            Slot::Loaded(_) => ChunkState::Loaded,
            Slot::Failed(_) => ChunkState::Failed,
        }
    }

    /// The cached result, if the entry has settled.
    fn settled(&self) -> Option<LoadResult<Arc<ModuleHandle>>> {
        match &self.slot {
            Slot::Loaded(handle) => Some(Ok(Arc::clone(handle))),
            Slot::Failed(error) => Some(Err(error.clone())),
            _ => None,
        }
    }

    /// Queue a waiter on an in-flight load.
    fn enqueue(&mut self) -> Option<oneshot::Receiver<LoadResult<Arc<ModuleHandle>>>> {
        match &mut self.slot {
            Slot::Loading { waiters } => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Some(rx)
            }
            _ => None,
        }
    }

    fn snapshot(&self) -> ChunkSnapshot {
        let (waiters, exports, error) = match &self.slot {
            Slot::NotRequested => (0, Vec::new(), None),
            Slot::Loading { waiters } => (waiters.len(), Vec::new(), None),
            Slot::Loaded(handle) => (0, handle.symbols().map(str::to_string).collect(), None),
            Slot::Failed(error) => (0, Vec::new(), Some(error.to_string())),
        };
        ChunkSnapshot {
            chunk_id: self.chunk_id.clone(),
            state: self.state(),
            generation: self.generation,
            waiters,
            exports,
            error,
        }
    }
}

/// Read-only view of a registry entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChunkSnapshot {
    pub chunk_id: ChunkId,
    pub state: ChunkState,
    /// Number of loads started for this chunk so far.
    pub generation: u64,
    /// Requesters queued on the in-flight load.
    pub waiters: usize,
    /// Exported symbols, once loaded.
    pub exports: Vec<String>,
    /// Cached failure message, once failed.
    pub error: Option<String>,
}

/// Process-wide table of chunk load states.
///
/// Cloning the registry is cheap and yields a handle onto the same table.
#[derive(Clone)]
pub struct ChunkRegistry {
    loader: ChunkLoader,
    entries: Table,
}

impl ChunkRegistry {
    pub fn new(loader: ChunkLoader) -> Self {
        Self {
            loader,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registry over a [`ChunkLoader`] for `transport`.
    pub fn with_transport(transport: Arc<dyn ChunkTransport>) -> Self {
        Self::new(ChunkLoader::new(transport))
    }

    /// Resolve the module handle for `chunk_id`, loading it on first request.
    ///
    /// - `NotRequested`: starts exactly one load and waits for it.
    /// - `Loading`: waits for the in-flight load.
    /// - `Loaded`: returns the cached handle without a fetch.
    /// - `Failed`: returns the cached error without a fetch.
    ///
    /// All requesters of one load observe the same handle (`Arc::ptr_eq`) or
    /// the same error.
    pub async fn get_or_load(&self, chunk_id: &ChunkId) -> LoadResult<Arc<ModuleHandle>> {
        let receiver = {
            let mut entries = lock(&self.entries);
            let entry = entries
                .entry(chunk_id.clone())
                .or_insert_with(|| ChunkEntry::new(chunk_id.clone()));

            if let Some(result) = entry.settled() {
                debug!(chunk_id = %chunk_id, state = %entry.state(), "chunk cache hit");
                return result;
            }
            match entry.enqueue() {
                Some(receiver) => {
                    debug!(chunk_id = %chunk_id, "waiting on in-flight chunk load");
                    receiver
                }
                None => {
                    let (tx, rx) = oneshot::channel();
                    self.start_load(entry, vec![tx]);
                    rx
                }
            }
        };

        receiver.await.unwrap_or_else(|_| {
            Err(ChunkLoadError::new(
                chunk_id.clone(),
                TransportError::Interrupted,
            ))
        })
    }

    /// Start loading `chunk_id` without waiting for the result.
    ///
    /// Returns `true` if a load was started, `false` if the chunk was already
    /// loading or settled. Must be called from within a Tokio runtime.
    pub fn prefetch(&self, chunk_id: &ChunkId) -> bool {
        let mut entries = lock(&self.entries);
        let entry = entries
            .entry(chunk_id.clone())
            .or_insert_with(|| ChunkEntry::new(chunk_id.clone()));
        if entry.state() != ChunkState::NotRequested {
            return false;
        }
        self.start_load(entry, Vec::new());
        true
    }

    /// Return a settled chunk to `NotRequested` so the next request refetches.
    ///
    /// Returns the state the entry was in. Resetting an unknown or
    /// never-requested chunk is a no-op. Resetting an in-flight load fails
    /// with [`RegistryError::ResetWhileLoading`].
    pub fn reset(&self, chunk_id: &ChunkId) -> RegistryResult<ChunkState> {
        let mut entries = lock(&self.entries);
        let Some(entry) = entries.get_mut(chunk_id) else {
            return Ok(ChunkState::NotRequested);
        };
        let previous = entry.state();
        if !previous.can_reset() {
            return Err(RegistryError::ResetWhileLoading(chunk_id.clone()));
        }
        entry.slot = Slot::NotRequested;
        if previous.is_settled() {
            info!(chunk_id = %chunk_id, from = %previous, "chunk reset");
        }
        Ok(previous)
    }

    /// Reset `chunk_id` only if it is currently `Failed`.
    ///
    /// Returns `true` if the entry was reset. A chunk that another requester
    /// already reset, reloaded or is reloading is left alone.
    pub fn reset_failed(&self, chunk_id: &ChunkId) -> bool {
        let mut entries = lock(&self.entries);
        match entries.get_mut(chunk_id) {
            Some(entry) if entry.state() == ChunkState::Failed => {
                entry.slot = Slot::NotRequested;
                info!(chunk_id = %chunk_id, "failed chunk reset");
                true
            }
            _ => false,
        }
    }

    /// Current state of `chunk_id`; unknown chunks read as `NotRequested`.
    pub fn state(&self, chunk_id: &ChunkId) -> ChunkState {
        lock(&self.entries)
            .get(chunk_id)
            .map(ChunkEntry::state)
            .unwrap_or(ChunkState::NotRequested)
    }

    /// Snapshot of a single entry, if the chunk was ever requested.
    pub fn snapshot(&self, chunk_id: &ChunkId) -> Option<ChunkSnapshot> {
        lock(&self.entries).get(chunk_id).map(ChunkEntry::snapshot)
    }

    /// Snapshots of every entry, sorted by chunk id.
    pub fn snapshots(&self) -> Vec<ChunkSnapshot> {
        let mut snapshots: Vec<ChunkSnapshot> =
            lock(&self.entries).values().map(ChunkEntry::snapshot).collect();
        snapshots.sort_by(|a, b| a.chunk_id.cmp(&b.chunk_id));
        snapshots
    }

    /// Sorted ids of all loaded chunks.
    pub fn loaded_ids(&self) -> Vec<ChunkId> {
        let mut ids: Vec<ChunkId> = lock(&self.entries)
            .values()
            .filter(|e| e.state() == ChunkState::Loaded)
            .map(|e| e.chunk_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Move `entry` to `Loading` and spawn the task that settles it.
    fn start_load(&self, entry: &mut ChunkEntry, waiters: Vec<Waiter>) {
        entry.generation += 1;
        entry.slot = Slot::Loading { waiters };

        let generation = entry.generation;
        let chunk_id = entry.chunk_id.clone();
        let loader = self.loader.clone();
        let settlement = Settlement::new(Arc::clone(&self.entries), chunk_id.clone(), generation);
        debug!(chunk_id = %chunk_id, generation, "chunk load started");

        tokio::spawn(async move {
            let mut settlement = settlement;
            let result = loader.load(&chunk_id).await;
            settlement.settle(result);
        });
    }
}

impl std::fmt::Debug for ChunkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkRegistry")
            .field("entry_count", &self.len())
            .finish()
    }
}

/// Settles one generation of a chunk's load exactly once.
///
/// If the load task unwinds before settling, dropping the settlement fails
/// the entry with [`TransportError::Interrupted`] so no waiter hangs.
struct Settlement {
    table: Table,
    chunk_id: ChunkId,
    generation: u64,
    done: bool,
}

impl Settlement {
    fn new(table: Table, chunk_id: ChunkId, generation: u64) -> Self {
        Self {
            table,
            chunk_id,
            generation,
            done: false,
        }
    }

    fn settle(&mut self, result: LoadResult<ModuleHandle>) {
        self.done = true;

        let (waiters, outcome) = {
            let mut entries = lock(&self.table);
            let Some(entry) = entries.get_mut(&self.chunk_id) else {
                return;
            };
            if entry.generation != self.generation || entry.state() != ChunkState::Loading {
                debug!(
                    chunk_id = %self.chunk_id,
                    generation = self.generation,
                    current = entry.generation,
                    "ignoring stale chunk settlement"
                );
                return;
            }

            let outcome = result.map(Arc::new);
            let next = match &outcome {
                Ok(handle) => Slot::Loaded(Arc::clone(handle)),
                Err(error) => Slot::Failed(error.clone()),
            };
            let waiters = match std::mem::replace(&mut entry.slot, next) {
                Slot::Loading { waiters } => waiters,
                _ => Vec::new(),
            };
            debug!(
                chunk_id = %self.chunk_id,
                state = %entry.state(),
                waiters = waiters.len(),
                "chunk load settled"
            );
            (waiters, outcome)
        };

        for waiter in waiters {
            // A waiter whose requester went away has nothing to receive.
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for Settlement {
    fn drop(&mut self) {
        if !self.done {
            let error = ChunkLoadError::new(self.chunk_id.clone(), TransportError::Interrupted);
            self.settle(Err(error));
        }
    }
}

fn lock(table: &Table) -> MutexGuard<'_, HashMap<ChunkId, ChunkEntry>> {
    table.lock().expect("registry lock poisoned")
}
