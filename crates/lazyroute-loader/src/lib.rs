//! Deferred chunk loading for lazyroute.
//!
//! A chunk is a unit of code whose loading is deferred until a navigation
//! first needs it. This crate owns everything between "a route names a chunk"
//! and "the navigator holds a module handle":
//!
//! - [`ChunkTransport`] — the external fetch-and-initialize collaborator
//! - [`ChunkLoader`] — wraps a transport, turning its failures into
//!   [`ChunkLoadError`]s; never caches
//! - [`ChunkRegistry`] — process-wide table of chunk load states that folds
//!   concurrent requests for one chunk into a single load
//!
//! # Transports
//!
//! - [`InMemoryTransport`] — scripted modules for tests and embedding
//! - [`FsTransport`] — reads TOML chunk manifests from a directory
//!
//! # Design Rules
//!
//! 1. At most one entry per chunk identifier for the lifetime of a registry.
//! 2. Exactly one transport call per chunk per generation (between resets).
//! 3. Settled results are cached: `Loaded` returns the shared handle, `Failed`
//!    returns the cached error, both without touching the transport.
//! 4. Transport errors are wrapped and propagated, never swallowed.
//! 5. Dropping a requester never cancels an in-flight load.

pub mod error;
pub mod fs;
pub mod loader;
pub mod manifest;
pub mod memory;
pub mod registry;
pub mod traits;

pub use error::{
    ChunkLoadError, LoadResult, RegistryError, RegistryResult, TransportError, TransportResult,
};
pub use fs::{FsTransport, FsTransportConfig};
pub use loader::ChunkLoader;
pub use manifest::ChunkManifest;
pub use memory::{InMemoryTransport, TransportGate};
pub use registry::{ChunkRegistry, ChunkSnapshot};
pub use traits::ChunkTransport;
