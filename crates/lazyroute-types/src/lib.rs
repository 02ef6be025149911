//! Foundation types for lazyroute.
//!
//! This crate provides the identity and structural types shared by the loader,
//! the router, and the navigator. Every other lazyroute crate depends on
//! `lazyroute-types`.
//!
//! # Key Types
//!
//! - [`ChunkId`] — Opaque, stable name of a deferred unit of code
//! - [`ChunkState`] — Load lifecycle of a chunk inside the registry
//! - [`ComponentRef`] — Plain descriptor record handed to the renderer
//! - [`ExportSelector`] — Which exported symbol of a loaded chunk to use
//! - [`ModuleHandle`] — Result of a successful chunk load

pub mod chunk;
pub mod component;
pub mod module;
pub mod state;

pub use chunk::ChunkId;
pub use component::{ComponentRef, ExportSelector, DEFAULT_EXPORT};
pub use module::ModuleHandle;
pub use state::ChunkState;
