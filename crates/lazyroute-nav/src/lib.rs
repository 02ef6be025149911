//! Navigation for lazyroute.
//!
//! The [`Navigator`] turns a requested path into exactly one render call (or
//! one reported failure). Immediate routes render right away; deferred routes
//! suspend on the [`ChunkRegistry`](lazyroute_loader::ChunkRegistry) until
//! their chunk settles.
//!
//! Several navigations may be in flight at once, but only the most recently
//! issued one may reach the renderer. Every navigation carries a sequence
//! number; one that completes after a newer navigation was issued is
//! discarded silently, no matter which finished first.

pub mod config;
pub mod error;
pub mod event;
pub mod navigator;
pub mod render;

pub use config::{NavigatorConfig, RetryPolicy};
pub use error::{NavResult, NavigationError};
pub use event::{NavigationEvent, NavigationEventKind};
pub use navigator::{NavigationOutcome, NavigationRequest, Navigator, NavigatorState};
pub use render::{RecordingRenderer, RenderCall, Renderer};
