//! Route descriptors: what a matched route resolves to.

use lazyroute_types::{ChunkId, ComponentRef, ExportSelector};
use serde::{Deserialize, Serialize};

/// What a route renders once matched.
///
/// In configuration the variant is chosen by `kind`:
///
/// ```toml
/// kind = "deferred"
/// chunk = "dyn-chunk"
/// export = "default"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteDescriptor {
    /// The component is available without loading anything.
    Immediate { component: ComponentRef },
    /// The component is an export of a chunk that must be loaded first.
    Deferred {
        chunk: ChunkId,
        #[serde(default)]
        export: ExportSelector,
    },
}

impl RouteDescriptor {
    pub fn immediate(component: ComponentRef) -> Self {
        Self::Immediate { component }
    }

    pub fn deferred(chunk: impl Into<ChunkId>, export: impl Into<ExportSelector>) -> Self {
        Self::Deferred {
            chunk: chunk.into(),
            export: export.into(),
        }
    }

    /// The chunk this route depends on, if deferred.
    pub fn chunk_id(&self) -> Option<&ChunkId> {
        match self {
            Self::Immediate { .. } => None,
            Self::Deferred { chunk, .. } => Some(chunk),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred { .. })
    }
}

/// One `{path, descriptor}` record of route configuration input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    /// Path pattern, e.g. `"users/:id"`.
    pub path: String,
    #[serde(flatten)]
    pub descriptor: RouteDescriptor,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>, descriptor: RouteDescriptor) -> Self {
        Self {
            path: path.into(),
            descriptor,
        }
    }
}
