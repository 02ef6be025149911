//! On-disk chunk manifests read by [`FsTransport`](crate::FsTransport).
//!
//! A manifest is a TOML document listing a chunk's exports:
//!
//! ```toml
//! [exports.default]
//! name = "DynamicComponent"
//! selector = "app-dynamic"
//!
//! [exports.Settings]
//! name = "SettingsComponent"
//! ```

use std::collections::BTreeMap;

use lazyroute_types::{ChunkId, ComponentRef, ModuleHandle};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Parsed contents of a chunk manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkManifest {
    #[serde(default)]
    pub exports: BTreeMap<String, ComponentRef>,
}

impl ChunkManifest {
    /// Parse a manifest from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, TransportError> {
        toml::from_str(text).map_err(|e| TransportError::Malformed {
            reason: e.message().to_string(),
        })
    }

    /// Render the manifest as TOML text.
    pub fn to_toml_string(&self) -> Result<String, TransportError> {
        toml::to_string(self).map_err(|e| TransportError::Malformed {
            reason: e.to_string(),
        })
    }

    /// Initialize the chunk: turn the manifest into a module handle.
    ///
    /// A manifest without exports is malformed; a chunk that exports nothing
    /// can never satisfy a route.
    pub fn into_handle(self, chunk_id: ChunkId) -> Result<ModuleHandle, TransportError> {
        if self.exports.is_empty() {
            return Err(TransportError::Malformed {
                reason: "manifest declares no exports".into(),
            });
        }
        Ok(ModuleHandle::from_exports(chunk_id, self.exports))
    }
}
