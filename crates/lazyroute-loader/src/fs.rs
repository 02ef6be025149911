//! Filesystem chunk transport.
//!
//! [`FsTransport`] maps a chunk id to `<root>/<chunk_id>.toml`, reads the
//! manifest under a deadline, and initializes it into a [`ModuleHandle`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use lazyroute_types::{ChunkId, ModuleHandle};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TransportError, TransportResult};
use crate::manifest::ChunkManifest;
use crate::traits::ChunkTransport;

/// File extension of chunk manifests.
pub const MANIFEST_EXTENSION: &str = "toml";

/// Configuration for the [`FsTransport`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FsTransportConfig {
    /// Directory holding chunk manifests.
    pub root: PathBuf,
    /// Deadline for reading and initializing a single chunk.
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,
}

/// `Duration` as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl Default for FsTransportConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("chunks"),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Reads chunks from TOML manifests in a directory.
#[derive(Clone, Debug)]
pub struct FsTransport {
    config: FsTransportConfig,
}

impl FsTransport {
    pub fn new(config: FsTransportConfig) -> Self {
        Self { config }
    }

    /// Transport over `root` with the default deadline.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::new(FsTransportConfig {
            root: root.into(),
            ..Default::default()
        })
    }

    pub fn config(&self) -> &FsTransportConfig {
        &self.config
    }

    /// Path of the manifest backing `chunk_id`.
    ///
    /// Identifiers that could escape the root directory are rejected.
    pub fn manifest_path(&self, chunk_id: &ChunkId) -> TransportResult<PathBuf> {
        validate_file_id(chunk_id)?;
        Ok(self
            .config
            .root
            .join(format!("{}.{MANIFEST_EXTENSION}", chunk_id.as_str())))
    }

    async fn read_manifest(path: &Path, chunk_id: &ChunkId) -> TransportResult<ChunkManifest> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TransportError::NotFound(chunk_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        ChunkManifest::from_toml_str(&text)
    }
}

#[async_trait]
impl ChunkTransport for FsTransport {
    async fn fetch_and_initialize(&self, chunk_id: &ChunkId) -> TransportResult<ModuleHandle> {
        let path = self.manifest_path(chunk_id)?;
        debug!(chunk_id = %chunk_id, path = %path.display(), "reading chunk manifest");

        let manifest = tokio::time::timeout(self.config.timeout, Self::read_manifest(&path, chunk_id))
            .await
            .map_err(|_| TransportError::Timeout {
                after: self.config.timeout,
            })??;
        manifest.into_handle(chunk_id.clone())
    }
}

/// Characters that may not appear in a filesystem-backed chunk id.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '\0'];

fn validate_file_id(chunk_id: &ChunkId) -> TransportResult<()> {
    let id = chunk_id.as_str();
    let invalid = |reason: &str| TransportError::InvalidId {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if let Some(ch) = id.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(&format!("contains forbidden character: {ch:?}")));
    }
    if id.contains("..") {
        return Err(invalid("must not contain '..'"));
    }
    if id.starts_with('.') {
        return Err(invalid("must not start with '.'"));
    }
    Ok(())
}
