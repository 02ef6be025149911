use std::fmt;

use serde::{Deserialize, Serialize};

/// Load lifecycle of a chunk.
///
/// `NotRequested -> Loading -> (Loaded | Failed)`. `Loaded` and `Failed` are
/// terminal until an explicit reset returns the chunk to `NotRequested`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkState {
    NotRequested,
    Loading,
    Loaded,
    Failed,
}

impl ChunkState {
    /// Returns `true` for states that only a reset can leave.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Loaded | Self::Failed)
    }

    /// Returns `true` if a reset from this state is permitted.
    pub fn can_reset(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

impl fmt::Display for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotRequested => "not-requested",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}
