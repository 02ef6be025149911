use lazyroute_loader::ChunkLoadError;
use lazyroute_types::{ChunkId, ExportSelector};
use thiserror::Error;

/// Why a navigation attempt failed.
///
/// All variants are terminal for the attempt that produced them and are
/// reported to the renderer. Superseded navigations are not errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    /// No route matches the requested path.
    #[error("no route matches path {path:?}")]
    RouteNotFound { path: String },

    /// The route's chunk failed to load. Cached until the chunk is reset.
    #[error(transparent)]
    ChunkLoad(#[from] ChunkLoadError),

    /// The chunk loaded, but lacks the export the route selects. The chunk
    /// stays loaded; the route configuration is wrong.
    #[error("chunk {chunk_id} has no export named {export:?}")]
    ExportNotFound {
        chunk_id: ChunkId,
        export: ExportSelector,
    },
}

impl NavigationError {
    /// Short machine-readable label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => "route-not-found",
            Self::ChunkLoad(_) => "chunk-load",
            Self::ExportNotFound { .. } => "export-not-found",
        }
    }
}

/// Convenience type alias for navigation results.
pub type NavResult<T> = Result<T, NavigationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lazyroute_loader::TransportError;

    #[test]
    fn messages() {
        let err = NavigationError::RouteNotFound {
            path: "missing-path".into(),
        };
        assert_eq!(err.to_string(), "no route matches path \"missing-path\"");
        assert_eq!(err.kind(), "route-not-found");

        let err: NavigationError = ChunkLoadError::new(
            ChunkId::new("dyn-chunk"),
            TransportError::Other("network timeout".into()),
        )
        .into();
        assert_eq!(
            err.to_string(),
            "failed to load chunk dyn-chunk: network timeout"
        );
        assert_eq!(err.kind(), "chunk-load");

        let err = NavigationError::ExportNotFound {
            chunk_id: ChunkId::new("dyn-chunk"),
            export: ExportSelector::named("Missing"),
        };
        assert_eq!(err.kind(), "export-not-found");
        assert!(err.to_string().contains("Missing"));
    }
}
