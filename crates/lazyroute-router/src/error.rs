//! Error types for route table construction.

use thiserror::Error;

/// Errors raised while building a route table or loading its configuration.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Two entries share an identical path pattern.
    #[error("duplicate route pattern: {pattern:?}")]
    DuplicatePattern { pattern: String },

    /// A deferred route names an empty chunk identifier.
    #[error("deferred route {pattern:?} has an empty chunk id")]
    EmptyChunkId { pattern: String },

    /// A deferred route selects an export with an empty name.
    #[error("deferred route {pattern:?} selects an empty export name")]
    EmptyExport { pattern: String },

    /// The path pattern is syntactically invalid.
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The route configuration could not be parsed.
    #[error("route config error: {0}")]
    Config(String),

    /// I/O error while reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for route operations.
pub type RouteResult<T> = std::result::Result<T, RouteError>;
