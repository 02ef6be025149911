//! Route resolution for lazyroute.
//!
//! A [`RouteTable`] is an ordered, immutable list of path patterns, each bound
//! to a [`RouteDescriptor`]: either a component that is available right away
//! or a deferred reference into a chunk that must be loaded first.
//!
//! # Matching
//!
//! Patterns are split on `/`. A segment is a literal, a `:name` parameter, or
//! a trailing `**` wildcard. When several patterns match a path, exact
//! (all-literal) patterns win over parametrized ones, which win over
//! wildcards; among patterns of equal specificity the earliest entry wins.
//!
//! # Modules
//!
//! - [`error`] — Error types for table construction and configuration
//! - [`pattern`] — Path pattern parsing and matching
//! - [`descriptor`] — [`RouteDescriptor`] and [`RouteRecord`]
//! - [`table`] — [`RouteTable`] and its builder
//! - [`config`] — TOML route configuration

pub mod config;
pub mod descriptor;
pub mod error;
pub mod pattern;
pub mod table;

pub use config::RouteConfig;
pub use descriptor::{RouteDescriptor, RouteRecord};
pub use error::{RouteError, RouteResult};
pub use pattern::{PathPattern, RouteParams, Segment, Specificity};
pub use table::{Route, RouteMatch, RouteTable, RouteTableBuilder};
