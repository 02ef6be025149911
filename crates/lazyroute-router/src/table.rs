use std::collections::HashSet;

use lazyroute_types::{ChunkId, ComponentRef, ExportSelector};
use serde::Serialize;
use tracing::debug;

use crate::descriptor::{RouteDescriptor, RouteRecord};
use crate::error::{RouteError, RouteResult};
use crate::pattern::{split_path, PathPattern, RouteParams, Specificity};

/// A validated table entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pattern: PathPattern,
    descriptor: RouteDescriptor,
}

impl Route {
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn descriptor(&self) -> &RouteDescriptor {
        &self.descriptor
    }
}

/// The outcome of a successful [`RouteTable::match_path`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    /// Position of the matched entry in the table.
    pub index: usize,
    /// Normalized pattern of the matched entry.
    pub pattern: String,
    pub descriptor: RouteDescriptor,
    pub params: RouteParams,
}

/// Ordered, immutable mapping from path patterns to route descriptors.
///
/// All validation happens at construction; afterwards the table is read-only
/// and safe to share across threads. Matching is a pure function of the path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build a table from configuration records, in order.
    ///
    /// Rejects invalid patterns, duplicate patterns (after normalization),
    /// deferred routes with an empty chunk id, and empty named exports.
    pub fn new(records: impl IntoIterator<Item = RouteRecord>) -> RouteResult<Self> {
        let mut seen = HashSet::new();
        let mut routes = Vec::new();

        for record in records {
            let pattern = PathPattern::parse(&record.path)?;
            if let RouteDescriptor::Deferred { chunk, export } = &record.descriptor {
                if chunk.is_empty() {
                    return Err(RouteError::EmptyChunkId {
                        pattern: record.path,
                    });
                }
                if export.symbol().is_empty() {
                    return Err(RouteError::EmptyExport {
                        pattern: record.path,
                    });
                }
            }
            if !seen.insert(pattern.as_str().to_string()) {
                return Err(RouteError::DuplicatePattern {
                    pattern: record.path,
                });
            }
            routes.push(Route {
                pattern,
                descriptor: record.descriptor,
            });
        }

        let table = Self { routes };
        debug!(
            routes = table.len(),
            deferred = table.chunk_ids().len(),
            "route table built"
        );
        Ok(table)
    }

    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Resolve `path` to the best matching route.
    ///
    /// Exact patterns beat parametrized ones, which beat wildcards; the first
    /// entry wins among equal specificity. Returns `None` when nothing
    /// matches.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let segments = split_path(path);
        let mut best: Option<(Specificity, usize, RouteParams)> = None;

        for (index, route) in self.routes.iter().enumerate() {
            let Some(params) = route.pattern.match_segments(&segments) else {
                continue;
            };
            let specificity = route.pattern.specificity();
            if best.as_ref().map_or(true, |(current, ..)| specificity < *current) {
                best = Some((specificity, index, params));
                if specificity == Specificity::Exact {
                    break;
                }
            }
        }

        best.map(|(_, index, params)| {
            let route = &self.routes[index];
            RouteMatch {
                index,
                pattern: route.pattern.as_str().to_string(),
                descriptor: route.descriptor.clone(),
                params,
            }
        })
    }

    /// Distinct deferred chunk ids, in table order.
    pub fn chunk_ids(&self) -> Vec<ChunkId> {
        let mut seen = HashSet::new();
        self.routes
            .iter()
            .filter_map(|r| r.descriptor.chunk_id())
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Incremental construction of a [`RouteTable`].
#[derive(Clone, Debug, Default)]
pub struct RouteTableBuilder {
    records: Vec<RouteRecord>,
}

impl RouteTableBuilder {
    pub fn route(mut self, record: RouteRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn immediate(self, path: impl Into<String>, component: ComponentRef) -> Self {
        self.route(RouteRecord::new(path, RouteDescriptor::immediate(component)))
    }

    pub fn deferred(
        self,
        path: impl Into<String>,
        chunk: impl Into<ChunkId>,
        export: impl Into<ExportSelector>,
    ) -> Self {
        self.route(RouteRecord::new(path, RouteDescriptor::deferred(chunk, export)))
    }

    pub fn build(self) -> RouteResult<RouteTable> {
        RouteTable::new(self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_table() -> RouteTable {
        RouteTable::builder()
            .immediate("", ComponentRef::new("Inline"))
            .deferred("dynamic", "dyn-chunk", "default")
            .build()
            .unwrap()
    }

    #[test]
    fn match_immediate_root() {
        let m = sample_table().match_path("").unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(
            m.descriptor,
            RouteDescriptor::immediate(ComponentRef::new("Inline"))
        );
    }

    #[test]
    fn match_deferred() {
        let m = sample_table().match_path("/dynamic").unwrap();
        assert_eq!(m.pattern, "dynamic");
        assert_eq!(m.descriptor.chunk_id().unwrap().as_str(), "dyn-chunk");
    }

    #[test]
    fn no_match_is_none() {
        assert!(sample_table().match_path("missing-path").is_none());
    }

    #[test]
    fn exact_beats_param_beats_wildcard() {
        let table = RouteTable::builder()
            .immediate("**", ComponentRef::new("NotFound"))
            .immediate("users/:id", ComponentRef::new("User"))
            .immediate("users/me", ComponentRef::new("Me"))
            .build()
            .unwrap();

        let name = |path: &str| match table.match_path(path).unwrap().descriptor {
            RouteDescriptor::Immediate { component } => component.name,
            other => panic!("unexpected descriptor {other:?}"),
        };
        assert_eq!(name("users/me"), "Me");
        assert_eq!(name("users/7"), "User");
        assert_eq!(name("elsewhere"), "NotFound");

        let m = table.match_path("users/7").unwrap();
        assert_eq!(m.params.get("id"), Some("7"));
    }

    #[test]
    fn first_entry_wins_among_equal_specificity() {
        let table = RouteTable::builder()
            .immediate("items/:a", ComponentRef::new("First"))
            .immediate("items/:b", ComponentRef::new("Second"))
            .build()
            .unwrap();
        assert_eq!(table.match_path("items/1").unwrap().index, 0);
    }

    #[test]
    fn reject_duplicate_patterns() {
        let err = RouteTable::builder()
            .immediate("dynamic", ComponentRef::new("A"))
            .deferred("/dynamic/", "dyn-chunk", "default")
            .build()
            .unwrap_err();
        assert!(matches!(err, RouteError::DuplicatePattern { .. }));
    }

    #[test]
    fn reject_empty_chunk_id() {
        let err = RouteTable::builder()
            .deferred("lazy", "", "default")
            .build()
            .unwrap_err();
        assert!(matches!(err, RouteError::EmptyChunkId { .. }));
    }

    #[test]
    fn reject_empty_export() {
        let err = RouteTable::builder()
            .deferred("lazy", "chunk", ExportSelector::Named(String::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, RouteError::EmptyExport { .. }));
    }

    #[test]
    fn reject_invalid_pattern() {
        let err = RouteTable::builder()
            .immediate("a/**/b", ComponentRef::new("A"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { .. }));
    }

    #[test]
    fn reject_query_and_fragment_in_pattern() {
        for bad in ["search?q", "a#b", "docs/:page?"] {
            let err = RouteTable::builder()
                .immediate(bad, ComponentRef::new("Unreachable"))
                .build()
                .unwrap_err();
            assert!(
                matches!(err, RouteError::InvalidPattern { .. }),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn chunk_ids_are_distinct_and_ordered() {
        let table = RouteTable::builder()
            .deferred("b", "chunk-b", "default")
            .immediate("", ComponentRef::new("Inline"))
            .deferred("a", "chunk-a", "default")
            .deferred("b2", "chunk-b", "Other")
            .build()
            .unwrap();
        assert_eq!(
            table.chunk_ids(),
            vec![ChunkId::new("chunk-b"), ChunkId::new("chunk-a")]
        );
    }

    #[test]
    fn table_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RouteTable>();
    }

    proptest! {
        #[test]
        fn matching_is_pure(path in "[a-z0-9/:?#*-]{0,24}") {
            let table = RouteTable::builder()
                .immediate("", ComponentRef::new("Inline"))
                .deferred("dynamic", "dyn-chunk", "default")
                .immediate("users/:id", ComponentRef::new("User"))
                .deferred("docs/**", "docs-chunk", "Docs")
                .build()
                .unwrap();
            prop_assert_eq!(table.match_path(&path), table.match_path(&path));
        }

        #[test]
        fn exact_literal_beats_earlier_param(segment in "[a-z0-9-]{1,12}") {
            let table = RouteTable::builder()
                .immediate(":any", ComponentRef::new("Param"))
                .immediate(segment.clone(), ComponentRef::new("Exact"))
                .build()
                .unwrap();
            let m = table.match_path(&segment).unwrap();
            prop_assert_eq!(m.index, 1);
        }
    }
}
