use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chunk::ChunkId;
use crate::component::{ComponentRef, ExportSelector, DEFAULT_EXPORT};

/// Result of a successful chunk load: the chunk's exported symbols.
///
/// Handles are immutable once produced by a transport. The registry shares a
/// single handle between all requesters of the same chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleHandle {
    chunk_id: ChunkId,
    exports: BTreeMap<String, ComponentRef>,
}

impl ModuleHandle {
    /// Create a handle with no exports.
    pub fn new(chunk_id: impl Into<ChunkId>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            exports: BTreeMap::new(),
        }
    }

    /// Create a handle from a prepared export table.
    pub fn from_exports(
        chunk_id: impl Into<ChunkId>,
        exports: BTreeMap<String, ComponentRef>,
    ) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            exports,
        }
    }

    /// Add (or replace) a named export.
    pub fn with_export(mut self, symbol: impl Into<String>, component: ComponentRef) -> Self {
        self.exports.insert(symbol.into(), component);
        self
    }

    /// Add (or replace) the default export.
    pub fn with_default(self, component: ComponentRef) -> Self {
        self.with_export(DEFAULT_EXPORT, component)
    }

    pub fn chunk_id(&self) -> &ChunkId {
        &self.chunk_id
    }

    /// Look up the symbol named by `selector`.
    pub fn export(&self, selector: &ExportSelector) -> Option<&ComponentRef> {
        self.exports.get(selector.symbol())
    }

    /// Exported symbol names in sorted order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> ModuleHandle {
        ModuleHandle::new("dyn-chunk")
            .with_default(ComponentRef::new("DynamicComponent"))
            .with_export("Settings", ComponentRef::new("SettingsComponent"))
    }

    #[test]
    fn default_and_named_lookup() {
        let h = handle();
        assert_eq!(
            h.export(&ExportSelector::Default).unwrap().name,
            "DynamicComponent"
        );
        assert_eq!(
            h.export(&ExportSelector::named("Settings")).unwrap().name,
            "SettingsComponent"
        );
        assert!(h.export(&ExportSelector::named("Missing")).is_none());
    }

    #[test]
    fn symbols_sorted() {
        let h = handle();
        let symbols: Vec<&str> = h.symbols().collect();
        assert_eq!(symbols, vec!["Settings", "default"]);
    }

    #[test]
    fn empty_handle() {
        let h = ModuleHandle::new("empty");
        assert!(h.is_empty());
        assert!(h.export(&ExportSelector::Default).is_none());
        assert_eq!(h.chunk_id().as_str(), "empty");
    }
}
