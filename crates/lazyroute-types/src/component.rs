//! Component descriptors and export selection.
//!
//! Component registration metadata (name, selector, template) is plain data
//! consumed by the renderer. The core never interprets it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Symbol under which a module's default export is stored.
pub const DEFAULT_EXPORT: &str = "default";

/// A renderable component, as handed to the render collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRef {
    /// Component name (e.g. "DynamicComponent").
    pub name: String,
    /// Element selector the renderer binds the component to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Inline template, if the component carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl ComponentRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: None,
            template: None,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Some(selector) => write!(f, "{} <{}>", self.name, selector),
            None => f.write_str(&self.name),
        }
    }
}

/// Names which exported symbol of a loaded module a route renders.
///
/// Serialized as a bare string: `"default"` selects the default export, any
/// other string names an export.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExportSelector {
    #[default]
    Default,
    Named(String),
}

impl ExportSelector {
    pub fn named(symbol: impl Into<String>) -> Self {
        Self::from(symbol.into())
    }

    /// The symbol looked up in the module's export table.
    pub fn symbol(&self) -> &str {
        match self {
            Self::Default => DEFAULT_EXPORT,
            Self::Named(name) => name,
        }
    }
}

impl From<String> for ExportSelector {
    fn from(s: String) -> Self {
        if s == DEFAULT_EXPORT {
            Self::Default
        } else {
            Self::Named(s)
        }
    }
}

impl From<&str> for ExportSelector {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ExportSelector> for String {
    fn from(selector: ExportSelector) -> Self {
        match selector {
            ExportSelector::Default => DEFAULT_EXPORT.to_string(),
            ExportSelector::Named(name) => name,
        }
    }
}

impl fmt::Display for ExportSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
