//! TOML route configuration.
//!
//! ```toml
//! [[routes]]
//! path = ""
//! kind = "immediate"
//! component = { name = "InlineComponent" }
//!
//! [[routes]]
//! path = "dynamic"
//! kind = "deferred"
//! chunk = "dyn-chunk"
//! export = "default"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::RouteRecord;
use crate::error::{RouteError, RouteResult};
use crate::table::RouteTable;

/// Route configuration as provided by application setup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    #[serde(default)]
    pub routes: Vec<RouteRecord>,
}

impl RouteConfig {
    pub fn from_toml_str(text: &str) -> RouteResult<Self> {
        toml::from_str(text).map_err(|e| RouteError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> RouteResult<String> {
        toml::to_string(self).map_err(|e| RouteError::Config(e.to_string()))
    }

    /// Read a configuration file.
    pub fn load(path: &Path) -> RouteResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate the records and build the table.
    pub fn into_table(self) -> RouteResult<RouteTable> {
        RouteTable::new(self.routes)
    }
}
