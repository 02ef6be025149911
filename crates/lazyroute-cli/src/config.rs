//! Optional `lazyroute.toml` settings for `lazyroute navigate`.
//!
//! ```toml
//! [transport]
//! root = "dist/chunks"
//! timeout_ms = 5000
//!
//! [navigator]
//! event_capacity = 64
//!
//! [navigator.retry]
//! max_attempts = 3
//! ```

use std::path::Path;

use anyhow::Context;
use lazyroute_loader::FsTransportConfig;
use lazyroute_nav::NavigatorConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub transport: FsTransportConfig,
    pub navigator: NavigatorConfig,
}

impl CliConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn empty_config_is_default() {
        let c = CliConfig::from_toml_str("").unwrap();
        assert_eq!(c.transport.root, PathBuf::from("chunks"));
        assert_eq!(c.transport.timeout, Duration::from_secs(10));
        assert!(!c.navigator.retry.is_enabled());
        assert_eq!(c.navigator.event_capacity, 64);
    }

    #[test]
    fn partial_sections() {
        let c = CliConfig::from_toml_str(
            "[transport]\ntimeout_ms = 250\n\n[navigator.retry]\nmax_attempts = 3\n",
        )
        .unwrap();
        assert_eq!(c.transport.root, PathBuf::from("chunks"));
        assert_eq!(c.transport.timeout, Duration::from_millis(250));
        assert_eq!(c.navigator.retry.max_attempts, 3);
        assert_eq!(c.navigator.event_capacity, 64);
    }

    #[test]
    fn unknown_types_rejected() {
        assert!(CliConfig::from_toml_str("[transport]\ntimeout_ms = \"soon\"\n").is_err());
    }
}
