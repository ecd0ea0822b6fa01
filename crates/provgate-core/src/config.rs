//! Gate configuration
//!
//! Loaded from TOML. Every section is optional:
//!
//! ```toml
//! [server]
//! id = "srv-1"
//! name = "mbox1.example.com"
//! services = ["mailbox", "proxy"]
//!
//! [locale]
//! supported = ["en_US", "de_DE"]
//! escape_prefix = "x-"
//!
//! [logging]
//! profile = "production"
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::errors::{ProvError, Result};
use crate::logging_facility::Profile;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    pub server: ServerConfig,
    pub locale: LocaleConfig,
    pub logging: LoggingConfig,
}

/// Identity of the server this process runs as
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub id: String,
    pub name: String,
    pub services: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            id: "local".to_string(),
            name: "localhost".to_string(),
            services: vec!["mailbox".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocaleConfig {
    pub supported: Vec<String>,
    pub escape_prefix: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            supported: ["en_US", "en_GB", "de_DE", "fr_FR", "es_ES", "ja_JP", "zh_CN"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            escape_prefix: "x-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub profile: Profile,
}

impl GateConfig {
    /// # Errors
    ///
    /// `Config` on malformed TOML or unknown keys.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// # Errors
    ///
    /// `Config` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ProvError::Config {
            message: format!("cannot read config {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }
}
