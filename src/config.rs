//! Catalog configuration.
//!
//! Configuration is a TOML file:
//!
//! ```toml
//! index_name = "snippets"
//! default_limit = 10
//! write_mode = "best_effort"   # or "strict"
//! synonyms_path = "/etc/snippet-catalog/synonyms.json"
//!
//! [backend]
//! url = "http://localhost:9200"
//! username = "admin"
//! password = "admin"
//! timeout_secs = 10
//! ```
//!
//! Every field is optional. Lookup order is an explicit path, then
//! `<config dir>/snippet-catalog/config.toml`, then built-in defaults.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:9200";
pub const DEFAULT_INDEX_NAME: &str = "snippets";
pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How [`crate::store::SnippetStore::save`] writes documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Plain index write. Uniqueness of `$id` relies on the caller's
    /// existence check.
    #[default]
    BestEffort,
    /// Create-if-absent keyed by `$id`. A concurrent duplicate is rejected
    /// by the backend.
    Strict,
}

/// Connection settings for the search backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
            username: None,
            password: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub backend: BackendConfig,
    pub index_name: String,
    /// Page size used when a search asks for limit 0.
    pub default_limit: usize,
    pub synonyms_path: Option<PathBuf>,
    pub write_mode: WriteMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            default_limit: DEFAULT_LIMIT,
            synonyms_path: None,
            write_mode: WriteMode::default(),
        }
    }
}

impl Config {
    /// Default location of the config file, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("snippet-catalog").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// read when present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Read and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML config text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_limit == 0 {
            bail!("default_limit must be greater than 0");
        }
        if self.index_name.trim().is_empty() {
            bail!("index_name must not be empty");
        }
        if self.backend.timeout_secs == 0 {
            bail!("backend.timeout_secs must be greater than 0");
        }
        Ok(())
    }
}
