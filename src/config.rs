//! Store configuration
//!
//! Loaded from a TOML file; every section is optional and falls back to the
//! defaults below.
//!
//! ```toml
//! [store]
//! path = "data/drugbank.db"
//!
//! [source]
//! xml_path = "data/full_database.xml"
//!
//! [ingest]
//! batch_size = 5000
//!
//! [matcher.synonyms]
//! advil = "ibuprofen"
//! ```

use crate::error::{Error, Result};
use crate::ingest::DRUGBANK_NAMESPACE;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub source: SourceConfig,
    pub ingest: IngestConfig,
    pub matcher: MatcherConfig,
    pub cache: CacheConfig,
}

/// Where the store file lives
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/drugbank.db"),
        }
    }
}

/// The XML dump to ingest
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub xml_path: PathBuf,
    /// Namespace of the top-level drug elements
    pub namespace: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            xml_path: PathBuf::from("data/full_database.xml"),
            namespace: DRUGBANK_NAMESPACE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Records per committed transaction
    pub batch_size: usize,
    /// Log a progress line every N parsed records
    pub progress_every: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 5000,
            progress_every: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Extra colloquial/brand -> chemical stem entries, merged over the built-ins
    pub synonyms: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 7 * 24 * 60 * 60,
            capacity: 4096,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::load_from_str(&content)
    }

    /// Load configuration from string
    pub fn load_from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.ingest.batch_size == 0 {
            return Err(Error::config("ingest.batch_size must be at least 1"));
        }
        if self.ingest.progress_every == 0 {
            return Err(Error::config("ingest.progress_every must be at least 1"));
        }
        if self.source.namespace.trim().is_empty() {
            return Err(Error::config("source.namespace cannot be empty"));
        }
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(Error::config(
                "cache.capacity must be at least 1 when the cache is enabled",
            ));
        }
        for (term, stem) in &self.matcher.synonyms {
            if term.trim().is_empty() || stem.trim().is_empty() {
                return Err(Error::config(format!(
                    "matcher.synonyms entry '{term}' = '{stem}' must not be blank"
                )));
            }
        }
        Ok(())
    }
}
