//! Allocator configuration
//!
//! Settings come from built-in defaults, an optional TOML file, and
//! `PAIRCACHE_*` environment variables, in increasing order of precedence.
//!
//! ```toml
//! max_pairs = 256
//! trace_lists = false
//! ```

use crate::error::{Error, Result};
use crate::pairs::{CapacitySource, MAX_PAIR_LIMIT};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Default number of pair slots, sentinel included
pub const DEFAULT_MAX_PAIRS: usize = 256;

/// Pair cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairCacheConfig {
    /// Number of pair slots the terminal supports, sentinel included
    pub max_pairs: usize,
    /// Log the recency list after every scripted operation
    pub trace_lists: bool,
}

impl Default for PairCacheConfig {
    fn default() -> Self {
        Self {
            max_pairs: DEFAULT_MAX_PAIRS,
            trace_lists: false,
        }
    }
}

impl PairCacheConfig {
    /// Load configuration, layering the environment over `path` if given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("max_pairs", DEFAULT_MAX_PAIRS as i64)
            .and_then(|b| b.set_default("trace_lists", false))
            .map_err(|e| Error::Config(format!("Invalid defaults: {}", e)))?;

        if let Some(path) = path {
            debug!(path = ?path, "Reading configuration file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let config: Self = builder
            .add_source(Environment::with_prefix("PAIRCACHE").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::Config(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string, without the environment
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| Error::Config(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the pair limit is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_pairs == 0 || self.max_pairs > MAX_PAIR_LIMIT {
            return Err(Error::Config(format!(
                "max_pairs must be in 1..={}, got {}",
                MAX_PAIR_LIMIT, self.max_pairs
            )));
        }
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to render configuration: {}", e)))
    }
}

impl CapacitySource for PairCacheConfig {
    fn pair_limit(&self) -> usize {
        self.max_pairs
    }
}
