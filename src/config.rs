//! Repository configuration.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Tunables passed to [`crate::AddressRepository::open`].
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Maximum number of per-parent partitions held open in memory
    pub partition_cache_capacity: usize,

    /// Minimum reclaimable share of a store's on-disk size, in percent,
    /// before `optimize` rewrites it. Zero always rewrites.
    pub compaction_budget: u32,

    /// Run `optimize` as part of `close`
    pub optimize_on_close: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            partition_cache_capacity: 100,
            compaction_budget: 10,
            optimize_on_close: false,
        }
    }
}

impl RepositoryConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: RepositoryConfig = toml::from_str(content)?;
        Ok(config.sanitized())
    }

    /// A zero-capacity cache cannot hold the partition being resolved
    fn sanitized(mut self) -> Self {
        if self.partition_cache_capacity == 0 {
            self.partition_cache_capacity = 1;
        }
        self
    }
}
