//! # Config - engine-wide settings
//!
//! Every setting is controlled via environment variables, read once at
//! startup with sensible defaults:
//!
//! ```text
//! RDB_DATA_ROOT         Directory tables live under      (default: "data")
//! RDB_COMPACTION_RATIO  deleted/total ratio that triggers (default: 0.20)
//!                       an inline compaction after DELETE
//! RDB_PAGE_SIZE         B+ tree page size in bytes        (default: 4096)
//! ```
//!
//! `RDB_PAGE_SIZE` exists for documentation purposes only: the on-disk page
//! layout is fixed at 4096 bytes, so any other value is rejected at load
//! time rather than silently honored.

use std::path::PathBuf;

/// Reads a configuration value from the environment, falling back to
/// `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Directory every table's subdirectory is created under.
    pub data_root: PathBuf,
    /// `deleted_records / total_records` threshold that triggers an inline
    /// compaction after a `DELETE`.
    pub compaction_ratio: f64,
    /// B+ tree page size in bytes. Always 4096; kept as a field so callers
    /// don't need to import `rdb_btree` just to display it.
    pub page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            compaction_ratio: 0.20,
            page_size: 4096,
        }
    }
}

impl EngineConfig {
    /// Builds configuration from environment variables, falling back to
    /// [`EngineConfig::default`] for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let data_root = PathBuf::from(env_or("RDB_DATA_ROOT", &defaults.data_root.to_string_lossy()));
        let compaction_ratio: f64 = env_or("RDB_COMPACTION_RATIO", &defaults.compaction_ratio.to_string())
            .parse()
            .unwrap_or(defaults.compaction_ratio);
        let page_size: usize = env_or("RDB_PAGE_SIZE", &defaults.page_size.to_string())
            .parse()
            .unwrap_or(defaults.page_size);

        if page_size != defaults.page_size {
            eprintln!(
                "warning: RDB_PAGE_SIZE={} ignored, page size is fixed at {} bytes",
                page_size, defaults.page_size
            );
        }

        Self {
            data_root,
            compaction_ratio,
            page_size: defaults.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_the_documented_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.data_root, PathBuf::from("data"));
        assert_eq!(cfg.compaction_ratio, 0.20);
        assert_eq!(cfg.page_size, 4096);
    }
}
