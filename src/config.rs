use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const ENV_ROOT: &str = "INDEXSET_ROOT";
pub const ENV_USER_BASED: &str = "INDEXSET_USER_BASED";
pub const ENV_EMIT_DIRS: &str = "INDEXSET_EMIT_DIRS";
pub const ENV_LIST_CACHE_TTL_MS: &str = "INDEXSET_LIST_CACHE_TTL_MS";

/// Settings for an index set and the filesystem client backing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Root folder holding one directory per index table.
    pub root: PathBuf,
    /// Fixed for the lifetime of the index set built from this config.
    pub user_based_index: bool,
    /// List intermediate directories as files in per-tenant listings, the way
    /// hierarchical-namespace object stores do.
    pub emit_directory_entries: bool,
    /// How long a listing stays cached; 0 disables the cache.
    pub list_cache_ttl_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("index"),
            user_based_index: false,
            emit_directory_entries: false,
            list_cache_ttl_ms: 60_000,
        }
    }
}

/// Partial settings; `Some` values win over the layer underneath.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StorageOverrides {
    pub root: Option<PathBuf>,
    pub user_based_index: Option<bool>,
    pub emit_directory_entries: Option<bool>,
    pub list_cache_ttl_ms: Option<u64>,
}

impl StorageOverrides {
    /// Read overrides from `INDEXSET_*` environment variables. Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub(crate) fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        Self {
            root: lookup(ENV_ROOT).filter(|s| !s.is_empty()).map(PathBuf::from),
            user_based_index: lookup(ENV_USER_BASED).as_deref().and_then(parse_bool),
            emit_directory_entries: lookup(ENV_EMIT_DIRS).as_deref().and_then(parse_bool),
            list_cache_ttl_ms: lookup(ENV_LIST_CACHE_TTL_MS).and_then(|s| s.trim().parse::<u64>().ok()),
        }
    }
}

impl StorageConfig {
    /// Defaults overlaid with the environment.
    pub fn from_env() -> Self {
        Self::from_layers(&Self::default(), &StorageOverrides::from_env())
    }

    /// Build an effective config from a base layer plus overrides.
    pub fn from_layers(base: &StorageConfig, ov: &StorageOverrides) -> Self {
        Self {
            root: ov.root.clone().unwrap_or_else(|| base.root.clone()),
            user_based_index: ov.user_based_index.unwrap_or(base.user_based_index),
            emit_directory_entries: ov.emit_directory_entries.unwrap_or(base.emit_directory_entries),
            list_cache_ttl_ms: ov.list_cache_ttl_ms.unwrap_or(base.list_cache_ttl_ms),
        }
    }
}

/// Accepts 1/true/yes/on and 0/false/no/off, case-insensitive.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
