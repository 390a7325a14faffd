use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{StoreError, StoreResult};

/// Default number of entries in a read-through cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 2048;

const ENV_DATA_DIR: &str = "FOLIO_DATA_DIR";
const ENV_SYNC_WRITES: &str = "FOLIO_SYNC_WRITES";
const ENV_CACHE_DEFAULT: &str = "FOLIO_CACHE_MAX_ENTRIES";
const ENV_CACHE_SUFFIX: &str = "_CACHE_MAX_ENTRIES";

/// Store configuration.
///
/// Layered as defaults, then an optional TOML file, then the environment:
///
/// - `FOLIO_DATA_DIR` -- root directory for table files
/// - `FOLIO_SYNC_WRITES` -- `true`/`false`, fsync rewritten tables
/// - `FOLIO_CACHE_MAX_ENTRIES` -- default cache capacity
/// - `<TYPENAME>_CACHE_MAX_ENTRIES` -- capacity for one entity type,
///   e.g. `BOOK_CACHE_MAX_ENTRIES`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one `<TypeName>.csv` file per entity type.
    pub data_dir: PathBuf,
    /// Fsync each rewritten table before it replaces the original.
    pub sync_writes: bool,
    pub cache: CacheConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            sync_writes: true,
            cache: CacheConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Defaults pointed at a specific directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Defaults, overlaid with `path` (if given), overlaid with the process
    /// environment.
    pub fn load(path: Option<&Path>) -> StoreResult<Self> {
        let base = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    StoreError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        Ok(base.with_env_vars(std::env::vars()))
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env_vars(std::env::vars())
    }

    /// Overlay environment-style `(key, value)` pairs.
    ///
    /// Unparsable or non-positive values are logged and ignored.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            match key {
                ENV_DATA_DIR if !value.is_empty() => self.data_dir = PathBuf::from(value),
                ENV_SYNC_WRITES => match value.to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" => self.sync_writes = true,
                    "0" | "false" | "no" => self.sync_writes = false,
                    _ => warn!(key, value, "ignoring unrecognized boolean"),
                },
                ENV_CACHE_DEFAULT => {
                    if let Some(n) = parse_capacity(key, value) {
                        self.cache.default_capacity = n;
                    }
                }
                _ => {
                    let Some(type_name) = key.strip_suffix(ENV_CACHE_SUFFIX) else {
                        continue;
                    };
                    if type_name.is_empty() {
                        continue;
                    }
                    if let Some(n) = parse_capacity(key, value) {
                        self.cache.capacities.insert(type_name.to_ascii_lowercase(), n);
                    }
                }
            }
        }
        self
    }
}

/// Read-through cache sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Capacity for entity types without an explicit entry.
    pub default_capacity: usize,
    /// Per entity type capacity, keyed by lower-cased type name.
    pub capacities: BTreeMap<String, usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_CACHE_CAPACITY,
            capacities: BTreeMap::new(),
        }
    }
}

impl CacheConfig {
    /// Capacity for an entity type. Zero entries fall back to the default,
    /// and a zero default falls back to [`DEFAULT_CACHE_CAPACITY`].
    pub fn capacity_for(&self, type_name: &str) -> NonZeroUsize {
        self.capacities
            .get(&type_name.to_ascii_lowercase())
            .copied()
            .and_then(NonZeroUsize::new)
            .or_else(|| NonZeroUsize::new(self.default_capacity))
            .unwrap_or(NonZeroUsize::MIN.saturating_add(DEFAULT_CACHE_CAPACITY - 1))
    }
}

fn parse_capacity(key: &str, value: &str) -> Option<usize> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!(key, value, "ignoring invalid cache capacity");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.data_dir, PathBuf::from("./data"));
        assert!(c.sync_writes);
        assert_eq!(c.cache.default_capacity, 2048);
        assert_eq!(c.cache.capacity_for("Book").get(), 2048);
    }

    #[test]
    fn toml_overrides_and_keeps_defaults() {
        let c = StoreConfig::from_toml_str(
            r#"
            data_dir = "/var/lib/folio"

            [cache]
            default_capacity = 64

            [cache.capacities]
            book = 10
            "#,
        )
        .unwrap();
        assert_eq!(c.data_dir, PathBuf::from("/var/lib/folio"));
        assert!(c.sync_writes);
        assert_eq!(c.cache.capacity_for("Book").get(), 10);
        assert_eq!(c.cache.capacity_for("User").get(), 64);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = StoreConfig::from_toml_str("data_dir = [").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn env_vars_overlay() {
        let c = StoreConfig::default().with_env_vars([
            ("FOLIO_DATA_DIR", "/tmp/folio"),
            ("FOLIO_SYNC_WRITES", "false"),
            ("FOLIO_CACHE_MAX_ENTRIES", "100"),
            ("BOOK_CACHE_MAX_ENTRIES", "5"),
            ("PATH", "/usr/bin"),
        ]);
        assert_eq!(c.data_dir, PathBuf::from("/tmp/folio"));
        assert!(!c.sync_writes);
        assert_eq!(c.cache.capacity_for("Book").get(), 5);
        assert_eq!(c.cache.capacity_for("SentimentCache").get(), 100);
    }

    #[test]
    fn invalid_capacities_fall_back() {
        let c = StoreConfig::default().with_env_vars([
            ("BOOK_CACHE_MAX_ENTRIES", "-3"),
            ("USER_CACHE_MAX_ENTRIES", "lots"),
            ("FOLIO_CACHE_MAX_ENTRIES", "0"),
        ]);
        assert_eq!(c.cache.capacity_for("Book").get(), 2048);
        assert_eq!(c.cache.capacity_for("User").get(), 2048);

        let zero = CacheConfig {
            default_capacity: 0,
            capacities: BTreeMap::from([("book".to_string(), 0)]),
        };
        assert_eq!(zero.capacity_for("Book").get(), DEFAULT_CACHE_CAPACITY);
    }
}
