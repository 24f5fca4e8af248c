//! Kit configuration loading.
//!
//! The configuration file is a small TOML document:
//!
//! ```toml
//! kits_enabled = true
//!
//! [[kit]]
//! name = "STONE"
//! count = 5
//! ```
//!
//! When `kits_enabled` is false (or absent) the `kit` list is never looked
//! at, so a disabled configuration always yields an empty item list.

use crate::catalog::ItemCatalog;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default configuration written on first run.
pub const DEFAULT_CONFIG: &str = include_str!("../assets/default_kits.toml");

/// A single kit entry: an item type and a stack size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitItem {
    pub name: String,
    pub count: u32,
}

impl KitItem {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// In-memory kit definition parsed from the configuration file.
///
/// Immutable once built; a reload constructs a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KitDefinition {
    enabled: bool,
    items: Vec<KitItem>,
}

#[derive(Debug, Deserialize)]
struct RawKitConfig {
    #[serde(default)]
    kits_enabled: bool,
    #[serde(default)]
    kit: Option<toml::Value>,
}

#[derive(Debug, Deserialize)]
struct RawKitEntry {
    name: Option<String>,
    count: Option<i64>,
}

impl KitDefinition {
    /// Definition with kits switched off.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Items in configuration order, with unresolvable entries removed.
    pub fn items(&self) -> &[KitItem] {
        &self.items
    }

    /// Loads the definition from `path`.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Missing`] if there is no file at `path`
    /// * [`ConfigError::Io`] if the file cannot be read
    /// * [`ConfigError::Malformed`] / [`ConfigError::InvalidEntry`] if parsing fails
    pub fn load(path: impl AsRef<Path>, catalog: &ItemCatalog) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let definition = Self::parse(&content, catalog)?;
        info!(
            "Loaded kit configuration from {} (enabled: {}, items: {})",
            path.display(),
            definition.enabled,
            definition.items.len()
        );
        Ok(definition)
    }

    /// Copies the bundled default into place if needed, then loads `path`.
    pub fn load_or_bootstrap(
        path: impl AsRef<Path>,
        catalog: &ItemCatalog,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        ensure_default_config(path)?;
        Self::load(path, catalog)
    }

    /// Parses a configuration document.
    ///
    /// Entries naming an item the catalog does not know are skipped with a
    /// warning; the rest of the kit is kept.
    pub fn parse(content: &str, catalog: &ItemCatalog) -> Result<Self, ConfigError> {
        let raw: RawKitConfig = toml::from_str(content)?;

        if !raw.kits_enabled {
            return Ok(Self::disabled());
        }

        let entries: Vec<RawKitEntry> = match raw.kit {
            Some(value) => value.try_into::<Vec<RawKitEntry>>()?,
            None => Vec::new(),
        };

        let mut items = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let name = entry.name.ok_or_else(|| ConfigError::InvalidEntry {
                index,
                reason: "missing `name`".to_string(),
            })?;
            let count = entry.count.ok_or_else(|| ConfigError::InvalidEntry {
                index,
                reason: format!("missing `count` for {name}"),
            })?;
            let count = u32::try_from(count)
                .ok()
                .filter(|count| *count > 0)
                .ok_or_else(|| ConfigError::InvalidEntry {
                    index,
                    reason: format!("count for {name} must be a positive integer, got {count}"),
                })?;

            match catalog.resolve(&name) {
                Some(resolved) => items.push(KitItem::new(resolved, count)),
                None => warn!(item = %name, "Invalid item name in kit: {}", name),
            }
        }

        debug!("Parsed kit with {} valid item(s)", items.len());
        Ok(Self {
            enabled: true,
            items,
        })
    }
}

/// Writes the bundled default configuration to `path` if no file exists.
///
/// Returns `true` when a new file was written.
pub fn ensure_default_config(path: impl AsRef<Path>) -> Result<bool, ConfigError> {
    let path = path.as_ref();
    if path.is_file() {
        return Ok(false);
    }

    std::fs::write(path, DEFAULT_CONFIG).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Created default kit configuration: {}", path.display());
    Ok(true)
}
