//! Emoticon configuration module.
//!
//! Handles loading, validating, and merging an `emoticons.toml` file. The
//! stock defaults describe the bundled catalog layout; a user file overrides
//! only the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [catalog]
//! dir = "emoticons"          # Catalog root inside the asset provider
//! source_group = "source"    # Group whose entries fill the default pages
//! config_name = "emoji.xml"  # Catalog document under `dir`
//! page_size = 20             # Entries per default page
//!
//! [cache]
//! max_entries = 1024         # Per-cache capacity, counted in entries
//!
//! [stickers]
//! # path = "/data/stickers"  # Default: <files dir>/sticker
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! The configuration is read once. The [`Builder`](crate::manager::Builder)
//! copies it into the resolver it builds, and nothing mutates it afterwards.

use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory name appended to the files directory when no explicit sticker
/// path is configured.
pub const STICKER_DIR_NAME: &str = "sticker";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Missing required context: {0}")]
    MissingContext(&'static str),
    #[error("Emoticons are already initialized; configuration can only be applied once")]
    AlreadyInitialized,
}

/// Emoticon configuration loaded from `emoticons.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmoticonConfig {
    /// Where the catalog lives and how its default pages are laid out.
    pub catalog: CatalogConfig,
    /// Resource cache sizing.
    pub cache: CacheConfig,
    /// Downloaded sticker location.
    pub stickers: StickerConfig,
}

impl EmoticonConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalog.dir must not be empty".into(),
            ));
        }
        if self.catalog.config_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalog.config_name must not be empty".into(),
            ));
        }
        if self.catalog.page_size == 0 {
            return Err(ConfigError::Validation(
                "catalog.page_size must be greater than zero".into(),
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Validation(
                "cache.max_entries must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Catalog layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Catalog root directory inside the asset provider.
    pub dir: String,
    /// Title of the group whose entries populate the default pages.
    pub source_group: String,
    /// File name of the catalog document, relative to `dir`.
    pub config_name: String,
    /// Number of entries per default page.
    pub page_size: usize,
}

impl CatalogConfig {
    /// Asset path of the catalog document.
    pub fn document_path(&self) -> String {
        format!("{}/{}", self.dir, self.config_name)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            dir: "emoticons".to_string(),
            source_group: "source".to_string(),
            config_name: "emoji.xml".to_string(),
            page_size: 20,
        }
    }
}

/// Resource cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of live entries in each of the static and animated caches.
    pub max_entries: usize,
}

impl CacheConfig {
    /// Capacity as the non-zero count the caches are built with.
    pub fn capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.max_entries).ok_or_else(|| {
            ConfigError::Validation("cache.max_entries must be greater than zero".into())
        })
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 1024 }
    }
}

/// Sticker storage settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StickerConfig {
    /// Explicit sticker directory. When absent, `<files dir>/sticker` is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StickerConfig {
    /// Resolve the effective sticker directory.
    ///
    /// - explicit `path` wins
    /// - otherwise `<files_dir>/sticker` when the caller supplied a files directory
    /// - otherwise `<platform data dir>/emoticons/sticker`
    pub fn resolve_path(&self, files_dir: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        if let Some(dir) = files_dir {
            return Ok(dir.join(STICKER_DIR_NAME));
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("emoticons").join(STICKER_DIR_NAME))
            .ok_or(ConfigError::MissingContext(
                "no sticker path configured and no files directory available",
            ))
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EmoticonConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EmoticonConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EmoticonConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<EmoticonConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `emoticons.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Emoticon Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Catalog
# ---------------------------------------------------------------------------
[catalog]
# Catalog root directory inside the asset provider.
dir = "emoticons"

# Group (<Catalog Title="...">) whose entries fill the default pages.
source_group = "source"

# Catalog document, relative to `dir`.
config_name = "emoji.xml"

# Entries per default page. The last page is padded with blanks.
page_size = 20

# ---------------------------------------------------------------------------
# Resource caches
# ---------------------------------------------------------------------------
[cache]
# Maximum live entries in each cache (static and animated are sized alike).
max_entries = 1024

# ---------------------------------------------------------------------------
# Stickers
# ---------------------------------------------------------------------------
[stickers]
# Directory holding downloaded stickers.
# Omit to use <files dir>/sticker.
# path = "/data/stickers"
"##
}
