//! Build configuration.
//!
//! An optional `config.toml` in the project root overrides the stock
//! defaults. The file is sparse: specify only what differs.
//!
//! ```toml
//! [paths]
//! source = "content"                    # Source tree (contains authors/)
//! output = "public"                     # Generated tree, wiped on every build
//! languages = "content/languages.json"  # Hand-maintained language registry
//!
//! [catalog]
//! schema_version = "1.0"                # Written to metadata/index.json
//!
//! [compat]
//! default_content_type = "poem"         # Used when metadata.json has no `type`; "" disables
//!
//! [processing]
//! max_processes = 4                     # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Loading works in three steps: the defaults are serialized to a TOML
//! table, the user file is merged on top key by key, and the merged table is
//! deserialized with unknown keys rejected and then validated.

use crate::types::ContentType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the project root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub paths: PathsConfig,
    pub catalog: CatalogConfig,
    pub compat: CompatConfig,
    pub processing: ProcessingConfig,
}

impl BuildConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.source.trim().is_empty() || self.paths.output.trim().is_empty() {
            return Err(ConfigError::Validation(
                "paths.source and paths.output must not be empty".into(),
            ));
        }
        if self.paths.source == self.paths.output {
            return Err(ConfigError::Validation(
                "paths.output must differ from paths.source".into(),
            ));
        }
        if self.catalog.schema_version.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalog.schema_version must not be empty".into(),
            ));
        }
        let fallback = &self.compat.default_content_type;
        if !fallback.is_empty() && fallback.parse::<ContentType>().is_err() {
            return Err(ConfigError::Validation(format!(
                "compat.default_content_type must be \"poem\", \"prose\" or \"\", got {fallback:?}"
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Source tree, resolved against the project root.
    pub fn source_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.source)
    }

    /// Generated tree, resolved against the project root.
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.output)
    }

    /// Language registry, resolved against the project root.
    pub fn languages_file(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.languages)
    }
}

/// Where the pipeline reads and writes, relative to the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub source: String,
    pub output: String,
    pub languages: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: "content".to_string(),
            output: "public".to_string(),
            languages: "content/languages.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Value of the `version` field in the catalog index.
    pub schema_version: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            schema_version: "1.0".to_string(),
        }
    }
}

/// Compatibility shims for older source data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompatConfig {
    /// Content type assumed for work descriptors without a `type` field.
    /// Empty string disables the fallback.
    pub default_content_type: String,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            default_content_type: "poem".to_string(),
        }
    }
}

impl CompatConfig {
    /// The fallback content type, or `None` when disabled.
    pub fn fallback_content_type(&self) -> Option<ContentType> {
        self.default_content_type.parse().ok()
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// The stock defaults as a TOML table, the base layer for merging.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(BuildConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
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

/// Load and validate the config for a project root.
///
/// A missing `config.toml` yields the stock defaults.
pub fn load_config(root: &Path) -> Result<BuildConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let path = root.join(CONFIG_FILENAME);
    let merged = if path.exists() {
        let content = fs::read_to_string(&path)?;
        let overlay: toml::Value = toml::from_str(&content)?;
        merge_toml(base, overlay)
    } else {
        base
    };
    let config: BuildConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// A fully commented stock `config.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r#"# lit-catalog configuration
# ========================
# Every key is optional. Remove what you don't change.

[paths]
# Source tree. Must contain authors/<author>/info.json,
# authors/<author>/works/<work>/metadata.json and one <lang>.md per translation.
source = "content"
# Generated tree. Deleted and rebuilt on every `build`.
output = "public"
# Hand-maintained language registry, copied to <output>/metadata/languages.json.
languages = "content/languages.json"

[catalog]
# Written as `version` in <output>/metadata/index.json.
schema_version = "1.0"

[compat]
# Content type assumed when a work's metadata.json has no `type`.
# Set to "" to treat a missing type as an error instead.
default_content_type = "poem"

[processing]
# Maximum parallel workers. Omit to use every CPU core.
# max_processes = 4
"#
}
