//! Loader configuration.
//!
//! [`LoaderConfig`] is the typed option bag one invocation runs with. Every
//! field has a default, so an empty table is a complete configuration.
//! [`ToolConfig`] wraps it with the settings only the CLI needs.
//!
//! ## Config File
//!
//! The CLI reads `responsive-loader.toml` from the working directory (or the
//! file given with `--config`). Values are layered: stock defaults, then the
//! file, then command-line flags.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [loader]
//! name_prefix = "[name]"              # template; ".<width>.<ext>" is appended
//! target_formats = ["jpeg", "webp"]   # encodings produced per width
//! widths = [1280, 640]                # candidate widths (source width always added)
//! emit_file = true                    # register variants as build artifacts
//! # context = "src"                   # base directory for [path]
//! # reg_exp = "(\\w+)/[^/]+$"         # captures available as [1], [2], ...
//!
//! [processing]
//! max_processes = 4                   # Max parallel workers (omit for auto = CPU cores)
//!
//! [module]
//! public_path = "__webpack_public_path__"  # JS expression prefixed to src
//! ```
//!
//! Unknown keys are rejected to catch typos early. `emitFile` and `regExp`
//! are accepted as aliases for `emit_file` and `reg_exp`.

use crate::imaging::TargetFormat;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILENAME: &str = "responsive-loader.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Options for one loader invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Output name template. The loader appends `.<suffix>` to it.
    pub name_prefix: String,
    /// Encodings to produce for every width, in order.
    pub target_formats: Vec<TargetFormat>,
    /// Candidate output widths in pixels.
    pub widths: Vec<u32>,
    /// Register produced variants as build artifacts.
    #[serde(alias = "emitFile")]
    pub emit_file: bool,
    /// Base path for name resolution; the host root when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,
    /// Pattern matched against the resource path for `[N]` tokens.
    #[serde(alias = "regExp", skip_serializing_if = "Option::is_none")]
    pub reg_exp: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            name_prefix: "[name]".to_string(),
            target_formats: vec![TargetFormat::Jpeg, TargetFormat::Webp],
            widths: vec![1280, 640],
            emit_file: true,
            context: None,
            reg_exp: None,
        }
    }
}

impl LoaderConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "name_prefix must not be empty".into(),
            ));
        }
        if self.target_formats.is_empty() {
            return Err(ConfigError::Validation(
                "target_formats must not be empty".into(),
            ));
        }
        for (i, format) in self.target_formats.iter().enumerate() {
            if self.target_formats[..i].contains(format) {
                return Err(ConfigError::Validation(format!(
                    "target_formats lists {} more than once",
                    format
                )));
            }
        }
        if self.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "widths must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Compile `reg_exp`, if set.
    pub fn pattern(&self) -> Result<Option<Regex>, ConfigError> {
        self.reg_exp
            .as_deref()
            .map(|p| {
                Regex::new(p)
                    .map_err(|e| ConfigError::Validation(format!("reg_exp is invalid: {}", e)))
            })
            .transpose()
    }
}

/// Everything the CLI reads from a config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub loader: LoaderConfig,
    pub processing: ProcessingConfig,
    pub module: ModuleConfig,
}

impl ToolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.loader.validate()?;
        self.loader.pattern()?;
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel encode workers.
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

/// Settings for the generated descriptor module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleConfig {
    /// JavaScript expression prefixed to every `src` in module output.
    pub public_path: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            public_path: "__webpack_public_path__".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
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
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// `[loader]` keys accepted under their camelCase spelling.
const LOADER_KEY_ALIASES: &[(&str, &str)] = &[("emitFile", "emit_file"), ("regExp", "reg_exp")];

/// Rename aliased `[loader]` keys to their field names so that layers
/// using different spellings merge into the same key.
pub fn canonicalize_aliases(mut value: toml::Value) -> toml::Value {
    if let Some(loader) = value.get_mut("loader").and_then(|l| l.as_table_mut()) {
        for (alias, field) in LOADER_KEY_ALIASES {
            if let Some(v) = loader.remove(*alias) {
                loader.insert((*field).to_string(), v);
            }
        }
    }
    value
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<ToolConfig, ConfigError> {
    let merged = overlays
        .into_iter()
        .map(canonicalize_aliases)
        .fold(canonicalize_aliases(base), merge_toml);
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path` on top of stock defaults.
///
/// A missing file yields the defaults; unknown keys and invalid values are errors.
pub fn load_config(path: &Path) -> Result<ToolConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# responsive-loader configuration
# ===============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Variant generation
# ---------------------------------------------------------------------------
[loader]
# Output name template. The loader appends ".<width>.<ext>" for variants,
# ".<ext>" for SVG/unrecognized files and ".placeholder.png" for the
# placeholder. Tokens: [name] [ext] [path] [folder] [hash] [hash:N]
# [contenthash] [<sha256|sha512>:hash:<hex|base64>:N] and [1], [2], ...
name_prefix = "[name]"

# Encodings produced for every width: "jpeg", "webp", "png".
# The first "jpeg" entry (or else the first entry) is the default type.
target_formats = ["jpeg", "webp"]

# Candidate widths in pixels. Widths not smaller than the source are
# dropped; the source width itself is always produced.
widths = [1280, 640]

# Write variants as build artifacts. Set to false to only compute names.
emit_file = true

# Base directory for [path]. Defaults to the build root.
# context = "src"

# Pattern matched against the asset path; captures fill [1], [2], ...
# reg_exp = "(\\w+)/[^/]+$"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel encode workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Descriptor module output
# ---------------------------------------------------------------------------
[module]
# JavaScript expression prefixed to every src in generated modules.
public_path = "__webpack_public_path__"
"##
}
