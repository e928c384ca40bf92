//! Tool configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user file passed with `--config` overrides any subset of
//! keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [grid]
//! margin = 150              # Top margin above the first row band
//! gap = 150                 # Gap between cells, both axes
//!
//! [[grid.bands]]            # One entry per run of same-sized rows
//! rows = 5
//! cols = 7
//! cell_size = 500
//! margin = 150              # Left margin of this band
//! # index_stride = 10       # Cell numbering multiplier (default: cols)
//! # y_offset = 2100         # Absolute top of the band (default: after previous band)
//!
//! [detection]
//! threshold = 0.99          # Transparent fraction above which a cell is empty
//!
//! [variants]
//! emote = [[128, 128], [112, 112], [56, 56], [28, 28]]
//! badge = [[128, 128], [72, 72], [36, 36], [18, 18]]   # Badge, Badge Bit, Flair
//!
//! [output]
//! filter = "catmull-rom"    # nearest | triangle | catmull-rom | gaussian | lanczos3
//! compression = "default"   # fast | default | best
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::detect::DEFAULT_THRESHOLD;
use crate::grid::{GridError, GridSpec};
use crate::imaging::{PngCompression, RenderConfig, Resampling};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config validation error: {0}")]
    Grid(#[from] GridError),
}

/// Tool configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Sheet layout.
    pub grid: GridSpec,
    /// Emptiness classifier settings.
    pub detection: DetectionConfig,
    /// Size ladders per category family.
    pub variants: VariantsConfig,
    /// Resampling and encoding.
    pub output: OutputConfig,
    /// Parallel rendering settings.
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;

        let threshold = self.detection.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Validation(
                "detection.threshold must be between 0 and 1".into(),
            ));
        }

        let max_size = self.grid.min_cell_size().unwrap_or(0);
        for (key, ladder) in [
            ("variants.emote", &self.variants.emote),
            ("variants.badge", &self.variants.badge),
        ] {
            if ladder.is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
            for &[w, h] in ladder {
                if w == 0 || h == 0 {
                    return Err(ConfigError::Validation(format!(
                        "{key} sizes must be non-zero"
                    )));
                }
                if w > max_size || h > max_size {
                    return Err(ConfigError::Validation(format!(
                        "{key} size {w}x{h} exceeds the smallest cell ({max_size}px)"
                    )));
                }
            }
        }

        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Renderer settings derived from this config.
    pub fn render_config(&self) -> RenderConfig {
        let pairs = |ladder: &[[u32; 2]]| ladder.iter().map(|&[w, h]| (w, h)).collect();
        RenderConfig {
            emote_sizes: pairs(&self.variants.emote),
            badge_sizes: pairs(&self.variants.badge),
            filter: self.output.filter,
            compression: self.output.compression,
        }
    }
}

/// Emptiness classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionConfig {
    /// A cell whose fully transparent fraction is above this is empty.
    pub threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Size ladders. The largest entry of each is exported as `DiscordSize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantsConfig {
    /// Sizes for emotes.
    pub emote: Vec<[u32; 2]>,
    /// Sizes for badges, badge bits and flairs.
    pub badge: Vec<[u32; 2]>,
}

impl Default for VariantsConfig {
    fn default() -> Self {
        Self {
            emote: vec![[128, 128], [112, 112], [56, 56], [28, 28]],
            badge: vec![[128, 128], [72, 72], [36, 36], [18, 18]],
        }
    }
}

/// Resampling and PNG encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub filter: Resampling,
    pub compression: PngCompression,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
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

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (arrays included) replace base values entirely.
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
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, or stock defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Emote Slicer Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Sheet layout
# ---------------------------------------------------------------------------
[grid]
# Top margin above the first row band, in pixels.
margin = 150

# Gap between neighbouring cells, horizontally and vertically.
gap = 150

# One [[grid.bands]] entry per run of rows sharing a cell size.
# Cells are numbered row * index_stride + col + 1 (row is global, zero-based).
[[grid.bands]]
rows = 5
cols = 7
cell_size = 500
margin = 150
# index_stride = 7        # defaults to cols
# y_offset = 150          # defaults to directly below the previous band

# A sheet whose last two rows hold ten 300px cells would add:
# [[grid.bands]]
# rows = 2
# cols = 10
# cell_size = 300
# margin = 150
# index_stride = 10

# ---------------------------------------------------------------------------
# Detection
# ---------------------------------------------------------------------------
[detection]
# A cell is empty when more than this fraction of its pixels is fully
# transparent. Sheets without an alpha channel never have empty cells.
threshold = 0.99

# ---------------------------------------------------------------------------
# Variant sizes as [width, height]. The largest entry is named DiscordSize.
# ---------------------------------------------------------------------------
[variants]
emote = [[128, 128], [112, 112], [56, 56], [28, 28]]
# Used for Badge, Badge Bit and Flair.
badge = [[128, 128], [72, 72], [36, 36], [18, 18]]

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# Resize filter: nearest | triangle | catmull-rom | gaussian | lanczos3
filter = "catmull-rom"

# PNG deflate effort: fast | default | best
compression = "default"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel render workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
