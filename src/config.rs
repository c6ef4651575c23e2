//! Viewer configuration module.
//!
//! Handles loading, validating, and merging `config.toml` files. Stock
//! defaults are overridden by whatever keys the user file sets; everything
//! else keeps its default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resolver]
//! bucket = "regular"          # Size bucket requested when none is given
//! srcset_floor = "thumbnail"  # Smallest bucket emitted into srcsets
//!
//! [resolver.widths]           # Nominal pixel width of each bucket (w descriptor)
//! thumbnail = 200
//! small = 400
//! regular = 1080
//! original = 2400
//!
//! [loader]
//! warm_cache_capacity = 64    # Decoded sources remembered for instant re-open
//!
//! [orientation]
//! square_tolerance = 0.05     # |h/w - 1| below this is "square"
//!
//! [zoom]
//! min_zoom = 1.0
//! max_zoom = 5.0
//! step_factor = 1.5           # Multiplier for zoom in/out buttons
//! double_click_zoom = 2.0
//! wheel_sensitivity = 0.002   # Zoom exponent per wheel delta unit
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [zoom]
//! max_zoom = 8.0
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::SizeBucket;
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
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Viewer configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Variant negotiation settings.
    pub resolver: ResolverConfig,
    /// Progressive loader settings.
    pub loader: LoaderConfig,
    /// Orientation classification settings.
    pub orientation: OrientationConfig,
    /// Zoom/pan engine limits and steps.
    pub zoom: ZoomConfig,
}

impl ViewerConfig {
    /// Validate config values are within acceptable ranges.
    ///
    /// Comparisons are written negated so NaN fails every check.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zoom = &self.zoom;
        if !(zoom.min_zoom >= 1.0) {
            return Err(ConfigError::Validation("zoom.min_zoom must be >= 1".into()));
        }
        if !(zoom.max_zoom >= zoom.min_zoom) || !zoom.max_zoom.is_finite() {
            return Err(ConfigError::Validation(
                "zoom.max_zoom must be finite and >= zoom.min_zoom".into(),
            ));
        }
        if !(zoom.step_factor > 1.0) {
            return Err(ConfigError::Validation(
                "zoom.step_factor must be greater than 1".into(),
            ));
        }
        if !(zoom.double_click_zoom >= zoom.min_zoom && zoom.double_click_zoom <= zoom.max_zoom) {
            return Err(ConfigError::Validation(
                "zoom.double_click_zoom must lie within [min_zoom, max_zoom]".into(),
            ));
        }
        if !(zoom.wheel_sensitivity > 0.0) {
            return Err(ConfigError::Validation(
                "zoom.wheel_sensitivity must be positive".into(),
            ));
        }
        let tolerance = self.orientation.square_tolerance;
        if !(0.0..1.0).contains(&tolerance) {
            return Err(ConfigError::Validation(
                "orientation.square_tolerance must be in [0, 1)".into(),
            ));
        }
        if self.loader.warm_cache_capacity == 0 {
            return Err(ConfigError::Validation(
                "loader.warm_cache_capacity must be non-zero".into(),
            ));
        }
        let widths = &self.resolver.widths;
        let ordered = SizeBucket::ALL
            .windows(2)
            .all(|pair| widths.get(pair[0]) < widths.get(pair[1]));
        if widths.thumbnail == 0 || !ordered {
            return Err(ConfigError::Validation(
                "resolver.widths must be non-zero and strictly increasing".into(),
            ));
        }
        Ok(())
    }
}

/// Variant negotiation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Bucket requested when the caller gives no size hint.
    pub bucket: SizeBucket,
    /// Smallest bucket emitted into responsive candidate lists.
    pub srcset_floor: SizeBucket,
    /// Nominal width of each bucket, used as the `w` descriptor.
    pub widths: BucketWidths,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            bucket: SizeBucket::Regular,
            srcset_floor: SizeBucket::Thumbnail,
            widths: BucketWidths::default(),
        }
    }
}

/// Nominal pixel width per size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BucketWidths {
    pub thumbnail: u32,
    pub small: u32,
    pub regular: u32,
    pub original: u32,
}

impl BucketWidths {
    pub fn get(&self, bucket: SizeBucket) -> u32 {
        match bucket {
            SizeBucket::Thumbnail => self.thumbnail,
            SizeBucket::Small => self.small,
            SizeBucket::Regular => self.regular,
            SizeBucket::Original => self.original,
        }
    }
}

impl Default for BucketWidths {
    fn default() -> Self {
        Self {
            thumbnail: 200,
            small: 400,
            regular: 1080,
            original: 2400,
        }
    }
}

/// Progressive loader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// How many decoded sources the warm cache remembers.
    pub warm_cache_capacity: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            warm_cache_capacity: 64,
        }
    }
}

/// Orientation classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrientationConfig {
    /// Relative band around 1:1 treated as square.
    pub square_tolerance: f64,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            square_tolerance: 0.05,
        }
    }
}

/// Zoom/pan engine limits and steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZoomConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplier applied by a single zoom-in/zoom-out step.
    pub step_factor: f64,
    /// Zoom level a double-click toggles to.
    pub double_click_zoom: f64,
    /// Exponent per unit of wheel delta: `zoom * exp(-delta * sensitivity)`.
    pub wheel_sensitivity: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_zoom: 1.0,
            max_zoom: 5.0,
            step_factor: 1.5,
            double_click_zoom: 2.0,
            wheel_sensitivity: 0.002,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ViewerConfig::default())?)
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

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ViewerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ViewerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// A missing file yields the stock defaults.
pub fn load_config(dir: &Path) -> Result<ViewerConfig, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Lighttable Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Source negotiation
# ---------------------------------------------------------------------------
[resolver]
# Size bucket requested when the host gives no size hint.
# One of: thumbnail, small, regular, original.
bucket = "regular"

# Smallest bucket emitted into responsive srcset candidate lists.
srcset_floor = "thumbnail"

# Nominal pixel width of each bucket, emitted as the srcset `w` descriptor.
# Must be strictly increasing.
[resolver.widths]
thumbnail = 200
small = 400
regular = 1080
original = 2400

# ---------------------------------------------------------------------------
# Progressive loading
# ---------------------------------------------------------------------------
[loader]
# Decoded sources remembered so re-opening a recent image skips the blur-up.
warm_cache_capacity = 64

# ---------------------------------------------------------------------------
# Orientation classification
# ---------------------------------------------------------------------------
[orientation]
# Images with |height/width - 1| below this are classified as square.
square_tolerance = 0.05

# ---------------------------------------------------------------------------
# Zoom / pan
# ---------------------------------------------------------------------------
[zoom]
min_zoom = 1.0
max_zoom = 5.0

# Multiplier applied by a single zoom-in or zoom-out step.
step_factor = 1.5

# Zoom level a double-click toggles to (and back from).
double_click_zoom = 2.0

# Wheel zoom is zoom * exp(-delta * wheel_sensitivity).
wheel_sensitivity = 0.002
"##
}
