//! Engine configuration.
//!
//! Loaded from a TOML file layered over stock defaults: a user file only
//! needs the keys it wants to change, and unknown keys are rejected so typos
//! fail loudly instead of being silently ignored.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [coordinator]
//! timeout_ms = 30000        # Per-variant generation bound; 0 disables it
//!
//! [density]
//! base = 72                 # DPI of a 1x rasterisation of scalable sources
//! step = 300                # DPI is snapped up to a multiple of this
//! max = 1200                # DPI ceiling
//!
//! [processing]
//! # max_workers = 4         # Prefetch pool size; omitted = all cores
//! concurrent_transforms = 4 # Backend calls allowed to run at once
//!
//! [transformers.raster]
//! enabled = true
//! priority = 10             # Lower runs first within a capability tier
//! quality = 85              # Lossy encode quality (1-100)
//!
//! [logging]
//! filter = "info"           # tracing EnvFilter directive; RUST_LOG wins
//! ```

use crate::variant::DensityPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Engine configuration loaded from TOML.
///
/// All fields have defaults; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub coordinator: CoordinatorConfig,
    /// Rasterisation density for scalable sources.
    pub density: DensityPolicy,
    pub processing: ProcessingConfig,
    pub transformers: TransformersConfig,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.density.base == 0 || self.density.step == 0 {
            return Err(ConfigError::Validation(
                "density.base and density.step must be non-zero".into(),
            ));
        }
        if self.density.max < self.density.base {
            return Err(ConfigError::Validation(
                "density.max must be at least density.base".into(),
            ));
        }
        if self.processing.concurrent_transforms == 0 {
            return Err(ConfigError::Validation(
                "processing.concurrent_transforms must be at least 1".into(),
            ));
        }
        if self.processing.max_workers == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_workers must be at least 1".into(),
            ));
        }
        let quality = self.transformers.raster.quality;
        if !(1..=100).contains(&quality) {
            return Err(ConfigError::Validation(
                "transformers.raster.quality must be 1-100".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    pub timeout_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

impl CoordinatorConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Prefetch worker count. When absent, defaults to the number of CPU
    /// cores. Values larger than the core count are clamped down.
    pub max_workers: Option<usize>,
    pub concurrent_transforms: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            concurrent_transforms: 4,
        }
    }
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_workers.map(|n| n.min(cores)).unwrap_or(cores)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformersConfig {
    pub raster: RasterConfig,
}

/// Settings for the in-process [`RasterTransformer`](crate::transform::RasterTransformer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RasterConfig {
    pub enabled: bool,
    pub priority: i32,
    pub quality: u32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 10,
            quality: 85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(EngineConfig::default())?)
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

/// Read a config file as a raw TOML value.
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

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EngineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EngineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path` over stock defaults.
///
/// A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(path)?)
}

/// Returns a fully-commented stock config file with all keys and explanations.
pub fn stock_config_toml() -> &'static str {
    r#"# Variant Engine Configuration
# ============================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

[coordinator]
# Upper bound on generating one variant, in milliseconds. Callers waiting on
# the same variant share the timeout. 0 disables it.
timeout_ms = 30000

[density]
# Scalable sources (SVG, EPS, PDF) are rasterised at base * multiplier DPI,
# snapped up to a multiple of `step` and capped at `max`.
base = 72
step = 300
max = 1200

[processing]
# Workers used to prefetch batches of variants. Omit to use all cores.
# max_workers = 4
# Backend calls allowed to run at once across the whole engine.
concurrent_transforms = 4

[transformers.raster]
# In-process JPEG/PNG/GIF/TIFF/WebP backend.
enabled = true
# Lower runs first among backends of the same capability.
priority = 10
# Lossy encoding quality (1-100).
quality = 85

[logging]
# tracing EnvFilter directive. RUST_LOG overrides it when set.
filter = "info"
"#
}
