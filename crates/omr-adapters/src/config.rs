//! Configuration file support for omr.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/omr/config.toml` (lowest priority)
//! - Project-local: `.omr.toml` (searched up directory tree)
//!
//! Every field is optional; anything unset keeps the engine default.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use omr_core::{EngineConfig, OmrEngine};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::fs::FsDebugStorage;

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = ".omr.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Input image limits.
    pub image: ImageConfig,
    /// Binarization settings.
    pub binarize: BinarizeConfig,
    /// Grid search settings.
    pub locator: LocatorConfig,
    /// Grid-line suppression settings.
    pub suppressor: SuppressorConfig,
    /// Cell measurement settings.
    pub cells: CellsConfig,
    /// Verdict thresholds.
    pub classifier: ClassifierConfig,
    /// Diagnostic image settings.
    pub debug: DebugConfig,
}

/// Input image configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Minimum accepted width in pixels.
    pub min_width: Option<u32>,
    /// Minimum accepted height in pixels.
    pub min_height: Option<u32>,
}

/// Binarization configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BinarizeConfig {
    /// Noise-suppression blur sigma.
    pub blur_sigma: Option<f32>,
    /// Local-mean window sigma.
    pub block_sigma: Option<f32>,
    /// Darkness margin below the local mean.
    pub offset: Option<i16>,
}

/// Grid search configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Minimum contour area as a fraction of the image (0.0-1.0).
    pub min_area_ratio: Option<f64>,
    /// Polygon approximation tolerance as a fraction of perimeter.
    pub poly_epsilon: Option<f64>,
    /// Side length divisor for the rule-line element.
    pub score_kernel_divisor: Option<u32>,
}

/// Grid-line suppression configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SuppressorConfig {
    /// Side length divisor for the line element.
    pub kernel_divisor: Option<u32>,
    /// Opening iterations.
    pub iterations: Option<u32>,
}

/// Cell measurement configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CellsConfig {
    /// Fraction of each cell trimmed per side.
    pub inset_ratio: Option<f64>,
}

/// Verdict threshold configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Marked when best density exceeds the mean times this.
    pub marked_ratio: Option<f64>,
    /// Multiple when runner-up over best exceeds this (0.0-1.0).
    pub multiple_ratio: Option<f64>,
    /// Low confidence below this (0.0-1.0).
    pub low_confidence: Option<f64>,
    /// Absolute minimum best density (0.0-1.0).
    pub min_mark_density: Option<f64>,
}

/// Diagnostic image configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Attach filesystem storage for diagnostic images.
    pub enabled: Option<bool>,
    /// Directory for diagnostic images, [`default_debug_dir`] when unset.
    pub dir: Option<PathBuf>,
    /// Delete diagnostic images older than this many hours.
    pub retention_hours: Option<u64>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/omr/config.toml`
    /// 2. Project-local: `.omr.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    #[must_use]
    pub fn load() -> Self {
        let cwd = std::env::current_dir().ok();
        Self::load_layered(xdg_config_path().as_deref(), cwd.as_deref())
    }

    /// Load from an explicit XDG path and a project search start directory.
    #[must_use]
    pub fn load_layered(xdg_path: Option<&Path>, search_from: Option<&Path>) -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_path {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = search_from.and_then(find_config_in_parents) {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            warn!("Invalid configuration: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first out-of-range field.
    pub fn validate(&self) -> Result<(), String> {
        let unit_fields = [
            ("locator.min_area_ratio", self.locator.min_area_ratio),
            ("locator.poly_epsilon", self.locator.poly_epsilon),
            ("classifier.multiple_ratio", self.classifier.multiple_ratio),
            ("classifier.low_confidence", self.classifier.low_confidence),
            ("classifier.min_mark_density", self.classifier.min_mark_density),
        ];
        for (name, value) in unit_fields {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(format!("{name} must be 0.0-1.0, got {v}"));
                }
            }
        }

        if let Some(r) = self.cells.inset_ratio {
            if !(0.0..0.5).contains(&r) {
                return Err(format!("cells.inset_ratio must be 0.0-0.5, got {r}"));
            }
        }
        if let Some(r) = self.classifier.marked_ratio {
            if r < 1.0 {
                return Err(format!("classifier.marked_ratio must be >= 1.0, got {r}"));
            }
        }

        for (name, value) in [
            ("binarize.blur_sigma", self.binarize.blur_sigma),
            ("binarize.block_sigma", self.binarize.block_sigma),
        ] {
            if let Some(s) = value {
                if s <= 0.0 {
                    return Err(format!("{name} must be positive, got {s}"));
                }
            }
        }

        for (name, value) in [
            ("image.min_width", self.image.min_width),
            ("image.min_height", self.image.min_height),
            ("locator.score_kernel_divisor", self.locator.score_kernel_divisor),
            ("suppressor.kernel_divisor", self.suppressor.kernel_divisor),
            ("suppressor.iterations", self.suppressor.iterations),
        ] {
            if value == Some(0) {
                return Err(format!("{name} must be greater than 0"));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    pub fn merge(&mut self, other: Self) {
        // Image
        self.image.min_width = other.image.min_width.or(self.image.min_width);
        self.image.min_height = other.image.min_height.or(self.image.min_height);

        // Binarize
        self.binarize.blur_sigma = other.binarize.blur_sigma.or(self.binarize.blur_sigma);
        self.binarize.block_sigma = other.binarize.block_sigma.or(self.binarize.block_sigma);
        self.binarize.offset = other.binarize.offset.or(self.binarize.offset);

        // Locator
        self.locator.min_area_ratio = other
            .locator
            .min_area_ratio
            .or(self.locator.min_area_ratio);
        self.locator.poly_epsilon = other.locator.poly_epsilon.or(self.locator.poly_epsilon);
        self.locator.score_kernel_divisor = other
            .locator
            .score_kernel_divisor
            .or(self.locator.score_kernel_divisor);

        // Suppressor
        self.suppressor.kernel_divisor = other
            .suppressor
            .kernel_divisor
            .or(self.suppressor.kernel_divisor);
        self.suppressor.iterations = other.suppressor.iterations.or(self.suppressor.iterations);

        // Cells
        self.cells.inset_ratio = other.cells.inset_ratio.or(self.cells.inset_ratio);

        // Classifier
        self.classifier.marked_ratio = other
            .classifier
            .marked_ratio
            .or(self.classifier.marked_ratio);
        self.classifier.multiple_ratio = other
            .classifier
            .multiple_ratio
            .or(self.classifier.multiple_ratio);
        self.classifier.low_confidence = other
            .classifier
            .low_confidence
            .or(self.classifier.low_confidence);
        self.classifier.min_mark_density = other
            .classifier
            .min_mark_density
            .or(self.classifier.min_mark_density);

        // Debug
        self.debug.enabled = other.debug.enabled.or(self.debug.enabled);
        self.debug.dir = other.debug.dir.or_else(|| self.debug.dir.take());
        self.debug.retention_hours = other.debug.retention_hours.or(self.debug.retention_hours);
    }

    /// Applies the configured overrides onto the engine defaults.
    #[must_use]
    pub fn to_engine_config(&self) -> EngineConfig {
        let mut engine = EngineConfig::default();

        if let Some(v) = self.image.min_width {
            engine.min_width = v;
        }
        if let Some(v) = self.image.min_height {
            engine.min_height = v;
        }

        if let Some(v) = self.binarize.blur_sigma {
            engine.binarize.blur_sigma = v;
        }
        if let Some(v) = self.binarize.block_sigma {
            engine.binarize.block_sigma = v;
        }
        if let Some(v) = self.binarize.offset {
            engine.binarize.offset = v;
        }

        if let Some(v) = self.locator.min_area_ratio {
            engine.locator.min_area_ratio = v;
        }
        if let Some(v) = self.locator.poly_epsilon {
            engine.locator.poly_epsilon = v;
        }
        if let Some(v) = self.locator.score_kernel_divisor {
            engine.locator.score_kernel_divisor = v;
        }

        if let Some(v) = self.suppressor.kernel_divisor {
            engine.suppressor.kernel_divisor = v;
        }
        if let Some(v) = self.suppressor.iterations {
            engine.suppressor.iterations = v;
        }

        if let Some(v) = self.cells.inset_ratio {
            engine.cells.inset_ratio = v;
        }

        if let Some(v) = self.classifier.marked_ratio {
            engine.classifier.marked_ratio = v;
        }
        if let Some(v) = self.classifier.multiple_ratio {
            engine.classifier.multiple_ratio = v;
        }
        if let Some(v) = self.classifier.low_confidence {
            engine.classifier.low_confidence = v;
        }
        if let Some(v) = self.classifier.min_mark_density {
            engine.classifier.min_mark_density = v;
        }

        engine
    }

    /// Retention window for diagnostic images, if configured.
    #[must_use]
    pub fn debug_retention(&self) -> Option<Duration> {
        self.debug
            .retention_hours
            .map(|h| Duration::from_secs(h.saturating_mul(3600)))
    }

    /// Filesystem storage described by the `[debug]` section.
    ///
    /// Returns `None` unless `enabled` is set. The retention window, if any,
    /// is applied to the storage.
    #[must_use]
    pub fn debug_storage(&self) -> Option<anyhow::Result<FsDebugStorage>> {
        if !self.debug.enabled.unwrap_or(false) {
            return None;
        }

        let dir = self.debug.dir.clone().unwrap_or_else(default_debug_dir);
        info!("Writing diagnostic images to {}", dir.display());
        let storage = FsDebugStorage::new(dir).map(|storage| match self.debug_retention() {
            Some(max_age) => storage.with_retention(max_age),
            None => storage,
        });
        Some(storage)
    }

    /// Builds an engine from this configuration, with diagnostic storage
    /// attached when `[debug]` enables it.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine configuration is invalid or the debug
    /// directory cannot be created.
    pub fn build_engine(&self) -> anyhow::Result<OmrEngine> {
        let engine =
            OmrEngine::new(self.to_engine_config()).context("Invalid engine configuration")?;
        match self.debug_storage() {
            Some(storage) => Ok(engine.with_debug_storage(Arc::new(storage?))),
            None => Ok(engine),
        }
    }
}

/// Diagnostic image directory used when none is configured.
#[must_use]
pub fn default_debug_dir() -> PathBuf {
    std::env::temp_dir().join("omr_debug")
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("omr").join("config.toml"))
}

/// Search for `.omr.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
