//! Configuration for the demo front end.
//!
//! Values come from an optional TOML file; CLI flags are applied on top by
//! the command layer.
//!
//! ```toml
//! [pipeline]
//! strategy = "sequential"
//! filter = "random"
//!
//! [simulator]
//! steps = 20
//! step_interval_ms = 1000
//!
//! [assets]
//! dir = "assets"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::Strategy;
use crate::core::source::DEFAULT_BUNDLED_COUNT;
use crate::utils::{AppError, AppResult, validate_config};

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub simulator: SimulatorConfig,
    pub assets: AssetsConfig,
}

/// Processing pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub strategy: Strategy,
    /// Filter name, or "random" to pick per image
    pub filter: String,
    /// Upper bound on concurrently running filters in the parallel strategy.
    /// Unbounded when absent.
    pub max_parallel: Option<usize>,
}

/// Progress simulator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub enabled: bool,
    pub steps: usize,
    pub step_interval_ms: u64,
}

/// Bundled asset and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub dir: PathBuf,
    /// How many `ImageN` names to look up
    pub count: usize,
    /// Where processed images are written, if anywhere
    pub output_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Parallel,
            filter: "invert".to_string(),
            max_parallel: None,
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            steps: 20,
            step_interval_ms: 1000,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            count: DEFAULT_BUNDLED_COUNT,
            output_dir: None,
        }
    }
}

impl SimulatorConfig {
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

impl AppConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| AppError::config(format!("Invalid config: {e}")))?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        info!("Loading config: {}", path.display());
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }
}
