//! Configuration loading and management

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hand::{ClassifierParams, ClassifierStrategy};
use crate::mapping::FretScheme;
use crate::state::{ControlParams, FistRule};

/// Wrist movement, in pixels, that counts as a volume gesture
const WRIST_TREND_PIXELS: f32 = 20.0;

/// Capture height the pixel threshold was tuned at
const DEFAULT_FRAME_HEIGHT: f32 = 480.0;

/// Invalid configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown {kind}: {value:?}")]
    UnknownOption { kind: &'static str, value: String },

    #[error("{var} must be a positive number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("invalid {var}: {source}")]
    Variable {
        var: &'static str,
        #[source]
        source: Box<ConfigError>,
    },
}

/// Tunables for the per-frame pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub classifier_strategy: ClassifierStrategy,
    pub classifier: ClassifierParams,
    /// Frames in each side's smoothing window
    pub smoothing_window: usize,
    /// Raw extended count that overrides an all-flexed vote
    pub fallback_min_extended: usize,
    pub fret_scheme: FretScheme,
    /// Mean landmark y below this is the upper fret zone
    pub zone_split: f32,
    pub control: ControlParams,
    /// Minimum `y_min` movement between frames for a strum
    pub strum_threshold: f32,
    /// Effect played on every strum
    pub strum_effect: String,
    pub strum_effect_volume: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classifier_strategy: ClassifierStrategy::Projection,
            classifier: ClassifierParams::default(),
            smoothing_window: 5,
            fallback_min_extended: 2,
            fret_scheme: FretScheme::Standard,
            zone_split: 0.5,
            control: ControlParams::default(),
            strum_threshold: 0.05,
            strum_effect: "pick_noise".to_string(),
            strum_effect_volume: 0.3,
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Root of the guitar sample tree
    pub samples_dir: PathBuf,

    /// JSON-lines frame file to replay at startup
    pub replay: Option<PathBuf>,

    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = match lookup("AIR_GUITAR_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = lookup("HOME").context("HOME is not set")?;
                PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join("air-guitar")
            }
        };

        let socket_path = lookup("AIR_GUITAR_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        let samples_dir = lookup("AIR_GUITAR_SAMPLES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("guitar_samples"));

        let replay = lookup("AIR_GUITAR_REPLAY")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let mut pipeline = PipelineConfig::default();
        if let Some(strategy) = parse_var(&lookup, "AIR_GUITAR_CLASSIFIER")? {
            pipeline.classifier_strategy = strategy;
        }
        if let Some(scheme) = parse_var(&lookup, "AIR_GUITAR_FRET_SCHEME")? {
            pipeline.fret_scheme = scheme;
        }
        if let Some(rule) = parse_var::<FistRule>(&lookup, "AIR_GUITAR_FIST_RULE")? {
            pipeline.control.fist_rule = rule;
        }
        let frame_height = match lookup("AIR_GUITAR_FRAME_HEIGHT") {
            Some(value) => parse_height(&value)?,
            None => DEFAULT_FRAME_HEIGHT,
        };
        pipeline.control.trend_threshold = WRIST_TREND_PIXELS / frame_height;

        Ok(Self {
            socket_path,
            data_dir,
            samples_dir,
            replay,
            pipeline,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr<Err = ConfigError>,
{
    lookup(var)
        .map(|value| {
            value.parse().map_err(|source| ConfigError::Variable {
                var,
                source: Box::new(source),
            })
        })
        .transpose()
}

fn parse_height(value: &str) -> Result<f32, ConfigError> {
    let invalid = || ConfigError::InvalidNumber {
        var: "AIR_GUITAR_FRAME_HEIGHT",
        value: value.to_string(),
    };
    let height: f32 = value.trim().parse().map_err(|_| invalid())?;
    if !height.is_finite() || height <= 0.0 {
        return Err(invalid());
    }
    Ok(height)
}
