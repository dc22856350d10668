//! Configuration loading.
//!
//! Configuration is loaded from TOML files with environment variable
//! overrides (`ORRERY_*`).

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config.default.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OrreryConfig {
    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub visual: VisualConfig,

    #[serde(default)]
    pub flow: FlowConfig,

    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    /// Radius of the galaxy sphere.
    #[serde(default = "default_galaxy_radius")]
    pub galaxy_radius: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            galaxy_radius: default_galaxy_radius(),
        }
    }
}

fn default_galaxy_radius() -> f64 {
    600.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisualConfig {
    /// Base amplitude of the vertical float, before glow scaling.
    #[serde(default = "default_float_amplitude")]
    pub float_amplitude: f64,

    /// Per-frame exponential smoothing factor for highlight transitions.
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,

    /// How long a newborn table holds its birth flash.
    #[serde(default = "default_birth_flash_secs")]
    pub birth_flash_secs: f64,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            float_amplitude: default_float_amplitude(),
            smoothing: default_smoothing(),
            birth_flash_secs: default_birth_flash_secs(),
        }
    }
}

fn default_float_amplitude() -> f64 {
    6.0
}

fn default_smoothing() -> f64 {
    0.08
}

fn default_birth_flash_secs() -> f64 {
    1.2
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    /// Particle spawn tick, independent of frame rate.
    #[serde(default = "default_spawn_interval_ms")]
    pub spawn_interval_ms: u64,

    /// Scales source activity x throughput into per-tick progress.
    #[serde(default = "default_velocity_scale")]
    pub velocity_scale: f64,

    #[serde(default = "default_velocity_min")]
    pub velocity_min: f64,

    #[serde(default = "default_velocity_max")]
    pub velocity_max: f64,

    /// Velocity above which a particle reads as high-traffic.
    #[serde(default = "default_high_traffic_threshold")]
    pub high_traffic_threshold: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            spawn_interval_ms: default_spawn_interval_ms(),
            velocity_scale: default_velocity_scale(),
            velocity_min: default_velocity_min(),
            velocity_max: default_velocity_max(),
            high_traffic_threshold: default_high_traffic_threshold(),
        }
    }
}

fn default_spawn_interval_ms() -> u64 {
    100
}

fn default_velocity_scale() -> f64 {
    0.0005
}

fn default_velocity_min() -> f64 {
    0.005
}

fn default_velocity_max() -> f64 {
    0.025
}

fn default_high_traffic_threshold() -> f64 {
    0.018
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_transition_secs")]
    pub transition_secs: f64,

    #[serde(default = "default_home_position")]
    pub home_position: [f64; 3],

    #[serde(default = "default_home_target")]
    pub home_target: [f64; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            transition_secs: default_transition_secs(),
            home_position: default_home_position(),
            home_target: default_home_target(),
        }
    }
}

fn default_transition_secs() -> f64 {
    1.5
}

fn default_home_position() -> [f64; 3] {
    [0.0, 260.0, 1400.0]
}

fn default_home_target() -> [f64; 3] {
    [0.0, 0.0, 0.0]
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: String,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_directory() -> String {
    "output".to_string()
}

fn default_width() -> u32 {
    1600
}

fn default_height() -> u32 {
    1200
}

impl OrreryConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("ORRERY").separator("_"))
            .build()?;

        let orrery_config: OrreryConfig = config.try_deserialize().unwrap_or_default();
        Ok(orrery_config)
    }
}
