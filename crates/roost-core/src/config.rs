//! Configuration loading and typed config structures for the Roost simulation.
//!
//! The canonical configuration lives in `roost-config.yaml` in the working
//! directory. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads and validates the file.
//! Every field has a default, so an empty file (or no file at all) gives
//! the reference behaviour: 100 pigeons in a 1920x1080 world.

use std::path::Path;
use std::time::Duration;

use roost_agents::AgentConfig;
use roost_types::WorldBounds;
use serde::Deserialize;
use tracing::warn;

/// Environment variable overriding `world.seed`.
pub const SEED_ENV: &str = "ROOST_SEED";

/// Environment variable overriding `population.pigeon_count`.
pub const PIGEON_COUNT_ENV: &str = "ROOST_PIGEON_COUNT";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but cannot drive a simulation.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `roost-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World size and random seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Flock size and speed range.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Per-pigeon perception, movement and scheduling.
    #[serde(default)]
    pub agents: AgentConfig,

    /// Food ageing.
    #[serde(default)]
    pub food: FoodConfig,

    /// Periodic scare events.
    #[serde(default)]
    pub scare: ScareConfig,

    /// Tick pacing and run limits.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Frame output selection.
    #[serde(default)]
    pub renderer: RendererConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `ROOST_SEED` overrides `world.seed`
    /// - `ROOST_PIGEON_COUNT` overrides `population.pigeon_count`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load from `path` if it exists, otherwise start from the defaults.
    ///
    /// Environment overrides apply in both cases.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file) when the file exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override values from the process environment when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override values from an arbitrary key lookup.
    ///
    /// Values that do not parse are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(SEED_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => self.world.seed = Some(seed),
                Err(e) => warn!(var = SEED_ENV, value = %raw, error = %e, "ignoring override"),
            }
        }
        if let Some(raw) = lookup(PIGEON_COUNT_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(count) => self.population.pigeon_count = count,
                Err(e) => {
                    warn!(var = PIGEON_COUNT_ENV, value = %raw, error = %e, "ignoring override");
                }
            }
        }
    }

    /// Check that the configuration can drive a simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("world.width", self.world.width),
            ("world.height", self.world.height),
            ("scare.radius", self.scare.radius),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{name} must be a positive number, got {value}")));
            }
        }

        let pop = &self.population;
        if !(pop.min_speed.is_finite() && pop.min_speed >= 0.0) {
            return Err(invalid(format!(
                "population.min_speed must be non-negative, got {}",
                pop.min_speed
            )));
        }
        if !(pop.max_speed.is_finite() && pop.max_speed >= pop.min_speed) {
            return Err(invalid(format!(
                "population.max_speed ({}) must be at least min_speed ({})",
                pop.max_speed, pop.min_speed
            )));
        }

        if self.scare.interval_secs == 0 {
            return Err(invalid("scare.interval_secs must be at least 1".to_owned()));
        }
        if self.simulation.tick_interval_ms == 0 {
            return Err(invalid("simulation.tick_interval_ms must be at least 1".to_owned()));
        }

        self.agents.validate().map_err(|e| invalid(e.to_string()))
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// World width in world units.
    #[serde(default = "default_width")]
    pub width: f32,

    /// World height in world units.
    #[serde(default = "default_height")]
    pub height: f32,

    /// Random seed for reproducible placement and scares.
    ///
    /// `None` draws a seed from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl WorldConfig {
    /// The world rectangle.
    pub const fn bounds(&self) -> WorldBounds {
        WorldBounds::new(self.width, self.height)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            seed: None,
        }
    }
}

/// Population configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Number of pigeons created at startup.
    #[serde(default = "default_pigeon_count")]
    pub pigeon_count: usize,

    /// Lower bound of the per-pigeon speed draw.
    #[serde(default = "default_min_speed")]
    pub min_speed: f32,

    /// Upper bound of the per-pigeon speed draw.
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            pigeon_count: default_pigeon_count(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
        }
    }
}

/// Food configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FoodConfig {
    /// Age after which food is stale and ignored by pigeons.
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
}

impl FoodConfig {
    /// Staleness threshold as a [`Duration`].
    pub const fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            stale_after_ms: default_stale_after_ms(),
        }
    }
}

/// Scare event configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScareConfig {
    /// Seconds between scare events.
    #[serde(default = "default_scare_interval_secs")]
    pub interval_secs: u64,

    /// Pigeons within this distance of the epicenter are scared (inclusive).
    #[serde(default = "default_scare_radius")]
    pub radius: f32,

    /// How long the renderer shows the scare circle.
    #[serde(default = "default_indicator_secs")]
    pub indicator_secs: u64,
}

impl ScareConfig {
    /// Time between scares.
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// How long a scare stays visible.
    pub const fn indicator(&self) -> Duration {
        Duration::from_secs(self.indicator_secs)
    }
}

impl Default for ScareConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_scare_interval_secs(),
            radius: default_scare_radius(),
            indicator_secs: default_indicator_secs(),
        }
    }
}

/// Simulation boundary configuration.
///
/// A value of 0 for either `max_ticks` or `max_real_time_seconds` means
/// unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Real-time milliseconds per coordinator tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Maximum number of ticks before the simulation ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the simulation ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
            max_real_time_seconds: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// The log renderer prints a summary every N frames.
    #[serde(default = "default_frame_log_every")]
    pub frame_log_every: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            frame_log_every: default_frame_log_every(),
        }
    }
}

/// How frames are presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Periodic summary lines through `tracing`.
    #[default]
    Log,
    /// One JSON document per frame on stdout.
    Json,
    /// No frame output.
    None,
}

/// Renderer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RendererConfig {
    /// Output mode.
    #[serde(default)]
    pub mode: RenderMode,
}

const fn default_width() -> f32 {
    1920.0
}

const fn default_height() -> f32 {
    1080.0
}

const fn default_pigeon_count() -> usize {
    100
}

const fn default_min_speed() -> f32 {
    2.0
}

const fn default_max_speed() -> f32 {
    4.0
}

const fn default_stale_after_ms() -> u64 {
    5000
}

const fn default_scare_interval_secs() -> u64 {
    10
}

const fn default_scare_radius() -> f32 {
    200.0
}

const fn default_indicator_secs() -> u64 {
    5
}

const fn default_tick_interval_ms() -> u64 {
    16
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_frame_log_every() -> u64 {
    60
}
