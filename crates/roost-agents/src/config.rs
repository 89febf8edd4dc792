//! Tunables for pigeon behaviour.
//!
//! [`AgentConfig`] is deserialized from the `agents` section of
//! `roost-config.yaml`; every field has a default so a partial section (or
//! none at all) is valid.

use std::time::Duration;

use serde::Deserialize;

use crate::error::AgentError;

/// Configuration for pigeon perception, movement and scheduling.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    /// Maximum distance at which food can be perceived (default: 700).
    #[serde(default = "default_vision_radius")]
    pub vision_radius: f32,

    /// Food closer than this is eaten instead of approached (default: 5).
    ///
    /// The comparison is strict: food at exactly this distance is still
    /// approached.
    #[serde(default = "default_capture_distance")]
    pub capture_distance: f32,

    /// Two pigeons closer than this are crowding each other (default: 20).
    #[serde(default = "default_crowding_distance")]
    pub crowding_distance: f32,

    /// Scare timer value set by a scare, in time-units (default: 5.0).
    #[serde(default = "default_scare_duration")]
    pub scare_duration: f32,

    /// Amount the scare timer drops per flee cycle (default: 0.1).
    #[serde(default = "default_flee_step")]
    pub flee_step: f32,

    /// Flee speed as a multiple of the pigeon's own speed (default: 2.0).
    #[serde(default = "default_flee_speed_multiplier")]
    pub flee_speed_multiplier: f32,

    /// Pause between behaviour cycles in milliseconds (default: 100).
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,

    /// Pause after an idle cycle while asleep, in milliseconds (default: 500).
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            vision_radius: default_vision_radius(),
            capture_distance: default_capture_distance(),
            crowding_distance: default_crowding_distance(),
            scare_duration: default_scare_duration(),
            flee_step: default_flee_step(),
            flee_speed_multiplier: default_flee_speed_multiplier(),
            cycle_interval_ms: default_cycle_interval_ms(),
            idle_interval_ms: default_idle_interval_ms(),
        }
    }
}

impl AgentConfig {
    /// Pause between active cycles.
    pub const fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    /// Pause after an idle (asleep) cycle.
    pub const fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    /// Check that every value can drive a working state machine.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), AgentError> {
        let positive = [
            ("vision_radius", self.vision_radius),
            ("capture_distance", self.capture_distance),
            ("crowding_distance", self.crowding_distance),
            ("scare_duration", self.scare_duration),
            ("flee_step", self.flee_step),
            ("flee_speed_multiplier", self.flee_speed_multiplier),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AgentError::InvalidConfig {
                    reason: format!("agents.{name} must be a positive number, got {value}"),
                });
            }
        }
        if self.cycle_interval_ms == 0 {
            return Err(AgentError::InvalidConfig {
                reason: "agents.cycle_interval_ms must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

const fn default_vision_radius() -> f32 {
    700.0
}

const fn default_capture_distance() -> f32 {
    5.0
}

const fn default_crowding_distance() -> f32 {
    20.0
}

const fn default_scare_duration() -> f32 {
    5.0
}

const fn default_flee_step() -> f32 {
    0.1
}

const fn default_flee_speed_multiplier() -> f32 {
    2.0
}

const fn default_cycle_interval_ms() -> u64 {
    100
}

const fn default_idle_interval_ms() -> u64 {
    500
}
