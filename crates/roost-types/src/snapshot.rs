//! Read-only frame snapshots handed to renderers.
//!
//! A [`FrameSnapshot`] is assembled once per coordinator tick. It is a
//! plain copy of positions and flags: holding one never keeps a lock on
//! the pool or on any pigeon.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::PigeonMode;
use crate::geometry::Position;
use crate::ids::{FoodId, PigeonId};

/// One pigeon as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PigeonView {
    /// The pigeon's identifier.
    pub id: PigeonId,
    /// Current position.
    pub position: Position,
    /// Current behavioural mode.
    pub mode: PigeonMode,
}

/// One food item as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodView {
    /// The food item's identifier.
    pub id: FoodId,
    /// Where the food lies.
    pub position: Position,
    /// Whether the food is still fresh (stale food is drawn but never eaten).
    pub fresh: bool,
}

/// The visible marker left by the most recent scare.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScareIndicator {
    /// Centre of the scare.
    pub epicenter: Position,
    /// Radius within which pigeons were scared.
    pub radius: f32,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Coordinator tick that produced this frame.
    pub tick: u64,
    /// Wall-clock capture time.
    pub captured_at: DateTime<Utc>,
    /// All pigeons.
    pub pigeons: Vec<PigeonView>,
    /// All food currently in the pool, fresh or stale.
    pub food: Vec<FoodView>,
    /// Active scare marker, if one fired recently.
    pub scare: Option<ScareIndicator>,
}

impl FrameSnapshot {
    /// Count pigeons currently in the given mode.
    pub fn count_in_mode(&self, mode: PigeonMode) -> usize {
        self.pigeons.iter().filter(|p| p.mode == mode).count()
    }

    /// Count food items that are still fresh.
    pub fn fresh_food(&self) -> usize {
        self.food.iter().filter(|f| f.fresh).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pigeon(mode: PigeonMode) -> PigeonView {
        PigeonView {
            id: PigeonId::new(),
            position: Position::ZERO,
            mode,
        }
    }

    #[test]
    fn counts_by_mode_and_freshness() {
        let frame = FrameSnapshot {
            tick: 7,
            captured_at: Utc::now(),
            pigeons: vec![
                pigeon(PigeonMode::Asleep),
                pigeon(PigeonMode::Seeking),
                pigeon(PigeonMode::Seeking),
            ],
            food: vec![
                FoodView {
                    id: FoodId::new(),
                    position: Position::new(1.0, 1.0),
                    fresh: true,
                },
                FoodView {
                    id: FoodId::new(),
                    position: Position::new(2.0, 2.0),
                    fresh: false,
                },
            ],
            scare: None,
        };
        assert_eq!(frame.count_in_mode(PigeonMode::Seeking), 2);
        assert_eq!(frame.count_in_mode(PigeonMode::Scared), 0);
        assert_eq!(frame.fresh_food(), 1);
    }

    #[test]
    fn frame_serializes_to_json() {
        let frame = FrameSnapshot {
            tick: 1,
            captured_at: Utc::now(),
            pigeons: vec![pigeon(PigeonMode::Scared)],
            food: Vec::new(),
            scare: Some(ScareIndicator {
                epicenter: Position::new(10.0, 20.0),
                radius: 200.0,
            }),
        };
        let value = serde_json::to_value(&frame).unwrap_or_default();
        assert_eq!(value["tick"], 1);
        assert_eq!(value["pigeons"][0]["mode"], "scared");
        assert_eq!(value["scare"]["radius"], 200.0);
    }
}
