//! Enumeration types for the Roost simulation.

use serde::{Deserialize, Serialize};

/// Behavioural state of a pigeon, as seen by observers.
///
/// A pigeon is in exactly one mode at a time. `Scared` takes precedence
/// over the sleep flag: a frightened pigeon flees even if it was asleep
/// when the scare hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PigeonMode {
    /// Idle; no perception, no movement.
    Asleep,
    /// Awake and looking for the nearest fresh food.
    Seeking,
    /// Fleeing from a scare until the scare timer runs out.
    Scared,
}

impl PigeonMode {
    /// Resolve the mode from the two state flags.
    pub const fn from_flags(asleep: bool, scared: bool) -> Self {
        if scared {
            Self::Scared
        } else if asleep {
            Self::Asleep
        } else {
            Self::Seeking
        }
    }
}

impl core::fmt::Display for PigeonMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Asleep => "asleep",
            Self::Seeking => "seeking",
            Self::Scared => "scared",
        };
        f.write_str(label)
    }
}
