//! Random placement for pigeons and scare epicenters.

use std::fmt::Debug;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roost_types::{Position, WorldBounds};

/// Source of random positions and speeds.
pub trait PositionSource: Send + Debug {
    /// A uniformly distributed point inside `bounds`.
    fn position(&mut self, bounds: &WorldBounds) -> Position;

    /// A uniformly distributed speed in `[min, max]`.
    fn speed(&mut self, min: f32, max: f32) -> f32;
}

/// [`PositionSource`] backed by a standard PRNG.
#[derive(Debug, Clone)]
pub struct SeededPositions {
    rng: StdRng,
}

impl SeededPositions {
    /// Seed deterministically, or from OS entropy when `seed` is `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self { rng }
    }

    fn uniform(&mut self, low: f32, high: f32) -> f32 {
        // Degenerate or inverted ranges collapse to the lower bound.
        if low.is_finite() && high.is_finite() && low < high {
            self.rng.random_range(low..=high)
        } else {
            low
        }
    }
}

impl PositionSource for SeededPositions {
    fn position(&mut self, bounds: &WorldBounds) -> Position {
        let x = self.uniform(0.0, bounds.width);
        let y = self.uniform(0.0, bounds.height);
        Position::new(x, y)
    }

    fn speed(&mut self, min: f32, max: f32) -> f32 {
        self.uniform(min, max)
    }
}
