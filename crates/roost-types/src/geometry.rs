//! Planar geometry shared by the pool, the pigeons and the coordinator.
//!
//! Positions and directions are both [`Vec2`]. World coordinates follow the
//! screen convention of the renderer: origin at the top-left corner, `x`
//! growing to the right and `y` growing downward.

use core::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point or displacement in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

/// A point in world space.
pub type Position = Vec2;

impl Vec2 {
    /// The origin / zero displacement.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Unit vector along the positive `x` axis.
    pub const UNIT_X: Self = Self { x: 1.0, y: 0.0 };

    /// Create a vector from its components.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance between two points.
    ///
    /// The result is NaN when either point has a NaN component; callers
    /// that rank candidates by distance must treat that as "skip".
    pub fn distance_to(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Unit vector pointing the same way, or `None` when the length is zero
    /// or not finite.
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len.is_finite() && len > 0.0 {
            Some(Self::new(self.x / len, self.y / len))
        } else {
            None
        }
    }

    /// Whether both components are finite.
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Rectangular extent of the world, anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    /// Width in world units.
    pub width: f32,
    /// Height in world units.
    pub height: f32,
}

impl WorldBounds {
    /// Create bounds of the given size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether a point lies inside the bounds (edges included).
    pub fn contains(self, point: Position) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}
