//! Food items and their freshness lifecycle.
//!
//! A [`FoodItem`] is created fresh and turns stale once a fixed delay has
//! elapsed since its creation. The transition is one-way: nothing in this
//! crate can make a stale item fresh again. Stale food stays in the pool
//! (it is still drawn) but is invisible to pigeon perception.

use std::time::{Duration, Instant};

use roost_types::{FoodId, FoodView, Position};
use tracing::debug;

/// A single piece of food lying in the world.
#[derive(Debug, Clone)]
pub struct FoodItem {
    /// Stable identity used for removal.
    id: FoodId,
    /// Where the food lies.
    position: Position,
    /// `true` until the staleness delay has elapsed.
    fresh: bool,
    /// Monotonic creation time.
    created_at: Instant,
}

impl FoodItem {
    /// Create a fresh food item stamped with `now`.
    pub fn new(position: Position, now: Instant) -> Self {
        let item = Self {
            id: FoodId::new(),
            position,
            fresh: true,
            created_at: now,
        };
        debug!(food = %item.id, x = position.x, y = position.y, "food created");
        item
    }

    /// Return the item's identity.
    pub const fn id(&self) -> FoodId {
        self.id
    }

    /// Return the item's position.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Whether the item is still fresh.
    pub const fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Return the creation timestamp.
    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Age the item: mark it stale once `now - created_at >= stale_after`.
    ///
    /// Returns `true` only on the call that performs the fresh-to-stale
    /// transition. Calling it again, or with a `now` earlier than the
    /// creation time, changes nothing.
    pub fn refresh_staleness(&mut self, now: Instant, stale_after: Duration) -> bool {
        if !self.fresh {
            return false;
        }
        let age = now.saturating_duration_since(self.created_at);
        if age >= stale_after {
            self.fresh = false;
            debug!(food = %self.id, age_ms = age.as_millis(), "food turned stale");
            return true;
        }
        false
    }

    /// Renderer view of this item.
    pub const fn view(&self) -> FoodView {
        FoodView {
            id: self.id,
            position: self.position,
            fresh: self.fresh,
        }
    }
}
