//! The shared food pool.
//!
//! [`FoodPool`] is the only structure mutated from more than one thread:
//! the coordinator appends and ages food, every pigeon worker scans and
//! removes it. All of those operations take the same [`Mutex`] for the
//! whole scan or mutation and release it before returning, so no caller
//! ever holds a lock across a sleep and no caller ever sees a half-updated
//! collection.
//!
//! Pigeons never keep references into the pool. A scan returns a
//! [`FoodSighting`] (identity plus copied position), and consuming the
//! food later goes through [`FoodPool::remove_if_present`], which
//! re-checks that the identity is still there. Two pigeons racing for the
//! same item therefore resolve to exactly one successful removal.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use roost_types::{FoodId, FoodView, Position};
use tracing::{trace, warn};

use crate::resource::FoodItem;

/// A fresh food item found by a perception scan.
///
/// Everything here is copied out while the pool lock is held; the item may
/// have been eaten by someone else by the time the caller acts on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodSighting {
    /// Identity of the sighted item.
    pub id: FoodId,
    /// Position of the item at scan time.
    pub position: Position,
    /// Distance from the scanning position.
    pub distance: f32,
}

/// Ordered collection of food items behind a single lock.
#[derive(Debug, Default)]
pub struct FoodPool {
    items: Mutex<Vec<FoodItem>>,
}

impl FoodPool {
    /// Create an empty pool.
    pub const fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Append an item. Always succeeds.
    pub fn add(&self, item: FoodItem) -> FoodId {
        let id = item.id();
        self.items.lock().push(item);
        id
    }

    /// Find the closest fresh item within `vision_radius` of `from`.
    ///
    /// Stale items and items farther than the radius are ignored. Items
    /// whose distance comes out NaN, infinite or negative are skipped with
    /// a warning and the scan continues. On equal distances the item that
    /// comes first in the pool wins.
    pub fn find_best_target(&self, from: Position, vision_radius: f32) -> Option<FoodSighting> {
        let items = self.items.lock();
        let mut best: Option<FoodSighting> = None;

        for item in items.iter().filter(|item| item.is_fresh()) {
            let distance = from.distance_to(item.position());
            if !distance.is_finite() || distance < 0.0 {
                warn!(
                    food = %item.id(),
                    distance,
                    "skipping food with degenerate distance"
                );
                continue;
            }
            if distance > vision_radius {
                continue;
            }
            if best.is_none_or(|current| distance < current.distance) {
                best = Some(FoodSighting {
                    id: item.id(),
                    position: item.position(),
                    distance,
                });
            }
        }

        best
    }

    /// Remove the item with the given identity if it is still present.
    ///
    /// Returns `false` when another consumer got there first; that is a
    /// normal outcome, not an error.
    pub fn remove_if_present(&self, id: FoodId) -> bool {
        let mut items = self.items.lock();
        if let Some(index) = items.iter().position(|item| item.id() == id) {
            items.remove(index);
            true
        } else {
            trace!(food = %id, "food already gone");
            false
        }
    }

    /// Age every item, returning how many turned stale on this call.
    pub fn refresh_staleness(&self, now: Instant, stale_after: Duration) -> usize {
        let mut items = self.items.lock();
        items
            .iter_mut()
            .map(|item| item.refresh_staleness(now, stale_after))
            .filter(|&turned| turned)
            .count()
    }

    /// Whether an item with this identity is in the pool.
    pub fn contains(&self, id: FoodId) -> bool {
        self.items.lock().iter().any(|item| item.id() == id)
    }

    /// Whether the item with this identity is present and fresh.
    pub fn is_fresh(&self, id: FoodId) -> Option<bool> {
        self.items
            .lock()
            .iter()
            .find(|item| item.id() == id)
            .map(FoodItem::is_fresh)
    }

    /// Number of items, fresh or stale.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Number of fresh items.
    pub fn fresh_count(&self) -> usize {
        self.items.lock().iter().filter(|item| item.is_fresh()).count()
    }

    /// Copy of every item for rendering, in pool order.
    pub fn views(&self) -> Vec<FoodView> {
        self.items.lock().iter().map(FoodItem::view).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;

    const VISION: f32 = 700.0;
    const STALE_AFTER: Duration = Duration::from_secs(5);

    fn pool_with(positions: &[Position], now: Instant) -> (FoodPool, Vec<FoodId>) {
        let pool = FoodPool::new();
        let ids = positions
            .iter()
            .map(|&p| pool.add(FoodItem::new(p, now)))
            .collect();
        (pool, ids)
    }

    #[test]
    fn empty_pool_has_no_target() {
        let pool = FoodPool::new();
        assert!(pool.find_best_target(Position::ZERO, VISION).is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn picks_closest_fresh_item() {
        let now = Instant::now();
        let (pool, ids) = pool_with(
            &[
                Position::new(100.0, 0.0),
                Position::new(30.0, 40.0),
                Position::new(0.0, 300.0),
            ],
            now,
        );
        let sighting = pool.find_best_target(Position::ZERO, VISION);
        assert_eq!(sighting.map(|s| s.id), ids.get(1).copied());
        assert!(sighting.is_some_and(|s| (s.distance - 50.0).abs() < 1e-4));
        assert_eq!(sighting.map(|s| s.position), Some(Position::new(30.0, 40.0)));
    }

    #[test]
    fn never_returns_item_beyond_vision() {
        let now = Instant::now();
        let (pool, _) = pool_with(&[Position::new(700.5, 0.0), Position::new(0.0, 900.0)], now);
        assert!(pool.find_best_target(Position::ZERO, VISION).is_none());
    }

    #[test]
    fn vision_radius_is_inclusive() {
        let now = Instant::now();
        let (pool, ids) = pool_with(&[Position::new(700.0, 0.0)], now);
        let sighting = pool.find_best_target(Position::ZERO, VISION);
        assert_eq!(sighting.map(|s| s.id), ids.first().copied());
    }

    #[test]
    fn never_returns_stale_item() {
        let start = Instant::now();
        let (pool, ids) = pool_with(&[Position::new(10.0, 0.0)], start);
        let later_id = pool.add(FoodItem::new(Position::new(200.0, 0.0), start + STALE_AFTER));

        assert_eq!(pool.refresh_staleness(start + STALE_AFTER, STALE_AFTER), 1);
        assert_eq!(pool.is_fresh(ids[0]), Some(false));

        // The nearer item is stale, so the farther fresh one is chosen.
        let sighting = pool.find_best_target(Position::ZERO, VISION);
        assert_eq!(sighting.map(|s| s.id), Some(later_id));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.fresh_count(), 1);
    }

    #[test]
    fn equal_distance_keeps_first_in_scan_order() {
        let now = Instant::now();
        let (pool, ids) = pool_with(&[Position::new(-20.0, 0.0), Position::new(20.0, 0.0)], now);
        let sighting = pool.find_best_target(Position::ZERO, VISION);
        assert_eq!(sighting.map(|s| s.id), ids.first().copied());
    }

    #[test]
    fn degenerate_distance_is_skipped_not_fatal() {
        let now = Instant::now();
        let (pool, ids) = pool_with(
            &[
                Position::new(f32::NAN, 0.0),
                Position::new(f32::INFINITY, 0.0),
                Position::new(50.0, 0.0),
            ],
            now,
        );
        let sighting = pool.find_best_target(Position::ZERO, VISION);
        assert_eq!(sighting.map(|s| s.id), ids.get(2).copied());
    }

    #[test]
    fn coincident_food_has_zero_distance() {
        let now = Instant::now();
        let (pool, ids) = pool_with(&[Position::new(5.0, 5.0)], now);
        let sighting = pool.find_best_target(Position::new(5.0, 5.0), VISION);
        assert_eq!(sighting.map(|s| s.id), ids.first().copied());
        assert!(sighting.is_some_and(|s| s.distance.abs() < f32::EPSILON));
    }

    #[test]
    fn remove_is_checked_and_idempotent() {
        let now = Instant::now();
        let (pool, ids) = pool_with(&[Position::new(1.0, 1.0), Position::new(2.0, 2.0)], now);
        assert!(pool.remove_if_present(ids[0]));
        assert!(!pool.remove_if_present(ids[0]));
        assert!(!pool.contains(ids[0]));
        assert!(pool.contains(ids[1]));
        assert!(!pool.remove_if_present(FoodId::new()));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn concurrent_removal_succeeds_exactly_once() {
        const RACERS: usize = 16;

        for _ in 0..20 {
            let pool = Arc::new(FoodPool::new());
            let id = pool.add(FoodItem::new(Position::new(10.0, 10.0), Instant::now()));
            let barrier = Arc::new(Barrier::new(RACERS));

            let wins: usize = thread::scope(|scope| {
                let handles: Vec<_> = (0..RACERS)
                    .map(|_| {
                        let pool = Arc::clone(&pool);
                        let barrier = Arc::clone(&barrier);
                        scope.spawn(move || {
                            barrier.wait();
                            pool.remove_if_present(id)
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| usize::from(h.join().unwrap_or(false)))
                    .sum()
            });

            assert_eq!(wins, 1);
            assert!(pool.is_empty());
        }
    }

    #[test]
    fn scans_and_removals_interleave_safely() {
        let pool = Arc::new(FoodPool::new());
        let now = Instant::now();
        for i in 0..200 {
            let _ = pool.add(FoodItem::new(Position::new(i as f32, 0.0), now));
        }

        let eaten: usize = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let pool = Arc::clone(&pool);
                    scope.spawn(move || {
                        let mut count = 0_usize;
                        while let Some(sighting) = pool.find_best_target(Position::ZERO, VISION) {
                            if pool.remove_if_present(sighting.id) {
                                count += 1;
                            }
                        }
                        count
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap_or(0)).sum()
        });

        assert_eq!(eaten, 200);
        assert!(pool.is_empty());
    }

    #[test]
    fn views_preserve_pool_order() {
        let now = Instant::now();
        let (pool, ids) = pool_with(&[Position::new(1.0, 0.0), Position::new(2.0, 0.0)], now);
        let views = pool.views();
        let view_ids: Vec<FoodId> = views.iter().map(|v| v.id).collect();
        assert_eq!(view_ids, ids);
        assert!(views.iter().all(|v| v.fresh));
    }
}
