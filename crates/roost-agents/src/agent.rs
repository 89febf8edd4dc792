//! Pigeons: per-agent state machine and worker thread.
//!
//! Each [`Pigeon`] runs its behaviour loop on a dedicated OS thread. One
//! cycle of that loop is [`Pigeon::step`]:
//!
//! - `Scared`: move along the flee direction at an elevated speed and
//!   count the scare timer down; when it reaches zero the pigeon is calm
//!   again and goes back to sleep, marked to look around once more.
//! - `Asleep`: do nothing, unless a scare just ended. Then look for food
//!   once and wake up if any is in sight.
//! - `Seeking`: ask the [`FoodPool`] for the closest fresh food in sight.
//!   Eat it if it is within the capture distance, otherwise fly one step
//!   toward it. No food in sight means back to sleep, unless a wake call
//!   arrived during the scan.
//!
//! # Locking
//!
//! The mutable fields (position, flags, timer, flee direction) live behind
//! one per-pigeon lock because the coordinator writes into a live pigeon
//! through [`Pigeon::scare`] and [`Pigeon::wake`]. The pigeon lock and the
//! pool lock are never held at the same time: a cycle copies its position
//! out, releases, scans the pool, and only then re-locks to move.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use roost_types::{FoodId, PigeonId, PigeonMode, PigeonView, Position, Vec2};
use roost_world::{FoodPool, FoodSighting};
use tracing::{debug, trace, warn};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::lifecycle::RunningFlag;

/// What a single behaviour cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Asleep; nothing happened.
    Idle,
    /// Fled one step; still scared.
    Fled,
    /// Fled one step and the scare timer ran out; now asleep.
    Recovered,
    /// Nothing fresh in sight; fell asleep.
    FellAsleep,
    /// Nothing fresh in sight, but a wake call arrived during the scan;
    /// still seeking.
    Rewoken,
    /// Flew one step toward the target.
    Moved {
        /// The food being approached.
        target: FoodId,
        /// Distance left to the target after the step.
        remaining: f32,
    },
    /// Reached the target and ate it.
    Consumed(FoodId),
    /// Reached the target but another pigeon ate it first.
    LostRace(FoodId),
    /// A scare arrived between perception and movement; the move was
    /// dropped and the next cycle flees.
    Interrupted,
    /// The target gave no usable direction; the move was skipped.
    Skipped,
}

/// Mutable per-pigeon state guarded by the pigeon lock.
#[derive(Debug, Clone)]
struct PigeonState {
    position: Position,
    asleep: bool,
    scared: bool,
    scare_timer: f32,
    flee_direction: Vec2,
    /// Set when a scare ends; the next asleep cycle scans for food once.
    recheck: bool,
    /// Bumped by every applied wake call.
    wake_epoch: u64,
}

impl PigeonState {
    const fn mode(&self) -> PigeonMode {
        PigeonMode::from_flags(self.asleep, self.scared)
    }
}

/// What a cycle saw before releasing the pigeon lock to scan the pool.
#[derive(Debug, Clone, Copy)]
struct Glance {
    position: Position,
    wake_epoch: u64,
    rechecking: bool,
}

/// State shared between a [`Pigeon`] handle and its worker thread.
#[derive(Debug)]
struct Shared {
    id: PigeonId,
    speed: f32,
    config: AgentConfig,
    state: Mutex<PigeonState>,
    pool: Arc<FoodPool>,
    global_running: RunningFlag,
    local_running: AtomicBool,
    worker_alive: AtomicBool,
}

impl Shared {
    fn should_run(&self) -> bool {
        self.local_running.load(Ordering::Acquire) && self.global_running.is_running()
    }

    fn step(&self) -> CycleOutcome {
        let glance = match self.glance() {
            Ok(glance) => glance,
            Err(outcome) => return outcome,
        };
        let sighting = self.pool.find_best_target(glance.position, self.config.vision_radius);
        self.act(glance, sighting)
    }

    /// First half of a cycle, under the pigeon lock.
    ///
    /// Returns the finished outcome when there is nothing to perceive.
    fn glance(&self) -> Result<Glance, CycleOutcome> {
        let mut state = self.state.lock();
        let rechecking = match state.mode() {
            PigeonMode::Scared => return Err(self.flee(&mut state)),
            PigeonMode::Asleep if !state.recheck => return Err(CycleOutcome::Idle),
            PigeonMode::Asleep => {
                state.recheck = false;
                true
            }
            PigeonMode::Seeking => false,
        };
        Ok(Glance {
            position: state.position,
            wake_epoch: state.wake_epoch,
            rechecking,
        })
    }

    /// Second half of a cycle, after the pool scan.
    fn act(&self, glance: Glance, sighting: Option<FoodSighting>) -> CycleOutcome {
        let Some(sighting) = sighting else {
            return if glance.rechecking {
                CycleOutcome::Idle
            } else {
                self.fall_asleep(glance.wake_epoch)
            };
        };

        if glance.rechecking {
            let mut state = self.state.lock();
            if state.scared {
                return CycleOutcome::Interrupted;
            }
            state.asleep = false;
            debug!(pigeon = %self.id, food = %sighting.id, "food in sight after scare, awake");
        }

        if sighting.distance < self.config.capture_distance {
            return if self.pool.remove_if_present(sighting.id) {
                debug!(pigeon = %self.id, food = %sighting.id, "food eaten");
                CycleOutcome::Consumed(sighting.id)
            } else {
                trace!(pigeon = %self.id, food = %sighting.id, "lost race for food");
                CycleOutcome::LostRace(sighting.id)
            };
        }

        // distance >= capture_distance > 0, so the direction is defined
        // unless the geometry is degenerate; skip the move in that case.
        let Some(direction) = (sighting.position - glance.position).normalized() else {
            warn!(pigeon = %self.id, food = %sighting.id, "no direction to food, skipping move");
            return CycleOutcome::Skipped;
        };
        let stride = self.speed.min(sighting.distance);

        let mut state = self.state.lock();
        if state.scared {
            return CycleOutcome::Interrupted;
        }
        state.position += direction * stride;
        CycleOutcome::Moved {
            target: sighting.id,
            remaining: state.position.distance_to(sighting.position),
        }
    }

    /// Go to sleep after an empty scan, unless woken or scared since.
    fn fall_asleep(&self, seen_epoch: u64) -> CycleOutcome {
        let mut state = self.state.lock();
        if state.scared {
            return CycleOutcome::Interrupted;
        }
        if state.wake_epoch != seen_epoch {
            trace!(pigeon = %self.id, "woken during scan, looking again");
            return CycleOutcome::Rewoken;
        }
        state.asleep = true;
        CycleOutcome::FellAsleep
    }

    fn flee(&self, state: &mut PigeonState) -> CycleOutcome {
        let velocity = state.flee_direction * (self.speed * self.config.flee_speed_multiplier);
        state.position += velocity;
        state.scare_timer = (state.scare_timer - self.config.flee_step).max(0.0);

        if state.scare_timer <= 0.0 {
            state.scared = false;
            state.asleep = true;
            state.recheck = true;
            debug!(pigeon = %self.id, "scare over, back to sleep");
            CycleOutcome::Recovered
        } else {
            CycleOutcome::Fled
        }
    }

    fn set_asleep(&self, asleep: bool) -> bool {
        let mut state = self.state.lock();
        if state.scared {
            return false;
        }
        state.asleep = asleep;
        if !asleep {
            state.wake_epoch = state.wake_epoch.wrapping_add(1);
        }
        true
    }
}

/// Clears the liveness flag when the worker exits, including by panic.
struct AliveGuard<'a>(&'a AtomicBool);

impl Drop for AliveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn run_worker(shared: &Shared) {
    let _alive = AliveGuard(&shared.worker_alive);
    debug!(pigeon = %shared.id, "pigeon worker started");

    while shared.should_run() {
        let outcome = shared.step();
        let pause = if outcome == CycleOutcome::Idle {
            shared.config.idle_interval()
        } else {
            shared.config.cycle_interval()
        };
        thread::park_timeout(pause);
    }

    debug!(pigeon = %shared.id, "pigeon worker stopped");
}

/// An autonomous pigeon with its own worker thread.
///
/// All methods take `&self`; the coordinator may call [`scare`],
/// [`wake`] and [`set_asleep`] from its own thread while the worker runs.
/// Dropping a pigeon stops and joins its worker.
///
/// [`scare`]: Pigeon::scare
/// [`wake`]: Pigeon::wake
/// [`set_asleep`]: Pigeon::set_asleep
#[derive(Debug)]
pub struct Pigeon {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Pigeon {
    /// Create a sleeping pigeon at `position`. The worker is not started.
    pub fn new(
        position: Position,
        speed: f32,
        pool: Arc<FoodPool>,
        running: RunningFlag,
        config: AgentConfig,
    ) -> Self {
        let state = PigeonState {
            position,
            asleep: true,
            scared: false,
            scare_timer: 0.0,
            flee_direction: Vec2::UNIT_X,
            recheck: false,
            wake_epoch: 0,
        };
        Self {
            shared: Arc::new(Shared {
                id: PigeonId::new(),
                speed,
                config,
                state: Mutex::new(state),
                pool,
                global_running: running,
                local_running: AtomicBool::new(false),
                worker_alive: AtomicBool::new(false),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Return the pigeon's identifier.
    pub fn id(&self) -> PigeonId {
        self.shared.id
    }

    /// Return the pigeon's cruising speed.
    pub fn speed(&self) -> f32 {
        self.shared.speed
    }

    /// Return the current position.
    pub fn position(&self) -> Position {
        self.shared.state.lock().position
    }

    /// Return the current behavioural mode.
    pub fn mode(&self) -> PigeonMode {
        self.shared.state.lock().mode()
    }

    /// Whether the sleep flag is set (it is ignored while scared).
    pub fn is_asleep(&self) -> bool {
        self.shared.state.lock().asleep
    }

    /// Whether the pigeon is currently scared.
    pub fn is_scared(&self) -> bool {
        self.shared.state.lock().scared
    }

    /// Remaining scare time; zero when calm.
    pub fn scare_timer(&self) -> f32 {
        self.shared.state.lock().scare_timer
    }

    /// Unit vector the pigeon flees along while scared.
    pub fn flee_direction(&self) -> Vec2 {
        self.shared.state.lock().flee_direction
    }

    /// Renderer view of this pigeon.
    pub fn view(&self) -> PigeonView {
        let state = self.shared.state.lock();
        PigeonView {
            id: self.shared.id,
            position: state.position,
            mode: state.mode(),
        }
    }

    /// Run one behaviour cycle on the calling thread.
    ///
    /// The worker loop is this plus a pause; tests call it directly.
    pub fn step(&self) -> CycleOutcome {
        self.shared.step()
    }

    /// Frighten the pigeon away from `source`.
    ///
    /// Sets the flee direction to the unit vector from `source` toward the
    /// pigeon, or `(1, 0)` when the two coincide, and restarts the scare
    /// timer. Safe to call at any time from any thread.
    pub fn scare(&self, source: Position) {
        {
            let mut state = self.shared.state.lock();
            state.scared = true;
            state.scare_timer = self.shared.config.scare_duration;
            state.flee_direction = (state.position - source).normalized().unwrap_or(Vec2::UNIT_X);
        }
        trace!(pigeon = %self.shared.id, x = source.x, y = source.y, "scared");
        self.unpark();
    }

    /// Set or clear the sleep flag. Ignored while scared.
    ///
    /// Returns whether the flag was applied.
    pub fn set_asleep(&self, asleep: bool) -> bool {
        let applied = self.shared.set_asleep(asleep);
        if applied && !asleep {
            self.unpark();
        }
        applied
    }

    /// Wake the pigeon so its next cycle looks for food.
    pub fn wake(&self) -> bool {
        self.set_asleep(false)
    }

    /// Distance to another pigeon.
    pub fn distance_to(&self, other: &Self) -> f32 {
        let here = self.position();
        here.distance_to(other.position())
    }

    /// Whether another pigeon is within the crowding distance.
    pub fn is_too_close_to(&self, other: &Self) -> bool {
        self.distance_to(other) < self.shared.config.crowding_distance
    }

    /// Start the worker thread. Does nothing if it is already started.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Spawn`] if the OS cannot create the thread.
    pub fn start(&self) -> Result<(), AgentError> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }

        self.shared.local_running.store(true, Ordering::Release);
        self.shared.worker_alive.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("pigeon-{}", self.shared.id.short()))
            .spawn(move || run_worker(&shared));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                Ok(())
            }
            Err(source) => {
                self.shared.local_running.store(false, Ordering::Release);
                self.shared.worker_alive.store(false, Ordering::Release);
                Err(AgentError::Spawn {
                    pigeon: self.shared.id,
                    source,
                })
            }
        }
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Safe to call on a pigeon that was never started and safe to call
    /// twice. When this returns the worker thread has finished.
    pub fn stop(&self) {
        self.shared.local_running.store(false, Ordering::Release);
        let handle = self.worker.lock().take();
        let Some(handle) = handle else {
            return;
        };
        handle.thread().unpark();
        if handle.join().is_err() {
            warn!(pigeon = %self.shared.id, "pigeon worker panicked");
        }
    }

    /// Whether a worker has been started and not yet stopped.
    pub fn is_started(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Whether the worker thread is currently executing its loop.
    pub fn is_worker_alive(&self) -> bool {
        self.shared.worker_alive.load(Ordering::Acquire)
    }

    fn unpark(&self) {
        if let Some(handle) = self.worker.lock().as_ref() {
            handle.thread().unpark();
        }
    }
}

impl Drop for Pigeon {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::{Duration, Instant};

    use roost_world::FoodItem;

    use super::*;

    fn fast_config() -> AgentConfig {
        AgentConfig {
            cycle_interval_ms: 1,
            idle_interval_ms: 1,
            ..AgentConfig::default()
        }
    }

    fn make_pigeon(position: Position, speed: f32) -> (Pigeon, Arc<FoodPool>, RunningFlag) {
        let pool = Arc::new(FoodPool::new());
        let running = RunningFlag::new();
        let pigeon = Pigeon::new(
            position,
            speed,
            Arc::clone(&pool),
            running.clone(),
            fast_config(),
        );
        (pigeon, pool, running)
    }

    fn drop_food(pool: &FoodPool, position: Position) -> FoodId {
        pool.add(FoodItem::new(position, Instant::now()))
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        condition()
    }

    #[test]
    fn starts_asleep_and_idles() {
        let (pigeon, pool, _) = make_pigeon(Position::new(50.0, 50.0), 3.0);
        let _ = drop_food(&pool, Position::new(60.0, 50.0));

        assert_eq!(pigeon.mode(), PigeonMode::Asleep);
        assert_eq!(pigeon.step(), CycleOutcome::Idle);
        assert_eq!(pigeon.position(), Position::new(50.0, 50.0));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn falls_asleep_without_food() {
        let (pigeon, _, _) = make_pigeon(Position::ZERO, 3.0);
        assert!(pigeon.wake());
        assert_eq!(pigeon.mode(), PigeonMode::Seeking);
        assert_eq!(pigeon.step(), CycleOutcome::FellAsleep);
        assert_eq!(pigeon.mode(), PigeonMode::Asleep);
    }

    #[test]
    fn ignores_food_out_of_sight() {
        let (pigeon, pool, _) = make_pigeon(Position::ZERO, 3.0);
        let _ = drop_food(&pool, Position::new(701.0, 0.0));
        let _ = pigeon.wake();
        assert_eq!(pigeon.step(), CycleOutcome::FellAsleep);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn approaches_then_eats_food() {
        let (pigeon, pool, _) = make_pigeon(Position::ZERO, 3.0);
        let food = drop_food(&pool, Position::new(10.0, 0.0));
        let _ = pigeon.wake();

        let mut last_gap = pigeon.position().distance_to(Position::new(10.0, 0.0));
        let mut eaten = false;
        for _ in 0..10 {
            match pigeon.step() {
                CycleOutcome::Moved { target, remaining } => {
                    assert_eq!(target, food);
                    assert!(remaining < last_gap);
                    last_gap = remaining;
                }
                CycleOutcome::Consumed(id) => {
                    assert_eq!(id, food);
                    assert!(last_gap < 5.0);
                    eaten = true;
                    break;
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }

        assert!(eaten);
        assert!(pool.is_empty());
        assert!(approx(pigeon.position().x, 6.0));
        // Still awake after eating; the next cycle finds nothing and sleeps.
        assert_eq!(pigeon.mode(), PigeonMode::Seeking);
        assert_eq!(pigeon.step(), CycleOutcome::FellAsleep);
    }

    #[test]
    fn capture_boundary_is_exclusive() {
        let (pigeon, pool, _) = make_pigeon(Position::ZERO, 3.0);
        let near = drop_food(&pool, Position::new(4.99, 0.0));
        let _ = pigeon.wake();
        assert_eq!(pigeon.step(), CycleOutcome::Consumed(near));

        let (pigeon, pool, _) = make_pigeon(Position::ZERO, 3.0);
        let edge = drop_food(&pool, Position::new(5.0, 0.0));
        let _ = pigeon.wake();
        match pigeon.step() {
            CycleOutcome::Moved { target, remaining } => {
                assert_eq!(target, edge);
                assert!(approx(remaining, 2.0));
            }
            other => panic!("expected a move at exactly the capture distance, got {other:?}"),
        }
        assert!(pool.contains(edge));
    }

    #[test]
    fn step_never_overshoots_target() {
        let (pigeon, pool, _) = make_pigeon(Position::ZERO, 10.0);
        let food = drop_food(&pool, Position::new(0.0, 8.0));
        let _ = pigeon.wake();
        assert_eq!(
            pigeon.step(),
            CycleOutcome::Moved {
                target: food,
                remaining: 0.0
            }
        );
        assert_eq!(pigeon.step(), CycleOutcome::Consumed(food));
    }

    #[test]
    fn chooses_nearest_food() {
        let (pigeon, pool, _) = make_pigeon(Position::ZERO, 1.0);
        let _far = drop_food(&pool, Position::new(0.0, 90.0));
        let near = drop_food(&pool, Position::new(-40.0, 0.0));
        let _ = pigeon.wake();
        match pigeon.step() {
            CycleOutcome::Moved { target, .. } => assert_eq!(target, near),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(approx(pigeon.position().x, -1.0));
    }

    #[test]
    fn scare_points_away_from_source() {
        let (pigeon, _, _) = make_pigeon(Position::new(3.0, 4.0), 2.0);
        pigeon.scare(Position::ZERO);
        let dir = pigeon.flee_direction();
        assert!(approx(dir.x, 0.6) && approx(dir.y, 0.8));
        assert!(pigeon.is_scared());
        assert_eq!(pigeon.mode(), PigeonMode::Scared);
        assert!(approx(pigeon.scare_timer(), 5.0));
    }

    #[test]
    fn scare_at_own_position_uses_default_direction() {
        let (pigeon, _, _) = make_pigeon(Position::new(7.0, 7.0), 2.0);
        pigeon.scare(Position::new(7.0, 7.0));
        assert_eq!(pigeon.flee_direction(), Vec2::UNIT_X);
    }

    #[test]
    fn flees_at_double_speed() {
        let (pigeon, _, _) = make_pigeon(Position::new(10.0, 0.0), 3.0);
        pigeon.scare(Position::ZERO);
        assert_eq!(pigeon.step(), CycleOutcome::Fled);
        assert!(approx(pigeon.position().x, 16.0));
        assert!(approx(pigeon.position().y, 0.0));
        assert!(approx(pigeon.scare_timer(), 4.9));
    }

    #[test]
    fn scare_wears_off_then_pursuit_resumes() {
        let (pigeon, pool, _) = make_pigeon(Position::new(0.0, 0.0), 2.0);
        let food = drop_food(&pool, Position::new(30.0, 0.0));
        let _ = pigeon.wake();
        pigeon.scare(Position::new(-1.0, 0.0));

        let mut previous = pigeon.scare_timer();
        let mut cycles = 0_u32;
        loop {
            let outcome = pigeon.step();
            cycles = cycles.saturating_add(1);
            let timer = pigeon.scare_timer();
            assert!(timer >= 0.0);
            assert!(timer < previous);
            previous = timer;
            if outcome == CycleOutcome::Recovered {
                break;
            }
            assert_eq!(outcome, CycleOutcome::Fled);
            assert!(cycles < 100, "scare never wore off");
        }

        // 5.0 / 0.1 cycles, give or take float rounding.
        assert!((49..=51).contains(&cycles));
        assert!(!pigeon.is_scared());
        assert_eq!(pigeon.mode(), PigeonMode::Asleep);

        // The food is still in sight, so the next cycle wakes and heads back.
        let gap = pigeon.position().distance_to(Position::new(30.0, 0.0));
        match pigeon.step() {
            CycleOutcome::Moved { target, remaining } => {
                assert_eq!(target, food);
                assert!(remaining < gap);
            }
            other => panic!("expected pursuit after recovery, got {other:?}"),
        }
        assert_eq!(pigeon.mode(), PigeonMode::Seeking);

        let mut eaten = false;
        for _ in 0..200 {
            if pigeon.step() == CycleOutcome::Consumed(food) {
                eaten = true;
                break;
            }
        }
        assert!(eaten);
        assert!(pool.is_empty());
    }

    #[test]
    fn recovery_without_food_stays_asleep() {
        let (pigeon, pool, _) = make_pigeon(Position::ZERO, 2.0);
        let _far = drop_food(&pool, Position::new(-2000.0, 0.0));
        pigeon.scare(Position::new(-1.0, 0.0));
        while pigeon.step() != CycleOutcome::Recovered {}

        // One look around, then plain sleep.
        assert_eq!(pigeon.step(), CycleOutcome::Idle);
        assert_eq!(pigeon.mode(), PigeonMode::Asleep);
        assert!(!pigeon.shared.state.lock().recheck);
        assert_eq!(pigeon.step(), CycleOutcome::Idle);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn wake_during_empty_scan_is_not_lost() {
        let (pigeon, pool, _) = make_pigeon(Position::ZERO, 3.0);
        let _ = pigeon.wake();

        // The worker has scanned an empty pool and not yet gone to sleep
        // when food lands and the coordinator wakes it.
        let glance = pigeon.shared.glance().unwrap();
        let sighting = pool.find_best_target(glance.position, 700.0);
        assert!(sighting.is_none());
        let food = drop_food(&pool, Position::new(20.0, 0.0));
        assert!(pigeon.wake());

        assert_eq!(pigeon.shared.act(glance, sighting), CycleOutcome::Rewoken);
        assert_eq!(pigeon.mode(), PigeonMode::Seeking);
        match pigeon.step() {
            CycleOutcome::Moved { target, .. } => assert_eq!(target, food),
            other => panic!("expected a move toward the new food, got {other:?}"),
        }
    }

    #[test]
    fn empty_scan_without_wake_falls_asleep() {
        let (pigeon, _, _) = make_pigeon(Position::ZERO, 3.0);
        let _ = pigeon.wake();
        let glance = pigeon.shared.glance().unwrap();
        assert_eq!(pigeon.shared.act(glance, None), CycleOutcome::FellAsleep);
        assert_eq!(pigeon.mode(), PigeonMode::Asleep);
    }

    #[test]
    fn scare_during_empty_scan_interrupts() {
        let (pigeon, _, _) = make_pigeon(Position::ZERO, 3.0);
        let _ = pigeon.wake();
        let glance = pigeon.shared.glance().unwrap();
        pigeon.scare(Position::new(-1.0, 0.0));
        assert_eq!(pigeon.shared.act(glance, None), CycleOutcome::Interrupted);
        assert_eq!(pigeon.mode(), PigeonMode::Scared);
    }

    #[test]
    fn degenerate_target_skips_move() {
        let (pigeon, _, _) = make_pigeon(Position::new(4.0, 4.0), 3.0);
        let _ = pigeon.wake();
        let glance = pigeon.shared.glance().unwrap();
        let sighting = FoodSighting {
            id: FoodId::new(),
            position: Position::new(f32::INFINITY, 4.0),
            distance: 10.0,
        };
        assert_eq!(pigeon.shared.act(glance, Some(sighting)), CycleOutcome::Skipped);
        assert_eq!(pigeon.position(), Position::new(4.0, 4.0));
        assert_eq!(pigeon.mode(), PigeonMode::Seeking);
    }

    #[test]
    fn scared_pigeon_ignores_sleep_changes() {
        let (pigeon, _, _) = make_pigeon(Position::new(1.0, 1.0), 2.0);
        pigeon.scare(Position::ZERO);
        assert!(!pigeon.wake());
        assert!(!pigeon.set_asleep(true));
        assert!(pigeon.is_asleep());
        assert_eq!(pigeon.mode(), PigeonMode::Scared);
    }

    #[test]
    fn scare_overrides_sleep_for_movement() {
        let (pigeon, _, _) = make_pigeon(Position::new(0.0, 5.0), 1.0);
        assert!(pigeon.is_asleep());
        pigeon.scare(Position::ZERO);
        assert_eq!(pigeon.step(), CycleOutcome::Fled);
        assert!(approx(pigeon.position().y, 7.0));
    }

    #[test]
    fn crowding_uses_configured_distance() {
        let pool = Arc::new(FoodPool::new());
        let running = RunningFlag::new();
        let make = |p: Position| {
            Pigeon::new(p, 2.0, Arc::clone(&pool), running.clone(), fast_config())
        };
        let a = make(Position::ZERO);
        let b = make(Position::new(12.0, 16.0));
        let c = make(Position::new(20.0, 10.0));

        assert!(approx(a.distance_to(&b), 20.0));
        assert!(!a.is_too_close_to(&b));
        assert!(b.is_too_close_to(&c));
        assert!(!a.is_too_close_to(&c));
    }

    #[test]
    fn view_reflects_state() {
        let (pigeon, _, _) = make_pigeon(Position::new(2.0, 3.0), 2.0);
        let view = pigeon.view();
        assert_eq!(view.id, pigeon.id());
        assert_eq!(view.position, Position::new(2.0, 3.0));
        assert_eq!(view.mode, PigeonMode::Asleep);
    }

    #[test]
    fn stop_before_start_is_noop() {
        let (pigeon, _, _) = make_pigeon(Position::ZERO, 2.0);
        pigeon.stop();
        pigeon.stop();
        assert!(!pigeon.is_started());
        assert!(!pigeon.is_worker_alive());
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let (pigeon, _, _) = make_pigeon(Position::ZERO, 2.0);
        pigeon.start().unwrap();
        pigeon.start().unwrap();
        assert!(pigeon.is_started());
        assert!(pigeon.is_worker_alive());

        pigeon.stop();
        assert!(!pigeon.is_started());
        assert!(!pigeon.is_worker_alive());
        pigeon.stop();
        assert!(!pigeon.is_worker_alive());
    }

    #[test]
    fn stop_interrupts_long_idle_pause() {
        let pool = Arc::new(FoodPool::new());
        let config = AgentConfig {
            idle_interval_ms: 60_000,
            ..AgentConfig::default()
        };
        let pigeon = Pigeon::new(Position::ZERO, 2.0, pool, RunningFlag::new(), config);
        pigeon.start().unwrap();
        thread::sleep(Duration::from_millis(20));

        let begun = Instant::now();
        pigeon.stop();
        assert!(begun.elapsed() < Duration::from_secs(5));
        assert!(!pigeon.is_worker_alive());
    }

    #[test]
    fn worker_eats_food_in_background() {
        let (pigeon, pool, _) = make_pigeon(Position::ZERO, 4.0);
        let _ = drop_food(&pool, Position::new(40.0, 30.0));
        pigeon.start().unwrap();
        let _ = pigeon.wake();

        assert!(wait_until(Duration::from_secs(5), || pool.is_empty()));
        assert!(wait_until(Duration::from_secs(5), || pigeon.mode() == PigeonMode::Asleep));
        pigeon.stop();
        assert!(!pigeon.is_worker_alive());
    }

    #[test]
    fn worker_exits_when_global_flag_clears() {
        let (pigeon, _, running) = make_pigeon(Position::ZERO, 2.0);
        pigeon.start().unwrap();
        assert!(pigeon.is_worker_alive());

        running.stop();
        assert!(wait_until(Duration::from_secs(5), || !pigeon.is_worker_alive()));
        // The handle is still held until stop joins it.
        assert!(pigeon.is_started());
        pigeon.stop();
        assert!(!pigeon.is_started());
    }

    #[test]
    fn scares_from_another_thread_keep_state_consistent() {
        let (pigeon, pool, _) = make_pigeon(Position::new(100.0, 100.0), 3.0);
        for i in 0..20 {
            let _ = drop_food(&pool, Position::new(100.0 + i as f32 * 7.0, 100.0));
        }
        pigeon.start().unwrap();
        let _ = pigeon.wake();

        thread::scope(|scope| {
            let _ = scope.spawn(|| {
                for i in 0..200 {
                    pigeon.scare(Position::new(i as f32, 0.0));
                    let _ = pigeon.wake();
                    let timer = pigeon.scare_timer();
                    assert!((0.0..=5.0).contains(&timer));
                    thread::sleep(Duration::from_micros(200));
                }
            });
        });

        pigeon.stop();
        assert!(!pigeon.is_worker_alive());
        let timer = pigeon.scare_timer();
        assert!((0.0..=5.0).contains(&timer));
        assert!(pigeon.position().is_finite());
    }

    #[test]
    fn dropping_pigeon_joins_worker() {
        let (pigeon, _, _) = make_pigeon(Position::ZERO, 2.0);
        pigeon.start().unwrap();
        let alive = Arc::clone(&pigeon.shared);
        drop(pigeon);
        assert!(!alive.worker_alive.load(Ordering::Acquire));
    }
}
