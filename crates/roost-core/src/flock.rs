//! The flock coordinator.
//!
//! [`Flock`] owns the food pool, every pigeon and the shared running flag.
//! It is driven from a single thread (the runner): it adds food on input,
//! ages food, fires scares on a timer and produces frame snapshots. Pigeon
//! workers run on their own threads and only meet the coordinator through
//! the pool lock and the per-pigeon lock.
//!
//! # Shutdown
//!
//! [`Flock::shutdown`] clears the running flag, then stops and joins every
//! pigeon in turn. When it returns no pigeon worker is still running. It is
//! idempotent and also runs on drop.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use roost_agents::{AgentConfig, AgentError, Pigeon, RunningFlag};
use roost_types::{FoodId, FrameSnapshot, PigeonId, Position, ScareIndicator, WorldBounds};
use roost_world::{FoodItem, FoodPool};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::{ConfigError, FoodConfig, PopulationConfig, ScareConfig, SimulationConfig};
use crate::random::PositionSource;

/// Errors raised while building or starting a flock.
#[derive(Debug, thiserror::Error)]
pub enum FlockError {
    /// A pigeon could not be started.
    #[error("pigeon error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// The configuration was rejected.
    #[error("config error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },
}

/// A scare that has just been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScareEvent {
    /// Where the scare happened.
    pub epicenter: Position,
    /// Radius used for the distance test.
    pub radius: f32,
    /// How many pigeons were inside the radius.
    pub scared: usize,
}

/// What a single coordinator tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Food items that turned stale during this tick.
    pub stale_food: usize,
    /// The scare fired on this tick, if the interval elapsed.
    pub scare: Option<ScareEvent>,
    /// The scare marker currently visible, if any.
    pub indicator: Option<ScareIndicator>,
}

/// Coordinator for one simulation: pool, pigeons and timers.
#[derive(Debug)]
pub struct Flock {
    pigeons: Vec<Pigeon>,
    pool: Arc<FoodPool>,
    running: RunningFlag,
    clock: Arc<dyn Clock>,
    positions: Box<dyn PositionSource>,
    bounds: WorldBounds,
    population: PopulationConfig,
    agents: AgentConfig,
    food: FoodConfig,
    scare: ScareConfig,
    last_scare_at: Instant,
    indicator: Option<(ScareIndicator, Instant)>,
    tick: u64,
    started: bool,
    shut_down: bool,
}

impl Flock {
    /// Build a flock from configuration.
    ///
    /// Places `population.pigeon_count` sleeping pigeons at random positions
    /// with random speeds. No worker is started until [`start`](Self::start).
    /// Until then the scare interval is measured from this call.
    ///
    /// # Errors
    ///
    /// Returns [`FlockError::Config`] if the configuration does not validate.
    pub fn new(
        config: &SimulationConfig,
        mut positions: Box<dyn PositionSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FlockError> {
        config.validate()?;

        let bounds = config.world.bounds();
        let pool = Arc::new(FoodPool::new());
        let running = RunningFlag::new();

        let pigeons = (0..config.population.pigeon_count)
            .map(|_| {
                let position = positions.position(&bounds);
                let speed =
                    positions.speed(config.population.min_speed, config.population.max_speed);
                Pigeon::new(
                    position,
                    speed,
                    Arc::clone(&pool),
                    running.clone(),
                    config.agents.clone(),
                )
            })
            .collect();

        let last_scare_at = clock.now();
        Ok(Self {
            pigeons,
            pool,
            running,
            clock,
            positions,
            bounds,
            population: config.population.clone(),
            agents: config.agents.clone(),
            food: config.food.clone(),
            scare: config.scare.clone(),
            last_scare_at,
            indicator: None,
            tick: 0,
            started: false,
            shut_down: false,
        })
    }

    /// Start every pigeon's worker thread.
    ///
    /// The scare interval restarts here, so the first timed scare comes one
    /// full interval after the simulation starts.
    ///
    /// # Errors
    ///
    /// Returns [`FlockError::Agent`] if a worker cannot be spawned. Pigeons
    /// started before the failure keep running until shutdown.
    pub fn start(&mut self) -> Result<(), FlockError> {
        if self.started || self.shut_down {
            return Ok(());
        }
        for pigeon in &self.pigeons {
            pigeon.start()?;
        }
        self.started = true;
        self.last_scare_at = self.clock.now();
        info!(pigeons = self.pigeons.len(), "flock started");
        Ok(())
    }

    /// Add a pigeon at a chosen position and speed.
    ///
    /// The pigeon starts immediately if the flock is already running.
    ///
    /// # Errors
    ///
    /// Returns [`FlockError::Agent`] if its worker cannot be spawned.
    pub fn spawn_pigeon(&mut self, position: Position, speed: f32) -> Result<PigeonId, FlockError> {
        let pigeon = Pigeon::new(
            position,
            speed,
            Arc::clone(&self.pool),
            self.running.clone(),
            self.agents.clone(),
        );
        if self.started && !self.shut_down {
            pigeon.start()?;
        }
        let id = pigeon.id();
        self.pigeons.push(pigeon);
        Ok(id)
    }

    /// Drop food at `position` and wake every pigeon.
    ///
    /// All pigeons wake regardless of distance; scared pigeons ignore the
    /// wake call.
    pub fn add_resource(&self, position: Position) -> FoodId {
        let id = self.pool.add(FoodItem::new(position, self.clock.now()));
        for pigeon in &self.pigeons {
            let _ = pigeon.wake();
        }
        debug!(food = %id, x = position.x, y = position.y, "food added, flock woken");
        id
    }

    /// Fire a scare at a random point in the world.
    pub fn trigger_scare(&mut self) -> ScareEvent {
        let epicenter = self.positions.position(&self.bounds);
        self.scare_at(epicenter)
    }

    /// Scare every pigeon within the scare radius of `epicenter`.
    ///
    /// The radius test is inclusive. Also shows the scare indicator.
    pub fn scare_at(&mut self, epicenter: Position) -> ScareEvent {
        let radius = self.scare.radius;
        let mut scared = 0_usize;
        for pigeon in &self.pigeons {
            if pigeon.position().distance_to(epicenter) <= radius {
                pigeon.scare(epicenter);
                scared = scared.saturating_add(1);
            }
        }

        self.indicator = Some((ScareIndicator { epicenter, radius }, self.clock.now()));
        info!(x = epicenter.x, y = epicenter.y, radius, scared, "scare fired");
        ScareEvent {
            epicenter,
            radius,
            scared,
        }
    }

    /// Advance coordinator time by one tick.
    ///
    /// Ages every food item, fires a scare if the scare interval has
    /// elapsed since the last timed scare (or since creation), and reports
    /// whether the scare indicator is still visible.
    pub fn tick(&mut self) -> TickReport {
        self.tick = self.tick.saturating_add(1);
        let now = self.clock.now();

        let stale_food = self.pool.refresh_staleness(now, self.food.stale_after());

        let scare = if now.saturating_duration_since(self.last_scare_at) >= self.scare.interval() {
            self.last_scare_at = now;
            Some(self.trigger_scare())
        } else {
            None
        };

        TickReport {
            tick: self.tick,
            stale_food,
            scare,
            indicator: self.active_indicator(),
        }
    }

    /// The scare marker, while it is still within its display window.
    pub fn active_indicator(&self) -> Option<ScareIndicator> {
        let now = self.clock.now();
        self.indicator
            .filter(|(_, fired_at)| now.saturating_duration_since(*fired_at) < self.scare.indicator())
            .map(|(indicator, _)| indicator)
    }

    /// Copy the current state for a renderer.
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            tick: self.tick,
            captured_at: Utc::now(),
            pigeons: self.pigeons.iter().map(Pigeon::view).collect(),
            food: self.pool.views(),
            scare: self.active_indicator(),
        }
    }

    /// Stop all pigeons and wait for their workers to exit. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.running.stop();
        for pigeon in &self.pigeons {
            pigeon.stop();
        }
        info!(pigeons = self.pigeons.len(), ticks = self.tick, "flock shut down");
    }

    /// Whether no pigeon worker is executing.
    pub fn all_workers_stopped(&self) -> bool {
        self.pigeons.iter().all(|p| !p.is_worker_alive())
    }

    /// All pigeons, in creation order.
    pub fn pigeons(&self) -> &[Pigeon] {
        &self.pigeons
    }

    /// The shared food pool.
    pub const fn pool(&self) -> &Arc<FoodPool> {
        &self.pool
    }

    /// The flag every worker polls.
    pub const fn running(&self) -> &RunningFlag {
        &self.running
    }

    /// The world rectangle.
    pub const fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// The population settings the flock was built with.
    pub const fn population(&self) -> &PopulationConfig {
        &self.population
    }

    /// Number of ticks run so far.
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub const fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl Drop for Flock {
    fn drop(&mut self) {
        self.shutdown();
    }
}
