//! Simulation loop runner.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that drives the coordinator tick loop:
//!
//! - **Input**: drain the inbound [`InputEvent`] queue once per tick
//! - **Tick**: age food and fire due scares via [`Flock::tick`]
//! - **Render**: hand a [`FrameSnapshot`] to the [`Renderer`]
//! - **Bounded simulation**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Clean shutdown**: stop and join every pigeon before returning
//!
//! [`FrameSnapshot`]: roost_types::FrameSnapshot

use std::time::{Duration, Instant};

use roost_types::Position;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::config::SimulationBoundsConfig;
use crate::flock::{Flock, FlockError, TickReport};
use crate::render::Renderer;

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The flock could not be started.
    #[error("flock error: {source}")]
    Flock {
        /// The underlying flock error.
        #[from]
        source: FlockError,
    },
}

/// An event from the outside world, polled once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Drop food at a world position.
    AddFood {
        /// Horizontal coordinate.
        x: f32,
        /// Vertical coordinate.
        y: f32,
    },
    /// End the simulation.
    Shutdown,
}

/// Why the simulation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// A [`InputEvent::Shutdown`] was received.
    ShutdownRequested,
    /// Every input sender was dropped.
    InputClosed,
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick report, if any tick completed.
    pub final_report: Option<TickReport>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Pacing and limits for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBounds {
    /// Pause between ticks.
    pub tick_interval: Duration,
    /// Stop after this many ticks (0 = unlimited).
    pub max_ticks: u64,
    /// Stop after this much wall-clock time.
    pub max_real_time: Option<Duration>,
}

impl RunBounds {
    /// Build from the `simulation` config section.
    pub const fn from_config(config: &SimulationBoundsConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            max_ticks: config.max_ticks,
            max_real_time: if config.max_real_time_seconds == 0 {
                None
            } else {
                Some(Duration::from_secs(config.max_real_time_seconds))
            },
        }
    }

    const fn tick_limit_reached(&self, ticks: u64) -> bool {
        self.max_ticks > 0 && ticks >= self.max_ticks
    }
}

/// Drain every queued input. Returns an end reason if one was seen.
fn drain_inputs(
    flock: &Flock,
    inputs: &mut mpsc::Receiver<InputEvent>,
) -> Option<SimulationEndReason> {
    loop {
        match inputs.try_recv() {
            Ok(InputEvent::AddFood { x, y }) => {
                let position = Position::new(x, y);
                if position.is_finite() {
                    let _ = flock.add_resource(position);
                } else {
                    warn!(x, y, "ignoring food at non-finite position");
                }
            }
            Ok(InputEvent::Shutdown) => return Some(SimulationEndReason::ShutdownRequested),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => return Some(SimulationEndReason::InputClosed),
        }
    }
}

/// Stop and join every pigeon from async context.
///
/// Joining blocks, so on a multi-threaded runtime the worker thread hands
/// its other tasks off first. A current-thread runtime has nowhere to hand
/// them, and `block_in_place` would panic there.
fn shutdown_flock(flock: &mut Flock) {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(|| flock.shutdown()),
        _ => flock.shutdown(),
    }
}

/// Run the simulation loop until a termination condition is met.
///
/// Starts the flock if it is not running yet. Whatever the end reason,
/// the flock is shut down (all pigeon workers joined) before this
/// returns.
///
/// # Errors
///
/// Returns [`RunnerError`] if the flock cannot be started.
pub async fn run_simulation(
    flock: &mut Flock,
    inputs: &mut mpsc::Receiver<InputEvent>,
    renderer: &mut dyn Renderer,
    bounds: &RunBounds,
) -> Result<SimulationResult, RunnerError> {
    if let Err(e) = flock.start() {
        shutdown_flock(flock);
        return Err(e.into());
    }

    let started = Instant::now();
    let mut last_report: Option<TickReport> = None;
    let mut total_ticks: u64 = 0;

    info!(
        pigeons = flock.pigeons().len(),
        max_ticks = bounds.max_ticks,
        max_real_time_seconds = bounds.max_real_time.map(|d| d.as_secs()),
        tick_interval_ms = u64::try_from(bounds.tick_interval.as_millis()).unwrap_or(u64::MAX),
        "Simulation starting"
    );

    let end_reason = loop {
        // --- Check time limit (before tick) ---
        if bounds.max_real_time.is_some_and(|limit| started.elapsed() >= limit) {
            info!(elapsed = ?started.elapsed(), "Real-time limit reached");
            break SimulationEndReason::MaxRealTimeReached;
        }

        // --- Poll input ---
        if let Some(reason) = drain_inputs(flock, inputs) {
            info!(?reason, "Input requested end of simulation");
            break reason;
        }

        // --- Execute tick ---
        let report = flock.tick();
        total_ticks = total_ticks.saturating_add(1);

        // --- Render ---
        if let Err(e) = renderer.render(&flock.snapshot()) {
            warn!(tick = report.tick, error = %e, "Renderer failed, frame skipped");
        }

        let tick = report.tick;
        last_report = Some(report);

        // --- Check tick limit (after tick) ---
        if bounds.tick_limit_reached(total_ticks) {
            info!(tick, max_ticks = bounds.max_ticks, "Tick limit reached");
            break SimulationEndReason::MaxTicksReached;
        }

        // --- Sleep for tick interval ---
        if !bounds.tick_interval.is_zero() {
            tokio::time::sleep(bounds.tick_interval).await;
        }
    };

    debug!("Shutting down flock");
    shutdown_flock(flock);

    Ok(SimulationResult {
        end_reason,
        final_report: last_report,
        total_ticks,
    })
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_report.as_ref().map(|r| r.tick),
        "Simulation ended"
    );

    if result.final_report.is_none() {
        warn!("Simulation ended with no ticks executed");
    }
}
