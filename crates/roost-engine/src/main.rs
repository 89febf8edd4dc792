//! Headless engine binary for the Roost pigeon simulation.
//!
//! Wires the flock coordinator to its outer collaborators: configuration,
//! logging, stdin/Ctrl-C input and a frame renderer. Runs the tick loop
//! until an input asks it to stop or a configured limit is hit, then shuts
//! every pigeon down before exiting.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `roost-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the flock with seeded random placement
//! 4. Start the stdin reader and the Ctrl-C listener
//! 5. Run the simulation loop
//! 6. Log the result

mod error;
mod input;
mod render;

use std::path::Path;
use std::sync::Arc;

use roost_core::{Flock, MonotonicClock, RunBounds, SeededPositions, SimulationConfig, runner};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Capacity of the inbound event queue.
const INPUT_QUEUE: usize = 256;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config = SimulationConfig::load_or_default(Path::new("roost-config.yaml"))?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        width = config.world.width,
        height = config.world.height,
        seed = config.world.seed,
        pigeons = config.population.pigeon_count,
        tick_interval_ms = config.simulation.tick_interval_ms,
        renderer = ?config.renderer.mode,
        "roost-engine starting"
    );

    // 3. Build the flock.
    let positions = SeededPositions::new(config.world.seed);
    let mut flock = Flock::new(&config, Box::new(positions), Arc::new(MonotonicClock))?;
    info!(pigeons = flock.pigeons().len(), "Flock created");

    // 4. Input sources.
    let (tx, mut rx) = mpsc::channel(INPUT_QUEUE);
    input::spawn_stdin_reader(tx.clone())?;
    input::spawn_ctrl_c(tx);
    info!("Listening for `food <x> <y>` / `quit` on stdin");

    // 5. Run the simulation.
    let mut renderer =
        render::build_renderer(config.renderer.mode, config.logging.frame_log_every);
    let bounds = RunBounds::from_config(&config.simulation);
    let result = runner::run_simulation(&mut flock, &mut rx, renderer.as_mut(), &bounds).await?;

    // 6. Log results.
    runner::log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "roost-engine shutdown complete"
    );

    Ok(())
}
