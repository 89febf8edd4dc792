//! Flock coordination, configuration, and the tick loop for the Roost
//! simulation.
//!
//! This crate owns the single-threaded side of the simulation: it builds
//! the flock, feeds it input, ages food, fires scares and hands frames to
//! a renderer. The pigeons themselves run on their own threads (see
//! `roost-agents`).
//!
//! # Modules
//!
//! - [`clock`] -- Injected monotonic time ([`Clock`], [`ManualClock`])
//! - [`config`] -- Configuration loading from `roost-config.yaml` into
//!   strongly-typed structs.
//! - [`flock`] -- The coordinator ([`Flock`])
//! - [`random`] -- Random placement ([`PositionSource`], [`SeededPositions`])
//! - [`render`] -- The [`Renderer`] boundary trait
//! - [`runner`] -- The async tick loop ([`run_simulation`])
//!
//! [`Clock`]: clock::Clock
//! [`ManualClock`]: clock::ManualClock
//! [`Flock`]: flock::Flock
//! [`PositionSource`]: random::PositionSource
//! [`SeededPositions`]: random::SeededPositions
//! [`Renderer`]: render::Renderer
//! [`run_simulation`]: runner::run_simulation

pub mod clock;
pub mod config;
pub mod flock;
pub mod random;
pub mod render;
pub mod runner;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{ConfigError, RenderMode, SimulationConfig};
pub use flock::{Flock, FlockError, ScareEvent, TickReport};
pub use random::{PositionSource, SeededPositions};
pub use render::{NoOpRenderer, RenderError, Renderer};
pub use runner::{
    InputEvent, RunBounds, RunnerError, SimulationEndReason, SimulationResult, log_simulation_end,
    run_simulation,
};
