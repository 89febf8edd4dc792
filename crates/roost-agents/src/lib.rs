//! Pigeon behaviour and worker lifecycle for the Roost simulation.
//!
//! This crate owns everything that runs on a pigeon's own thread. It sits
//! between `roost-world` (the shared food pool it reads and consumes) and
//! `roost-core` (the coordinator that spawns, scares and stops pigeons).
//!
//! # Modules
//!
//! - [`agent`] -- The pigeon state machine and worker thread ([`Pigeon`])
//! - [`config`] -- Perception, movement and scheduling tunables ([`AgentConfig`])
//! - [`error`] -- Error types for agent operations ([`AgentError`])
//! - [`lifecycle`] -- The shared stop signal ([`RunningFlag`])

pub mod agent;
pub mod config;
pub mod error;
pub mod lifecycle;

pub use agent::{CycleOutcome, Pigeon};
pub use config::AgentConfig;
pub use error::AgentError;
pub use lifecycle::RunningFlag;
