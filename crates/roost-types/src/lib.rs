//! Shared type definitions for the Roost pigeon simulation.
//!
//! This crate holds the plain data types every other crate agrees on:
//! identifiers, geometry, the pigeon mode enum, and the frame snapshot the
//! renderer consumes.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for pigeons and food items
//! - [`enums`] -- [`PigeonMode`]
//! - [`geometry`] -- [`Vec2`] / [`Position`] and [`WorldBounds`]
//! - [`snapshot`] -- Per-frame read-only views for renderers

pub mod enums;
pub mod geometry;
pub mod ids;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use enums::PigeonMode;
pub use geometry::{Position, Vec2, WorldBounds};
pub use ids::{FoodId, PigeonId};
pub use snapshot::{FoodView, FrameSnapshot, PigeonView, ScareIndicator};
