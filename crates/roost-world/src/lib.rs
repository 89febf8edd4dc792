//! Food and the shared food pool for the Roost pigeon simulation.
//!
//! # Modules
//!
//! - [`resource`] -- [`FoodItem`]: position, freshness flag, creation time,
//!   and the one-way fresh-to-stale transition.
//! - [`pool`] -- [`FoodPool`]: the lock-protected collection shared by the
//!   coordinator (producer) and every pigeon worker (consumers).

pub mod pool;
pub mod resource;

// Re-export primary types at crate root.
pub use pool::{FoodPool, FoodSighting};
pub use resource::FoodItem;
