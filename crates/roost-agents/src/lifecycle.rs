//! Process-wide running flag.
//!
//! The coordinator owns one [`RunningFlag`] and hands a clone to every
//! pigeon. Workers poll it at the top of each cycle; the coordinator
//! clears it once at shutdown. Acquire/release ordering makes the clear
//! visible to every worker without any further locking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "keep going" signal for all pigeon workers.
#[derive(Debug, Clone)]
pub struct RunningFlag(Arc<AtomicBool>);

impl RunningFlag {
    /// Create a flag in the running state.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Whether the simulation is still running.
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Signal every holder of this flag to stop.
    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for RunningFlag {
    fn default() -> Self {
        Self::new()
    }
}
