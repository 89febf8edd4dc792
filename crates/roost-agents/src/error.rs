//! Error types for the roost-agents crate.
//!
//! Almost nothing a pigeon does can fail: a lost race for food or a
//! degenerate distance is a skipped action, not an error. What remains is
//! configuration that cannot drive the state machine and the OS refusing
//! to give us a worker thread.

use roost_types::PigeonId;

/// Errors that can occur while configuring or starting pigeons.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The worker thread for a pigeon could not be spawned.
    #[error("failed to spawn worker thread for pigeon {pigeon}: {source}")]
    Spawn {
        /// The pigeon whose worker failed to start.
        pigeon: PigeonId,
        /// The underlying OS error.
        source: std::io::Error,
    },

    /// Agent configuration is unusable.
    #[error("invalid agent configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}
