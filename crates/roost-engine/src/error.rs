//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and simulation execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: roost_core::ConfigError,
    },

    /// Building the flock failed.
    #[error("flock error: {source}")]
    Flock {
        /// The underlying flock error.
        #[from]
        source: roost_core::FlockError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: roost_core::RunnerError,
    },

    /// The stdin reader thread could not be started.
    #[error("input error: {source}")]
    Input {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
