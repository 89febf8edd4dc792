//! The renderer boundary.
//!
//! The runner hands a [`FrameSnapshot`] to a [`Renderer`] once per tick.
//! Renderer failures are reported back as [`RenderError`] so the runner
//! can log them; they never stop the simulation.

use roost_types::FrameSnapshot;

/// Errors a renderer may report for a single frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Writing the frame failed.
    #[error("failed to write frame: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Encoding the frame failed.
    #[error("failed to encode frame: {source}")]
    Encode {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Consumer of per-tick frame snapshots.
pub trait Renderer: Send {
    /// Present one frame.
    fn render(&mut self, frame: &FrameSnapshot) -> Result<(), RenderError>;
}

/// A renderer that discards every frame.
#[derive(Debug, Default)]
pub struct NoOpRenderer;

impl Renderer for NoOpRenderer {
    fn render(&mut self, _frame: &FrameSnapshot) -> Result<(), RenderError> {
        Ok(())
    }
}
