//! Frame renderers for headless runs.
//!
//! - [`LogRenderer`] prints a one-line flock summary every N frames.
//! - [`JsonRenderer`] writes every frame as one JSON document per line.
//! - `none` uses [`NoOpRenderer`] from `roost-core`.

use std::io::Write;

use roost_core::{NoOpRenderer, RenderError, RenderMode, Renderer};
use roost_types::{FrameSnapshot, PigeonMode};
use tracing::info;

/// Summarizes the flock through `tracing` at a fixed frame interval.
#[derive(Debug)]
pub struct LogRenderer {
    every: u64,
}

impl LogRenderer {
    /// Log every `every`-th frame; 0 logs nothing.
    pub const fn new(every: u64) -> Self {
        Self { every }
    }

    /// Whether the frame for this tick is logged.
    const fn is_due(&self, tick: u64) -> bool {
        match tick.checked_rem(self.every) {
            Some(rem) => rem == 0,
            None => false,
        }
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &FrameSnapshot) -> Result<(), RenderError> {
        if self.is_due(frame.tick) {
            info!(
                tick = frame.tick,
                asleep = frame.count_in_mode(PigeonMode::Asleep),
                seeking = frame.count_in_mode(PigeonMode::Seeking),
                scared = frame.count_in_mode(PigeonMode::Scared),
                food = frame.food.len(),
                fresh_food = frame.fresh_food(),
                scare_active = frame.scare.is_some(),
                "frame"
            );
        }
        Ok(())
    }
}

/// Writes each frame as a JSON line.
#[derive(Debug)]
pub struct JsonRenderer<W> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    /// Render into `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Renderer for JsonRenderer<W> {
    fn render(&mut self, frame: &FrameSnapshot) -> Result<(), RenderError> {
        serde_json::to_writer(&mut self.out, frame)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Build the renderer selected in configuration.
pub fn build_renderer(mode: RenderMode, frame_log_every: u64) -> Box<dyn Renderer> {
    match mode {
        RenderMode::Log => Box::new(LogRenderer::new(frame_log_every)),
        RenderMode::Json => Box::new(JsonRenderer::new(std::io::stdout())),
        RenderMode::None => Box::new(NoOpRenderer),
    }
}
