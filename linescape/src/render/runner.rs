//! Async frame driver.
//!
//! `RenderLoop` owns a [`Viewer`] and a drawing surface. Each interval tick
//! it applies queued input, runs one viewer tick and hands the frame to a
//! [`FrameSink`]. Cancelling the shutdown token ends the loop after the
//! current frame and releases every outstanding tile.

use tiny_skia::Pixmap;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::input::InputEvent;
use super::viewer::{DebugInfo, Viewer};
use super::RenderError;

/// Input events buffered between frames.
pub const INPUT_CAPACITY: usize = 256;

/// Receives finished frames.
pub trait FrameSink: Send {
    fn present(&mut self, frame: &Pixmap, info: &DebugInfo);
}

impl<F> FrameSink for F
where
    F: FnMut(&Pixmap, &DebugInfo) + Send,
{
    fn present(&mut self, frame: &Pixmap, info: &DebugInfo) {
        self(frame, info)
    }
}

pub struct RenderLoop {
    viewer: Viewer,
    surface: Pixmap,
    input_rx: mpsc::Receiver<InputEvent>,
    sink: Box<dyn FrameSink>,
}

impl RenderLoop {
    /// Creates a loop drawing `width × height` frames, plus the sender used to
    /// feed it input.
    pub fn new(
        viewer: Viewer,
        width: u32,
        height: u32,
        sink: Box<dyn FrameSink>,
    ) -> Result<(Self, mpsc::Sender<InputEvent>), RenderError> {
        let surface = Pixmap::new(width, height).ok_or(RenderError::Surface { width, height })?;
        let (input_tx, input_rx) = mpsc::channel(INPUT_CAPACITY);
        let render_loop = Self {
            viewer,
            surface,
            input_rx,
            sink,
        };
        Ok((render_loop, input_tx))
    }

    /// Runs until `shutdown` is cancelled or every input sender is dropped.
    /// Returns the viewer, with all requirements released, and the number of
    /// frames drawn.
    pub async fn run(mut self, shutdown: CancellationToken) -> (Viewer, u64) {
        let frame_interval = self.viewer.render_config().frame_interval;
        info!(
            width = self.surface.width(),
            height = self.surface.height(),
            interval_ms = frame_interval.as_millis() as u64,
            "Render loop started"
        );

        let mut ticker = interval(frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frames = 0u64;
        let mut input_open = true;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                event = self.input_rx.recv(), if input_open => match event {
                    Some(event) => self.apply(event),
                    None => {
                        debug!("Input channel closed");
                        input_open = false;
                    }
                },

                _ = ticker.tick() => {
                    let info = self.viewer.tick(&mut self.surface);
                    self.sink.present(&self.surface, &info);
                    frames += 1;
                }
            }
        }

        self.viewer.shutdown();
        info!(frames, "Render loop stopped");
        (self.viewer, frames)
    }

    fn apply(&mut self, event: InputEvent) {
        if let InputEvent::Resize { width, height } = event {
            let (w, h) = (width.round().max(1.0) as u32, height.round().max(1.0) as u32);
            match Pixmap::new(w, h) {
                Some(surface) => self.surface = surface,
                None => warn!(width = w, height = h, "Ignoring resize to unusable surface"),
            }
        }
        self.viewer.handle_input(event);
    }
}
