//! Drawing the map: input handling, the per-frame [`Viewer`] and the async
//! [`RenderLoop`] driving it.

mod input;
mod runner;
mod snapshot;
mod viewer;

use thiserror::Error;

pub use tiny_skia::Pixmap;

pub use input::{starts_drag, wheel_motion, InputEvent, Modifiers, PointerButton, WheelConfig};
pub use runner::{FrameSink, RenderLoop, INPUT_CAPACITY};
pub use snapshot::{save_frame, to_rgba_image};
pub use viewer::{DebugInfo, Hover, RenderConfig, Viewer, ViewerConfig};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} drawing surface")]
    Surface { width: u32, height: u32 },

    #[error("failed to write frame: {0}")]
    Image(#[from] image::ImageError),
}
