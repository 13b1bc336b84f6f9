//! Colorizing raw metric tiles into bitmaps.

mod color;
mod compositor;
mod mode;

pub use color::{float_to_byte, Oklch};
pub use compositor::{colorize, CompositeRequest, CompositorStats, TileCompositor};
pub use mode::{fmix32, CompositeMode, CompositeModeError, BACKGROUND};
