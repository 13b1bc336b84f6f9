//! Exporting frames as images.

use std::path::Path;

use image::{Rgba, RgbaImage};
use tiny_skia::Pixmap;

use super::RenderError;

/// Converts a premultiplied frame to a straight-alpha image.
pub fn to_rgba_image(frame: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(frame.width(), frame.height());
    for (dst, src) in image.pixels_mut().zip(frame.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}

/// Writes a frame to `path`; the format follows the extension.
pub fn save_frame(frame: &Pixmap, path: &Path) -> Result<(), RenderError> {
    to_rgba_image(frame).save(path)?;
    Ok(())
}
