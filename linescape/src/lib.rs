//! Linescape - every line of a Git repository as a zoomable 2D map
//!
//! Each source line of a repository snapshot occupies one cell of a square
//! grid, laid out along a space-filling curve so nearby lines stay nearby.
//! Per-cell metrics are fetched from a tile server in level-of-detail tiles,
//! colorized, and drawn under a pan/zoom camera.
//!
//! Pipeline, leaf first:
//!
//! ```text
//! geometry ─► curve ─► coord ─► quadtree ──┐
//!                        camera ───────────┼─► render (Viewer, RenderLoop)
//!              fetch ─► composite ─────────┘
//! ```

pub mod camera;
pub mod composite;
pub mod config;
pub mod coord;
pub mod curve;
pub mod fetch;
pub mod geometry;
pub mod index;
pub mod layer;
pub mod logging;
pub mod quadtree;
pub mod render;

pub use camera::{Camera, CameraConfig};
pub use coord::{TileLayout, BASE_TILE_SIZE};
pub use geometry::Box2D;
pub use index::{FileIndex, IndexEntry};
pub use layer::VisualizationLayer;
pub use render::{RenderLoop, Viewer, ViewerConfig};
