//! Quadtree decomposition of world space into level-of-detail tiles.
//!
//! The root square is split breadth-first into four equal quadrants, ordered
//! `(min, min)`, `(mid, min)`, `(min, mid)`, `(mid, mid)`. Coarse nodes are
//! always yielded before any of their children, so a renderer drawing tiles
//! in order paints finer detail over coarser fallbacks.

mod outline;

pub use outline::{decode_outline, EntityOutline, OutlineError, Segment};

use std::collections::VecDeque;

use crate::coord::{lod_to_size, TileLayout, BASE_TILE_SIZE};
use crate::geometry::Box2D;

/// Limits for viewport-driven tile selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilingConfig {
    /// Nodes smaller than this on screen are not split further.
    pub min_tile_px: f64,
    /// Maximum number of tiles returned per selection.
    pub max_tiles: usize,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            min_tile_px: 256.0,
            max_tiles: 100,
        }
    }
}

/// Integer address of a square tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileAddress {
    pub lod: u32,
    pub x: u32,
    pub y: u32,
}

impl TileAddress {
    /// Address of an aligned tile box, or `None` for boxes no tile can have.
    pub fn from_box(bounds: &Box2D) -> Option<Self> {
        let lod = tile_lod(bounds)?;
        let size = lod_to_size(lod) as f64;
        let x = bounds.min_x / size;
        let y = bounds.min_y / size;
        if x < 0.0 || y < 0.0 || x.fract() != 0.0 || y.fract() != 0.0 {
            return None;
        }
        if x > f64::from(u32::MAX) || y > f64::from(u32::MAX) {
            return None;
        }
        Some(Self {
            lod,
            x: x as u32,
            y: y as u32,
        })
    }

    pub fn bounds(&self) -> Box2D {
        crate::coord::tile_box(self.lod, self.x, self.y)
    }
}

/// Square covering the whole grid, `(0,0)-(N,N)`.
pub fn root_box(layout: &TileLayout) -> Box2D {
    layout.root_box()
}

/// `log2(width / BASE_TILE_SIZE)`; integral for every tile box.
pub fn level_of_detail(bounds: &Box2D) -> f64 {
    (bounds.width() / f64::from(BASE_TILE_SIZE)).log2()
}

/// Level of detail as an integer, if the box is a whole tile size.
pub fn tile_lod(bounds: &Box2D) -> Option<u32> {
    let lod = level_of_detail(bounds);
    if lod.is_finite() && lod >= 0.0 && lod.fract() == 0.0 {
        Some(lod as u32)
    } else {
        None
    }
}

/// Breadth-first quadtree traversal; see [`decompose`].
#[derive(Debug, Clone)]
pub struct Decompose<F> {
    queue: VecDeque<Box2D>,
    should_split: F,
}

impl<F> Iterator for Decompose<F>
where
    F: FnMut(&Box2D) -> bool,
{
    type Item = Box2D;

    fn next(&mut self) -> Option<Box2D> {
        let node = self.queue.pop_front()?;
        let size = node.width();
        if size > 1.0 && (self.should_split)(&node) {
            let half = size / 2.0;
            let (x, y) = (node.min_x, node.min_y);
            self.queue.extend([
                Box2D::from_values(x, y, x + half, y + half),
                Box2D::from_values(x + half, y, x + size, y + half),
                Box2D::from_values(x, y + half, x + half, y + size),
                Box2D::from_values(x + half, y + half, x + size, y + size),
            ]);
        }
        Some(node)
    }
}

/// Yields `root`, then recursively the quadrants of every node for which
/// `should_split` returns true, breadth first. Nodes of side 1 never split.
pub fn decompose<F>(root: Box2D, should_split: F) -> Decompose<F>
where
    F: FnMut(&Box2D) -> bool,
{
    Decompose {
        queue: VecDeque::from([root]),
        should_split,
    }
}

/// Tiles needed to draw `viewport`, coarsest first.
///
/// Only tiles overlapping the grid part of the viewport are returned. A tile
/// is refined while it stays at least `min_tile_px` wide on screen and is
/// larger than a base tile.
pub fn required_tiles(
    viewport: &Box2D,
    layout: &TileLayout,
    pixels_per_world_unit: f64,
    config: &TilingConfig,
) -> impl Iterator<Item = Box2D> {
    let bounds = viewport.intersection(&layout.root_box());
    let min_tile_px = config.min_tile_px;
    let base = f64::from(BASE_TILE_SIZE);
    let root = if bounds.is_empty() {
        None
    } else {
        Some(layout.tiling_root())
    };

    root.into_iter()
        .flat_map(move |root| {
            decompose(root, move |node| {
                node.overlaps(&bounds)
                    && node.width() > base
                    && node.width() * pixels_per_world_unit >= min_tile_px
            })
        })
        .filter(move |node| node.overlaps(&bounds))
        .inspect(|node| debug_assert!(level_of_detail(node) >= 0.0, "tile below base size"))
        .take(config.max_tiles)
}
