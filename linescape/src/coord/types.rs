//! Coordinate type definitions

use std::fmt;

use thiserror::Error;

use crate::curve::CurveKind;
use crate::geometry::Box2D;
use crate::index::IndexEntry;

/// Side length, in grid cells, of a tile at level of detail 0.
pub const BASE_TILE_SIZE: u32 = 128;

/// Zero-based index of a source line across the whole snapshot.
pub type LinePosition = u64;

/// Integer grid cell in `[0, N)²`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WorldPosition {
    pub x: u32,
    pub y: u32,
}

impl WorldPosition {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for WorldPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A grid cell expressed as a tile at some level of detail plus an offset
/// inside that tile.
///
/// The tile side at `lod` is `BASE_TILE_SIZE << lod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TilePosition {
    pub lod: u32,
    pub tile_x: u32,
    pub tile_y: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

impl fmt::Display for TilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lod {} tile ({}, {}) + ({}, {})",
            self.lod, self.tile_x, self.tile_y, self.offset_x, self.offset_y
        )
    }
}

/// Errors from coordinate conversions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    #[error("line {line} is outside the {capacity}-cell grid")]
    LineOutOfRange { line: LinePosition, capacity: u64 },

    #[error("world position {position} is outside the {side}×{side} grid")]
    WorldOutOfRange { position: WorldPosition, side: u64 },

    #[error("level of detail {0} is too large")]
    InvalidLod(u32),
}

/// Errors building a layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// An index with no files cannot be laid out at all.
    #[error("index contains no entities")]
    NoEntities,
}

/// Size of the visualized snapshot; fixed for one (repository, commit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileLayout {
    line_count: u64,
    curve: CurveKind,
    order: u32,
}

impl TileLayout {
    /// Creates a Hilbert-ordered layout for `line_count` lines.
    pub fn new(line_count: u64) -> Self {
        Self::with_curve(line_count, CurveKind::default())
    }

    pub fn with_curve(line_count: u64, curve: CurveKind) -> Self {
        Self {
            line_count,
            curve,
            order: order_for(line_count),
        }
    }

    /// Derives the layout from index entries. The last entry ends the snapshot.
    pub fn from_entries(entries: &[IndexEntry]) -> Result<Self, LayoutError> {
        let last = entries.last().ok_or(LayoutError::NoEntities)?;
        Ok(Self::new(last.line_end()))
    }

    pub fn line_count(&self) -> u64 {
        self.line_count
    }

    pub fn curve(&self) -> CurveKind {
        self.curve
    }

    /// Curve order `k`; the grid is `2^k` cells per side.
    pub fn curve_order(&self) -> u32 {
        self.order
    }

    /// Side `N` of the smallest power-of-two square with at least
    /// `line_count` cells. Zero and one line both give `N = 1`.
    pub fn grid_side(&self) -> u64 {
        1u64 << self.order
    }

    /// Number of cells in the grid, `N²`, saturating at `u64::MAX`.
    pub fn capacity(&self) -> u64 {
        1u64.checked_shl(2 * self.order).unwrap_or(u64::MAX)
    }

    /// World-space square `(0,0)-(N,N)`.
    pub fn root_box(&self) -> Box2D {
        let n = self.grid_side() as f64;
        Box2D::from_values(0.0, 0.0, n, n)
    }

    /// Square the tile quadtree starts from. Never smaller than one base
    /// tile, so every tile it yields has a non-negative level of detail.
    pub fn tiling_root(&self) -> Box2D {
        let side = self.grid_side().max(u64::from(BASE_TILE_SIZE)) as f64;
        Box2D::from_values(0.0, 0.0, side, side)
    }

    /// Grid cell under a world-space point, if the point is on the grid.
    pub fn world_at(&self, x: f64, y: f64) -> Option<WorldPosition> {
        let n = self.grid_side() as f64;
        if !(x >= 0.0 && y >= 0.0 && x < n && y < n) {
            return None;
        }
        Some(WorldPosition::new(x.floor() as u32, y.floor() as u32))
    }
}

/// Smallest `k` with `4^k >= line_count`.
fn order_for(line_count: u64) -> u32 {
    let mut order = 0u32;
    while order < crate::curve::MAX_ORDER && (1u128 << (2 * order)) < u128::from(line_count) {
        order += 1;
    }
    order
}
