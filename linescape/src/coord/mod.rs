//! Coordinate conversion module
//!
//! Three spaces describe the same cell of the map:
//!
//! - **line**: position of a source line in index order,
//! - **world**: integer grid cell the space-filling curve assigns to the line,
//! - **tile**: the tile containing that cell at a given level of detail, plus
//!   the cell's offset inside the tile.

mod types;

pub use types::{
    CoordError, LayoutError, LinePosition, TileLayout, TilePosition, WorldPosition,
    BASE_TILE_SIZE,
};

use crate::curve::SpaceCurve;
use crate::geometry::Box2D;

/// Largest level of detail whose tile side still fits in a `u64`.
pub const MAX_LOD: u32 = 63 - BASE_TILE_SIZE.trailing_zeros();

/// Side length in cells of a tile at `lod`.
#[inline]
pub fn lod_to_size(lod: u32) -> u64 {
    u64::from(BASE_TILE_SIZE) << lod.min(MAX_LOD)
}

/// Maps a line to its grid cell.
///
/// Every index below `N²` is valid, including lines past `line_count` that
/// fill the unused tail of the grid.
#[inline]
pub fn line_to_world(line: LinePosition, layout: &TileLayout) -> Result<WorldPosition, CoordError> {
    if line >= layout.capacity() {
        return Err(CoordError::LineOutOfRange {
            line,
            capacity: layout.capacity(),
        });
    }
    let (x, y) = layout.curve().encode(line, layout.curve_order());
    Ok(WorldPosition::new(x, y))
}

/// Maps a grid cell back to its line.
#[inline]
pub fn world_to_line(world: WorldPosition, layout: &TileLayout) -> Result<LinePosition, CoordError> {
    let side = layout.grid_side();
    if u64::from(world.x) >= side || u64::from(world.y) >= side {
        return Err(CoordError::WorldOutOfRange {
            position: world,
            side,
        });
    }
    Ok(layout.curve().decode(world.x, world.y, layout.curve_order()))
}

/// Splits a grid cell into tile index and in-tile offset at `lod`.
pub fn world_to_tile(world: WorldPosition, lod: u32) -> Result<TilePosition, CoordError> {
    if lod > MAX_LOD {
        return Err(CoordError::InvalidLod(lod));
    }
    let size = lod_to_size(lod);
    let (x, y) = (u64::from(world.x), u64::from(world.y));
    Ok(TilePosition {
        lod,
        tile_x: (x / size) as u32,
        tile_y: (y / size) as u32,
        offset_x: (x % size) as u32,
        offset_y: (y % size) as u32,
    })
}

/// Inverse of [`world_to_tile`].
pub fn tile_to_world(tile: &TilePosition) -> Result<WorldPosition, CoordError> {
    if tile.lod > MAX_LOD {
        return Err(CoordError::InvalidLod(tile.lod));
    }
    let size = lod_to_size(tile.lod);
    let x = u64::from(tile.tile_x) * size + u64::from(tile.offset_x);
    let y = u64::from(tile.tile_y) * size + u64::from(tile.offset_y);
    match (u32::try_from(x), u32::try_from(y)) {
        (Ok(x), Ok(y)) => Ok(WorldPosition::new(x, y)),
        _ => Err(CoordError::InvalidLod(tile.lod)),
    }
}

/// World-space box covered by tile `(tile_x, tile_y)` at `lod`.
pub fn tile_box(lod: u32, tile_x: u32, tile_y: u32) -> Box2D {
    let size = lod_to_size(lod) as f64;
    let min_x = f64::from(tile_x) * size;
    let min_y = f64::from(tile_y) * size;
    Box2D::from_values(min_x, min_y, min_x + size, min_y + size)
}
