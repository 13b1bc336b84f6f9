//! `linescape locate`: coordinate conversions.
//!
//! ```text
//! linescape locate --lines 100000 line 4242
//! linescape locate --index index.json cell 17 90 --lod 1
//! linescape locate --lines 100000 tile 0 1 2
//! ```

use clap::{Args, Subcommand, ValueEnum};
use linescape::coord::{
    line_to_world, tile_box, tile_to_world, world_to_line, world_to_tile, TilePosition,
    WorldPosition,
};
use linescape::curve::CurveKind;
use linescape::{FileIndex, TileLayout};

use super::common::LayoutArgs;
use crate::error::CliError;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Curve {
    /// Hilbert curve (what tile servers use)
    #[default]
    Hilbert,
    /// Z-order curve
    Morton,
}

impl From<Curve> for CurveKind {
    fn from(curve: Curve) -> Self {
        match curve {
            Curve::Hilbert => CurveKind::Hilbert,
            Curve::Morton => CurveKind::Morton,
        }
    }
}

#[derive(Debug, Args)]
pub struct LocateArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Space-filling curve mapping lines to cells
    #[arg(long, value_enum, default_value_t = Curve::Hilbert)]
    pub curve: Curve,

    #[command(subcommand)]
    pub target: LocateTarget,
}

#[derive(Debug, Subcommand)]
pub enum LocateTarget {
    /// Where a line lands on the grid
    Line {
        line: u64,
        /// Level of detail of the reported tile
        #[arg(long, default_value = "0")]
        lod: u32,
    },

    /// Which line occupies a grid cell
    Cell {
        x: u32,
        y: u32,
        /// Level of detail of the reported tile
        #[arg(long, default_value = "0")]
        lod: u32,
    },

    /// The cells and lines a tile covers
    Tile { lod: u32, x: u32, y: u32 },
}

pub fn run(args: LocateArgs) -> Result<(), CliError> {
    let (layout, index) = args.layout.load()?;
    let layout = TileLayout::with_curve(layout.line_count(), args.curve.into());

    for line in describe(&layout, index.as_ref(), &args.target)? {
        println!("{}", line);
    }
    Ok(())
}

/// The report for `target`, one output line per entry.
fn describe(
    layout: &TileLayout,
    index: Option<&FileIndex>,
    target: &LocateTarget,
) -> Result<Vec<String>, CliError> {
    let mut out = vec![format!(
        "grid {}x{} ({} lines, order {})",
        layout.grid_side(),
        layout.grid_side(),
        layout.line_count(),
        layout.curve_order()
    )];

    match *target {
        LocateTarget::Line { line, lod } => {
            let world = line_to_world(line, layout)?;
            out.push(line_report(line, layout, index));
            out.push(format!("cell {}", world));
            out.push(format!("tile {}", world_to_tile(world, lod)?));
        }
        LocateTarget::Cell { x, y, lod } => {
            let world = WorldPosition::new(x, y);
            let line = world_to_line(world, layout)?;
            out.push(format!("cell {}", world));
            out.push(line_report(line, layout, index));
            out.push(format!("tile {}", world_to_tile(world, lod)?));
        }
        LocateTarget::Tile { lod, x, y } => {
            let bounds = tile_box(lod, x, y);
            out.push(format!("tile lod {} ({}, {}) covers {}", lod, x, y, bounds));
            let corner = tile_to_world(&TilePosition {
                lod,
                tile_x: x,
                tile_y: y,
                offset_x: 0,
                offset_y: 0,
            })?;
            match world_to_line(corner, layout) {
                Ok(line) => {
                    out.push(format!("corner cell {}", corner));
                    out.push(line_report(line, layout, index));
                }
                Err(_) => out.push("tile lies outside the grid".to_string()),
            }
        }
    }
    Ok(out)
}

fn line_report(line: u64, layout: &TileLayout, index: Option<&FileIndex>) -> String {
    if line >= layout.line_count() {
        return format!("line {} (unused, past the last line)", line);
    }
    let entry = index.and_then(|index| index.entry_for_line(line));
    match entry {
        Some(entry) => format!(
            "line {} ({}:{})",
            line,
            entry.path,
            line - entry.line_offset + 1
        ),
        None => format!("line {}", line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linescape::coord::CoordError;
    use linescape::IndexEntry;

    fn index() -> FileIndex {
        FileIndex::new(vec![
            IndexEntry {
                path: "src/main.rs".to_string(),
                line_offset: 0,
                line_count: 3,
                hash: None,
            },
            IndexEntry {
                path: "src/lib.rs".to_string(),
                line_offset: 3,
                line_count: 5,
                hash: None,
            },
        ])
    }

    #[test]
    fn test_line_reports_cell_and_tile() {
        let layout = TileLayout::new(16);
        let out = describe(&layout, None, &LocateTarget::Line { line: 2, lod: 0 }).unwrap();
        assert_eq!(out[0], "grid 4x4 (16 lines, order 2)");
        assert_eq!(out[1], "line 2");
        assert_eq!(out[2], "cell (1, 1)");
        assert_eq!(out[3], "tile lod 0 tile (0, 0) + (1, 1)");
    }

    #[test]
    fn test_cell_resolves_file_and_line_number() {
        let layout = TileLayout::new(8);
        let world = line_to_world(4, &layout).unwrap();
        let target = LocateTarget::Cell {
            x: world.x,
            y: world.y,
            lod: 0,
        };
        let out = describe(&layout, Some(&index()), &target).unwrap();
        assert_eq!(out[2], "line 4 (src/lib.rs:2)");
    }

    #[test]
    fn test_unused_cell_is_marked() {
        let layout = TileLayout::new(10);
        let world = line_to_world(12, &layout).unwrap();
        let target = LocateTarget::Cell {
            x: world.x,
            y: world.y,
            lod: 0,
        };
        let out = describe(&layout, None, &target).unwrap();
        assert_eq!(out[2], "line 12 (unused, past the last line)");
    }

    #[test]
    fn test_line_outside_grid_is_an_error() {
        let layout = TileLayout::new(16);
        let result = describe(&layout, None, &LocateTarget::Line { line: 16, lod: 0 });
        assert!(matches!(
            result,
            Err(CliError::Coord(CoordError::LineOutOfRange { line: 16, .. }))
        ));
    }

    #[test]
    fn test_tile_outside_grid() {
        let layout = TileLayout::new(16);
        let out = describe(&layout, None, &LocateTarget::Tile { lod: 0, x: 1, y: 0 }).unwrap();
        assert_eq!(out.last().unwrap(), "tile lies outside the grid");
    }
}
