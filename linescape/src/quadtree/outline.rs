//! Decoding of per-entity quadtree bitmasks into drawable outlines.
//!
//! The server describes the cells of one file as a breadth-first quadtree.
//! Every visited node contributes one 4-bit mask, two masks per byte with the
//! low nibble first. Bits select child quadrants:
//!
//! | bit | quadrant           |
//! |-----|--------------------|
//! | 0   | `(min_x, min_y)`   |
//! | 1   | `(min_x, mid_y)`   |
//! | 2   | `(mid_x, mid_y)`   |
//! | 3   | `(mid_x, min_y)`   |
//!
//! A mask of zero marks a node that is entirely part of the file. Selected
//! children wider than one cell are queued for their own mask; single-cell
//! children are filled outright.

use std::collections::{BTreeMap, VecDeque};

use thiserror::Error;

use crate::geometry::Box2D;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutlineError {
    #[error("outline bitmask ended before node {node} was described")]
    Truncated { node: usize },

    #[error("grid side {0} is not a power of two")]
    InvalidGridSide(u64),
}

/// A straight boundary piece between file cells and everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

/// Cells covered by one file and the boundary around them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityOutline {
    pub cells: Vec<Box2D>,
    pub segments: Vec<Segment>,
}

impl EntityOutline {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Union of all filled cells.
    pub fn bounds(&self) -> Option<Box2D> {
        let (first, rest) = self.cells.split_first()?;
        Some(rest.iter().fold(*first, |acc, c| acc.union(c)))
    }
}

/// Filled square in integer grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Square {
    x: u64,
    y: u64,
    size: u64,
}

impl Square {
    fn child(&self, slot: u8) -> Square {
        let half = self.size / 2;
        let (dx, dy) = match slot {
            0 => (0, 0),
            1 => (0, half),
            2 => (half, half),
            _ => (half, 0),
        };
        Square {
            x: self.x + dx,
            y: self.y + dy,
            size: half,
        }
    }

    fn to_box(self) -> Box2D {
        Box2D::from_values(
            self.x as f64,
            self.y as f64,
            (self.x + self.size) as f64,
            (self.y + self.size) as f64,
        )
    }
}

/// Decodes a bitmask for a grid of side `grid_side`. An empty mask is an
/// empty outline.
pub fn decode_outline(bytes: &[u8], grid_side: u64) -> Result<EntityOutline, OutlineError> {
    if !grid_side.is_power_of_two() {
        return Err(OutlineError::InvalidGridSide(grid_side));
    }
    if bytes.is_empty() {
        return Ok(EntityOutline::default());
    }

    let nibble = |i: usize| -> Option<u8> {
        let byte = *bytes.get(i / 2)?;
        Some(if i % 2 == 0 { byte & 0x0F } else { byte >> 4 })
    };

    let mut filled = Vec::new();
    let mut queue = VecDeque::from([Square {
        x: 0,
        y: 0,
        size: grid_side,
    }]);
    let mut node = 0usize;

    while let Some(square) = queue.pop_front() {
        let mask = nibble(node).ok_or(OutlineError::Truncated { node })?;
        node += 1;

        if mask == 0 || square.size == 1 {
            filled.push(square);
            continue;
        }
        for slot in 0..4u8 {
            if mask & (1 << slot) == 0 {
                continue;
            }
            let child = square.child(slot);
            if child.size > 1 {
                queue.push_back(child);
            } else {
                filled.push(child);
            }
        }
    }

    let segments = boundary(&filled);
    Ok(EntityOutline {
        cells: filled.into_iter().map(Square::to_box).collect(),
        segments,
    })
}

/// Edges lying between a filled square and unfilled space.
///
/// Squares never overlap, so along any grid line the boundary is where
/// exactly one side is covered.
fn boundary(squares: &[Square]) -> Vec<Segment> {
    // line coordinate -> (intervals with fill on the low side, on the high side)
    type Lines = BTreeMap<u64, (Vec<(u64, u64)>, Vec<(u64, u64)>)>;
    let mut horizontal: Lines = BTreeMap::new();
    let mut vertical: Lines = BTreeMap::new();

    for s in squares {
        let (x1, y1) = (s.x + s.size, s.y + s.size);
        horizontal.entry(s.y).or_default().1.push((s.x, x1));
        horizontal.entry(y1).or_default().0.push((s.x, x1));
        vertical.entry(s.x).or_default().1.push((s.y, y1));
        vertical.entry(x1).or_default().0.push((s.y, y1));
    }

    let mut segments = Vec::new();
    for (y, (below, above)) in &horizontal {
        for (a, b) in exclusive_spans(below, above) {
            segments.push(Segment {
                from: (a as f64, *y as f64),
                to: (b as f64, *y as f64),
            });
        }
    }
    for (x, (left, right)) in &vertical {
        for (a, b) in exclusive_spans(left, right) {
            segments.push(Segment {
                from: (*x as f64, a as f64),
                to: (*x as f64, b as f64),
            });
        }
    }
    segments
}

/// Maximal spans covered by exactly one of two sets of disjoint intervals.
fn exclusive_spans(low: &[(u64, u64)], high: &[(u64, u64)]) -> Vec<(u64, u64)> {
    let mut events: Vec<(u64, i32)> = low
        .iter()
        .chain(high)
        .flat_map(|&(a, b)| [(a, 1), (b, -1)])
        .collect();
    events.sort_unstable();

    // Coverage is 0, 1 or 2; a span is boundary while coverage is exactly 1.
    let mut spans: Vec<(u64, u64)> = Vec::new();
    let mut coverage = 0;
    let mut start = 0;
    let mut i = 0;
    while i < events.len() {
        let at = events[i].0;
        while i < events.len() && events[i].0 == at {
            coverage += events[i].1;
            i += 1;
        }
        let was_open = spans.last().is_some_and(|&(_, end)| end == u64::MAX);
        match (was_open, coverage == 1) {
            (false, true) => {
                start = at;
                spans.push((start, u64::MAX));
            }
            (true, false) => {
                if let Some(last) = spans.last_mut() {
                    *last = (start, at);
                }
            }
            _ => {}
        }
    }
    spans.retain(|&(a, b)| b != u64::MAX && a < b);
    spans
}
