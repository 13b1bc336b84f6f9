//! Space-filling curves mapping a 1D line index onto a 2D square grid.
//!
//! A curve of order `k` covers a `2^k × 2^k` grid and is a bijection between
//! `[0, 4^k)` and every grid point. Two curves are provided:
//!
//! - [`Hilbert`]: consecutive indices are always grid neighbours, so lines of
//!   the same file form compact blobs. This is the default.
//! - [`Morton`]: Z-order bit interleaving. Cheaper, but with jumps at every
//!   quadrant boundary.
//!
//! # Example
//!
//! ```
//! use linescape::curve::{Hilbert, SpaceCurve};
//!
//! let (x, y) = Hilbert.encode(5, 2);
//! assert_eq!(Hilbert.decode(x, y, 2), 5);
//! ```

mod hilbert;
mod morton;

pub use hilbert::Hilbert;
pub use morton::Morton;

/// Largest supported curve order; `2^32` cells per side.
pub const MAX_ORDER: u32 = 32;

/// A bijection between line indices and grid points.
pub trait SpaceCurve {
    /// Maps an index in `[0, 4^order)` to its grid point `(x, y)`.
    fn encode(&self, index: u64, order: u32) -> (u32, u32);

    /// Maps a grid point in `[0, 2^order)²` back to its index.
    fn decode(&self, x: u32, y: u32, order: u32) -> u64;
}

/// Runtime selection between the available curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CurveKind {
    #[default]
    Hilbert,
    Morton,
}

impl SpaceCurve for CurveKind {
    fn encode(&self, index: u64, order: u32) -> (u32, u32) {
        match self {
            CurveKind::Hilbert => Hilbert.encode(index, order),
            CurveKind::Morton => Morton.encode(index, order),
        }
    }

    fn decode(&self, x: u32, y: u32, order: u32) -> u64 {
        match self {
            CurveKind::Hilbert => Hilbert.decode(x, y, order),
            CurveKind::Morton => Morton.decode(x, y, order),
        }
    }
}
