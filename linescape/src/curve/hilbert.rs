//! Two-dimensional Hilbert curve.
//!
//! Indices are consumed two bits at a time, most significant pair first. Each
//! pair selects a quadrant; the quadrant code is Gray-coded, optionally
//! transposed depending on the current orientation, then XORed with the
//! current complement mask to produce one bit of `x` and one bit of `y`.
//! Entering the first or last quadrant flips the orientation, and entering the
//! last quadrant also inverts the complement mask.

use super::SpaceCurve;

/// Hilbert curve; see the module docs for the bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hilbert;

/// Swaps the two axis bits of a quadrant code.
#[inline]
fn transpose(code: u8) -> u8 {
    match code {
        1 => 2,
        2 => 1,
        other => other,
    }
}

/// Converts between curve order and reflected Gray order within a quadrant.
/// The mapping is its own inverse.
#[inline]
fn gray(code: u8) -> u8 {
    match code {
        2 => 3,
        3 => 2,
        other => other,
    }
}

/// Orientation carried from one level of the curve to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Orientation {
    /// Axis bits are transposed at this level.
    transposed: bool,
    /// XOR mask applied to the quadrant code.
    complement: u8,
}

impl Orientation {
    const ROOT: Orientation = Orientation {
        transposed: false,
        complement: 0,
    };

    /// Quadrant code `w` (curve order) to axis bits `(x << 1) | y`.
    #[inline]
    fn to_axes(self, w: u8) -> u8 {
        let mut code = gray(w);
        if self.transposed {
            code = transpose(code);
        }
        code ^ self.complement
    }

    /// Axis bits `(x << 1) | y` to quadrant code `w`.
    #[inline]
    fn to_quadrant(self, axes: u8) -> u8 {
        let mut code = axes ^ self.complement;
        if self.transposed {
            code = transpose(code);
        }
        gray(code)
    }

    /// State for the level below quadrant `w`.
    #[inline]
    fn descend(self, w: u8) -> Orientation {
        let complement = if w == 3 {
            3 - self.complement
        } else {
            self.complement
        };
        let transposed = if w == 0 || w == 3 {
            !self.transposed
        } else {
            self.transposed
        };
        Orientation {
            transposed,
            complement,
        }
    }
}

impl SpaceCurve for Hilbert {
    fn encode(&self, index: u64, order: u32) -> (u32, u32) {
        let mut state = Orientation::ROOT;
        let mut x = 0u32;
        let mut y = 0u32;
        for level in (0..order).rev() {
            let w = ((index >> (2 * level)) & 3) as u8;
            let axes = state.to_axes(w);
            x |= u32::from((axes >> 1) & 1) << level;
            y |= u32::from(axes & 1) << level;
            state = state.descend(w);
        }
        (x, y)
    }

    fn decode(&self, x: u32, y: u32, order: u32) -> u64 {
        let mut state = Orientation::ROOT;
        let mut index = 0u64;
        for level in (0..order).rev() {
            let axes = ((((x >> level) & 1) << 1) | ((y >> level) & 1)) as u8;
            let w = state.to_quadrant(axes);
            index = (index << 2) | u64::from(w);
            state = state.descend(w);
        }
        index
    }
}
