//! Value-to-color mappings applied to raw metric cells.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::color::Oklch;

/// Color of cells whose metric is zero (no line there).
pub const BACKGROUND: [u8; 4] = [24, 24, 27, 255];

/// Lightness and chroma shared by every hashed color.
const HASH_LIGHTNESS: f64 = 0.75;
const HASH_CHROMA: f64 = 0.15;

/// How a metric value becomes a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompositeMode {
    /// Gray ramp: `255 - v`, so small values are bright.
    #[default]
    Direct,
    /// Gray ramp over `10 · v`, for indentation depths.
    Indent,
    /// Hue derived from a hash of the value.
    Hash,
    /// Hash mapped onto a lightness/chroma/hue rainbow.
    Rainbow,
}

impl CompositeMode {
    pub const ALL: [CompositeMode; 4] = [
        CompositeMode::Direct,
        CompositeMode::Indent,
        CompositeMode::Hash,
        CompositeMode::Rainbow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeMode::Direct => "direct",
            CompositeMode::Indent => "indent",
            CompositeMode::Hash => "hash",
            CompositeMode::Rainbow => "rainbow",
        }
    }

    /// RGBA color for one cell.
    pub fn color(&self, value: i32) -> [u8; 4] {
        if value == 0 {
            return BACKGROUND;
        }
        let [r, g, b] = match self {
            CompositeMode::Direct => gray(255 - i64::from(value)),
            CompositeMode::Indent => gray(255 - (10 * i64::from(value)).clamp(0, 255)),
            CompositeMode::Hash => {
                let hue = f64::from(fmix32(value as u32) % 360);
                Oklch::new(HASH_LIGHTNESS, HASH_CHROMA, hue).to_rgb8()
            }
            CompositeMode::Rainbow => {
                let t = f64::from(fmix32(value as u32)) / f64::from(u32::MAX);
                rainbow(t).to_rgb8()
            }
        };
        [r, g, b, 255]
    }
}

fn gray(level: i64) -> [u8; 3] {
    let v = level.clamp(0, 255) as u8;
    [v, v, v]
}

/// Cyclic rainbow over `t ∈ [0, 1]`: brightest and most saturated mid-way.
fn rainbow(t: f64) -> Oklch {
    let ts = (t - 0.5).abs();
    Oklch::new(1.5 - 1.5 * ts, 0.8 - 0.9 * ts, 360.0 * t - 100.0)
}

/// MurmurHash3 32-bit finalizer.
#[inline]
pub fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

impl fmt::Display for CompositeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown composite mode '{0}' (expected direct, indent, hash or rainbow)")]
pub struct CompositeModeError(pub String);

impl FromStr for CompositeMode {
    type Err = CompositeModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CompositeModeError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_background_in_every_mode() {
        for mode in CompositeMode::ALL {
            assert_eq!(mode.color(0), BACKGROUND);
        }
    }

    #[test]
    fn test_direct_is_inverted_gray() {
        assert_eq!(CompositeMode::Direct.color(1), [254, 254, 254, 255]);
        assert_eq!(CompositeMode::Direct.color(80), [175, 175, 175, 255]);
        assert_eq!(CompositeMode::Direct.color(1000), [0, 0, 0, 255]);
        assert_eq!(CompositeMode::Direct.color(-5), [255, 255, 255, 255]);
    }

    #[test]
    fn test_indent_scales_by_ten() {
        assert_eq!(CompositeMode::Indent.color(2), [235, 235, 235, 255]);
        assert_eq!(CompositeMode::Indent.color(30), [0, 0, 0, 255]);
    }

    #[test]
    fn test_hash_is_deterministic_and_varied() {
        let a = CompositeMode::Hash.color(12345);
        assert_eq!(a, CompositeMode::Hash.color(12345));
        let distinct: std::collections::HashSet<_> =
            (1..50).map(|v| CompositeMode::Hash.color(v)).collect();
        assert!(distinct.len() > 40);
    }

    #[test]
    fn test_hash_colors_are_mid_tones() {
        for v in 1..200 {
            let [r, g, b, _] = CompositeMode::Hash.color(v);
            assert_ne!([r, g, b, 255], BACKGROUND);
            assert_ne!([r, g, b], [255, 255, 255]);
            assert_ne!([r, g, b], [0, 0, 0]);
        }
    }

    #[test]
    fn test_rainbow_is_opaque() {
        for v in [1, -1, i32::MAX, i32::MIN] {
            assert_eq!(CompositeMode::Rainbow.color(v)[3], 255);
        }
    }

    #[test]
    fn test_fmix32_known_values() {
        assert_eq!(fmix32(0), 0);
        assert_ne!(fmix32(1), 1);
        assert_ne!(fmix32(1), fmix32(2));
    }

    #[test]
    fn test_parse_and_display() {
        for mode in CompositeMode::ALL {
            assert_eq!(mode.to_string().parse::<CompositeMode>(), Ok(mode));
        }
        assert!("stack|program".parse::<CompositeMode>().is_err());
    }
}
