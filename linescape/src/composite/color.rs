//! OKLCH to sRGB conversion.
//!
//! OKLCH is the polar form of OKLab. Equal steps in hue at fixed lightness
//! and chroma look equally different, which is what keeps hashed colors
//! distinguishable without any one of them dominating.

/// Lightness, chroma, hue (degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oklch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

impl Oklch {
    pub const fn new(l: f64, c: f64, h: f64) -> Self {
        Self { l, c, h }
    }

    /// Gamma-encoded sRGB, each channel clamped to `[0, 1]`.
    pub fn to_srgb(self) -> [f64; 3] {
        let h = self.h.to_radians();
        let (a, b) = (self.c * h.cos(), self.c * h.sin());
        oklab_to_linear_srgb(self.l, a, b).map(|v| gamma_encode(v.clamp(0.0, 1.0)))
    }

    /// sRGB as bytes.
    pub fn to_rgb8(self) -> [u8; 3] {
        self.to_srgb().map(float_to_byte)
    }
}

/// Rounds a `[0, 1]` channel to a byte.
#[inline]
pub fn float_to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn oklab_to_linear_srgb(l: f64, a: f64, b: f64) -> [f64; 3] {
    let l_ = l + 0.396_337_777_4 * a + 0.215_803_757_3 * b;
    let m_ = l - 0.105_561_345_8 * a - 0.063_854_172_8 * b;
    let s_ = l - 0.089_484_177_5 * a - 1.291_485_548_0 * b;

    let (l3, m3, s3) = (l_ * l_ * l_, m_ * m_ * m_, s_ * s_ * s_);

    [
        4.076_741_662_1 * l3 - 3.307_711_591_3 * m3 + 0.230_969_929_2 * s3,
        -1.268_438_004_6 * l3 + 2.609_757_401_1 * m3 - 0.341_319_396_5 * s3,
        -0.004_196_086_3 * l3 - 0.703_418_614_7 * m3 + 1.707_614_701_0 * s3,
    ]
}

fn gamma_encode(v: f64) -> f64 {
    if v <= 0.003_130_8 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}
