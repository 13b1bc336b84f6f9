//! Z-order (Morton) curve: `x` bits occupy even index positions, `y` bits odd.

use super::SpaceCurve;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Morton;

/// Spreads the 32 bits of `v` into the even bit positions of a `u64`.
#[inline]
fn spread(v: u32) -> u64 {
    let mut v = u64::from(v);
    v = (v | (v << 16)) & 0x0000_FFFF_0000_FFFF;
    v = (v | (v << 8)) & 0x00FF_00FF_00FF_00FF;
    v = (v | (v << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    v = (v | (v << 2)) & 0x3333_3333_3333_3333;
    v = (v | (v << 1)) & 0x5555_5555_5555_5555;
    v
}

/// Inverse of [`spread`]: gathers the even bits of `v`.
#[inline]
fn compact(v: u64) -> u32 {
    let mut v = v & 0x5555_5555_5555_5555;
    v = (v | (v >> 1)) & 0x3333_3333_3333_3333;
    v = (v | (v >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    v = (v | (v >> 4)) & 0x00FF_00FF_00FF_00FF;
    v = (v | (v >> 8)) & 0x0000_FFFF_0000_FFFF;
    v = (v | (v >> 16)) & 0x0000_0000_FFFF_FFFF;
    v as u32
}

#[inline]
fn order_mask(order: u32) -> u32 {
    if order >= 32 {
        u32::MAX
    } else {
        (1u32 << order) - 1
    }
}

impl SpaceCurve for Morton {
    fn encode(&self, index: u64, order: u32) -> (u32, u32) {
        let mask = order_mask(order);
        (compact(index) & mask, compact(index >> 1) & mask)
    }

    fn decode(&self, x: u32, y: u32, order: u32) -> u64 {
        let mask = order_mask(order);
        spread(x & mask) | (spread(y & mask) << 1)
    }
}
