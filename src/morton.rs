//! 30-bit Morton (Z-order) spatial keys.
//!
//! Positions normalized into the unit cube are quantized to a 10-bit grid
//! per axis and bit-interleaved. Integer order over the resulting keys
//! approximates spatial locality, which is all the topology builder needs.

use glam::Vec3;

/// Grid resolution per axis.
const GRID: f32 = 1024.0;

/// Expand a 10-bit integer into 30 bits by inserting two zeros after each
/// bit. Magic-constant ladder; each step spreads the bits twice as far.
#[inline]
pub fn expand_bits(v: u32) -> u32 {
    let v = (v.wrapping_mul(0x0001_0001)) & 0xFF00_00FF;
    let v = (v.wrapping_mul(0x0000_0101)) & 0x0F00_F00F;
    let v = (v.wrapping_mul(0x0000_0011)) & 0xC30C_30C3;
    (v.wrapping_mul(0x0000_0005)) & 0x4924_9249
}

/// 30-bit Morton key for a point inside the unit cube `[0,1]^3`.
///
/// Coordinates are clamped to the grid, so out-of-range inputs saturate
/// rather than wrap. Duplicate keys are legal; the build pipeline breaks
/// ties with the original primitive index at the sort step.
#[inline]
pub fn morton3(p: Vec3) -> u32 {
    let q = (p * GRID).clamp(Vec3::ZERO, Vec3::splat(GRID - 1.0));
    let x = expand_bits(q.x as u32);
    let y = expand_bits(q.y as u32);
    let z = expand_bits(q.z as u32);
    x * 4 + y * 2 + z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_bits_known_values() {
        assert_eq!(expand_bits(0), 0);
        assert_eq!(expand_bits(1), 1);
        assert_eq!(expand_bits(0b11), 0b1001);
        assert_eq!(expand_bits(0b101), 0b1000001);
        // all ten bits set: every third bit over 30 bits
        assert_eq!(expand_bits(1023), 0x0924_9249);
    }

    #[test]
    fn test_morton_corners() {
        assert_eq!(morton3(Vec3::ZERO), 0);
        // unit corner saturates every axis: all 30 bits set
        assert_eq!(morton3(Vec3::ONE), 0x3FFF_FFFF);
    }

    #[test]
    fn test_morton_axis_weights() {
        // x is the most significant interleaved axis, then y, then z
        let x = morton3(Vec3::new(1.0, 0.0, 0.0));
        let y = morton3(Vec3::new(0.0, 1.0, 0.0));
        let z = morton3(Vec3::new(0.0, 0.0, 1.0));
        assert!(x > y && y > z);
        assert_eq!(x, expand_bits(1023) * 4);
        assert_eq!(y, expand_bits(1023) * 2);
        assert_eq!(z, expand_bits(1023));
    }

    #[test]
    fn test_morton_clamps_out_of_range() {
        assert_eq!(morton3(Vec3::splat(-3.0)), morton3(Vec3::ZERO));
        assert_eq!(morton3(Vec3::splat(7.5)), morton3(Vec3::ONE));
    }

    #[test]
    fn test_morton_locality() {
        // nearby points in the same octant share high bits
        let a = morton3(Vec3::new(0.10, 0.10, 0.10));
        let b = morton3(Vec3::new(0.11, 0.10, 0.10));
        let c = morton3(Vec3::new(0.90, 0.90, 0.90));
        assert!((a ^ b).leading_zeros() > (a ^ c).leading_zeros());
    }
}
