//! Fixed tables shared by every encoder session.

use std::sync::LazyLock;

/// Coded-block mask (luma bits 0-3, chroma bits 4-5) to ue code index.
#[rustfmt::skip]
pub const BLOCK_MASK_CODE: [u8; 64] = [
     0,  7,  6, 12,  5, 19, 29, 13,  4, 27, 17,  8, 14, 11,  9,  3,
    20, 33, 34, 24, 35, 30, 41, 15, 36, 40, 31, 10, 28, 16, 18,  1,
    37, 55, 57, 52, 58, 56, 63, 46, 61, 62, 60, 48, 59, 49, 54, 21,
    43, 44, 45, 32, 47, 39, 53, 22, 51, 50, 42, 23, 38, 25, 26,  2,
];

/// Coded 4x4 sub-block mask to ue code index.
pub const SUBBLOCK_MASK_CODE: [u8; 16] = [2, 4, 3, 8, 5, 14, 16, 12, 6, 15, 13, 9, 7, 10, 11, 1];

/// 4x4 dequantization bases, six rows of sixteen in zigzag order.
pub const DEQUANT_BASE_4X4: [u8; 96] = [
    0x0A, 0x0D, 0x0D, 0x0A, 0x10, 0x0A, 0x0D, 0x0D, 0x0D, 0x0D, 0x10, 0x0A, 0x10, 0x0D, 0x0D, 0x10,
    0x0B, 0x0E, 0x0E, 0x0B, 0x12, 0x0B, 0x0E, 0x0E, 0x0E, 0x0E, 0x12, 0x0B, 0x12, 0x0E, 0x0E, 0x12,
    0x0D, 0x10, 0x10, 0x0D, 0x14, 0x0D, 0x10, 0x10, 0x10, 0x10, 0x14, 0x0D, 0x14, 0x10, 0x10, 0x14,
    0x0E, 0x12, 0x12, 0x0E, 0x17, 0x0E, 0x12, 0x12, 0x12, 0x12, 0x17, 0x0E, 0x17, 0x12, 0x12, 0x17,
    0x10, 0x14, 0x14, 0x10, 0x19, 0x10, 0x14, 0x14, 0x14, 0x14, 0x19, 0x10, 0x19, 0x14, 0x14, 0x19,
    0x12, 0x17, 0x17, 0x12, 0x1D, 0x12, 0x17, 0x17, 0x17, 0x17, 0x1D, 0x12, 0x1D, 0x17, 0x17, 0x1D,
];

/// 8x8 dequantization bases, six rows of sixty-four in zigzag order.
pub const DEQUANT_BASE_8X8: [u8; 384] = [
    0x14, 0x13, 0x13, 0x19, 0x12, 0x19, 0x13, 0x18, 0x18, 0x13, 0x14, 0x12, 0x20, 0x12, 0x14, 0x13,
    0x13, 0x18, 0x18, 0x13, 0x13, 0x19, 0x12, 0x19, 0x12, 0x19, 0x12, 0x19, 0x13, 0x18, 0x18, 0x13,
    0x13, 0x18, 0x18, 0x13, 0x12, 0x20, 0x12, 0x14, 0x12, 0x20, 0x12, 0x18, 0x18, 0x13, 0x13, 0x18,
    0x18, 0x12, 0x19, 0x12, 0x19, 0x12, 0x13, 0x18, 0x18, 0x13, 0x12, 0x20, 0x12, 0x18, 0x18, 0x12,
    0x16, 0x15, 0x15, 0x1C, 0x13, 0x1C, 0x15, 0x1A, 0x1A, 0x15, 0x16, 0x13, 0x23, 0x13, 0x16, 0x15,
    0x15, 0x1A, 0x1A, 0x15, 0x15, 0x1C, 0x13, 0x1C, 0x13, 0x1C, 0x13, 0x1C, 0x15, 0x1A, 0x1A, 0x15,
    0x15, 0x1A, 0x1A, 0x15, 0x13, 0x23, 0x13, 0x16, 0x13, 0x23, 0x13, 0x1A, 0x1A, 0x15, 0x15, 0x1A,
    0x1A, 0x13, 0x1C, 0x13, 0x1C, 0x13, 0x15, 0x1A, 0x1A, 0x15, 0x13, 0x23, 0x13, 0x1A, 0x1A, 0x13,
    0x1A, 0x18, 0x18, 0x21, 0x17, 0x21, 0x18, 0x1F, 0x1F, 0x18, 0x1A, 0x17, 0x2A, 0x17, 0x1A, 0x18,
    0x18, 0x1F, 0x1F, 0x18, 0x18, 0x21, 0x17, 0x21, 0x17, 0x21, 0x17, 0x21, 0x18, 0x1F, 0x1F, 0x18,
    0x18, 0x1F, 0x1F, 0x18, 0x17, 0x2A, 0x17, 0x1A, 0x17, 0x2A, 0x17, 0x1F, 0x1F, 0x18, 0x18, 0x1F,
    0x1F, 0x17, 0x21, 0x17, 0x21, 0x17, 0x18, 0x1F, 0x1F, 0x18, 0x17, 0x2A, 0x17, 0x1F, 0x1F, 0x17,
    0x1C, 0x1A, 0x1A, 0x23, 0x19, 0x23, 0x1A, 0x21, 0x21, 0x1A, 0x1C, 0x19, 0x2D, 0x19, 0x1C, 0x1A,
    0x1A, 0x21, 0x21, 0x1A, 0x1A, 0x23, 0x19, 0x23, 0x19, 0x23, 0x19, 0x23, 0x1A, 0x21, 0x21, 0x1A,
    0x1A, 0x21, 0x21, 0x1A, 0x19, 0x2D, 0x19, 0x1C, 0x19, 0x2D, 0x19, 0x21, 0x21, 0x1A, 0x1A, 0x21,
    0x21, 0x19, 0x23, 0x19, 0x23, 0x19, 0x1A, 0x21, 0x21, 0x1A, 0x19, 0x2D, 0x19, 0x21, 0x21, 0x19,
    0x20, 0x1E, 0x1E, 0x28, 0x1C, 0x28, 0x1E, 0x26, 0x26, 0x1E, 0x20, 0x1C, 0x33, 0x1C, 0x20, 0x1E,
    0x1E, 0x26, 0x26, 0x1E, 0x1E, 0x28, 0x1C, 0x28, 0x1C, 0x28, 0x1C, 0x28, 0x1E, 0x26, 0x26, 0x1E,
    0x1E, 0x26, 0x26, 0x1E, 0x1C, 0x33, 0x1C, 0x20, 0x1C, 0x33, 0x1C, 0x26, 0x26, 0x1E, 0x1E, 0x26,
    0x26, 0x1C, 0x28, 0x1C, 0x28, 0x1C, 0x1E, 0x26, 0x26, 0x1E, 0x1C, 0x33, 0x1C, 0x26, 0x26, 0x1C,
    0x24, 0x22, 0x22, 0x2E, 0x20, 0x2E, 0x22, 0x2B, 0x2B, 0x22, 0x24, 0x20, 0x3A, 0x20, 0x24, 0x22,
    0x22, 0x2B, 0x2B, 0x22, 0x22, 0x2E, 0x20, 0x2E, 0x20, 0x2E, 0x20, 0x2E, 0x22, 0x2B, 0x2B, 0x22,
    0x22, 0x2B, 0x2B, 0x22, 0x20, 0x3A, 0x20, 0x24, 0x20, 0x3A, 0x20, 0x2B, 0x2B, 0x22, 0x22, 0x2B,
    0x2B, 0x20, 0x2E, 0x20, 0x2E, 0x20, 0x22, 0x2B, 0x2B, 0x22, 0x20, 0x3A, 0x20, 0x2B, 0x2B, 0x20,
];

pub const MIN_QUANTIZER: i32 = 12;
pub const MAX_QUANTIZER: i32 = 52;

const CLAMP_BIAS: i32 = 0x40;
const CLAMP_LEN: usize = 256 + 2 * CLAMP_BIAS as usize;

/// Saturating pixel table indexed by `0x40 + prediction + residual`.
pub static MIN_MAX_TABLE: LazyLock<[u8; CLAMP_LEN]> = LazyLock::new(|| {
    std::array::from_fn(|i| (i as i32 - CLAMP_BIAS).clamp(0, 255) as u8)
});

/// Reconstructs one pixel. Indices past either end of the table saturate.
#[inline]
pub fn clamp_pixel(prediction: u8, residual: i32) -> u8 {
    let index = (CLAMP_BIAS + prediction as i32 + residual).clamp(0, CLAMP_LEN as i32 - 1);
    MIN_MAX_TABLE[index as usize]
}
