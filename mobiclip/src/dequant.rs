use crate::scan::{ZIGZAG_4X4, ZIGZAG_8X8, from_zigzag};
use crate::tables::{DEQUANT_BASE_4X4, DEQUANT_BASE_8X8, MAX_QUANTIZER, MIN_QUANTIZER};

/// Per-session dequantization steps in raster order.
#[derive(Debug, Clone, PartialEq)]
pub struct DequantTables {
    pub table_4x4: [f32; 16],
    pub table_8x8: [f32; 64],
}

impl DequantTables {
    /// Builds both tables for a quantizer index. Out-of-range indices are
    /// clamped to `12..=52`.
    pub fn new(quantizer: i32) -> Self {
        let q = quantizer.clamp(MIN_QUANTIZER, MAX_QUANTIZER) as usize;
        let shift = q / 6 + 8;
        let row = q % 6;

        let linear_4x4: [f32; 16] = std::array::from_fn(|i| {
            ((u32::from(DEQUANT_BASE_4X4[row * 16 + i]) << shift) >> 8) as f32
        });
        let linear_8x8: [f32; 64] = std::array::from_fn(|i| {
            ((u32::from(DEQUANT_BASE_8X8[row * 64 + i]) << (shift - 2)) >> 8) as f32
        });

        Self {
            table_4x4: from_zigzag(&linear_4x4, &ZIGZAG_4X4),
            table_8x8: from_zigzag(&linear_8x8, &ZIGZAG_8X8),
        }
    }
}
