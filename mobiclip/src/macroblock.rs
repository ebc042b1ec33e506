use crate::bitwriter::BitWriter;
use crate::coefficients::encode_block;
use crate::error::{EncoderError, Result};
use crate::tables::{BLOCK_MASK_CODE, SUBBLOCK_MASK_CODE};
use crate::vlc::VlcTable;

pub const MACROBLOCK_SIZE: u32 = 16;
pub const MAX_PREDICTION_MODE: u8 = 7;

/// One 8x8 luma quadrant. Split and sub-block flags only matter when the
/// quadrant is complex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaRegion {
    pub complex: bool,
    pub split: bool,
    pub coded: [bool; 4],
    pub coefficients: [i32; 64],
    pub sub_coefficients: [[i32; 16]; 4],
}

impl Default for LumaRegion {
    fn default() -> Self {
        Self {
            complex: false,
            split: false,
            coded: [false; 4],
            coefficients: [0; 64],
            sub_coefficients: [[0; 16]; 4],
        }
    }
}

impl LumaRegion {
    pub fn coded_mask(&self) -> usize {
        self.coded
            .iter()
            .enumerate()
            .fold(0, |mask, (i, &c)| mask | (usize::from(c) << i))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromaRegion {
    pub complex: bool,
    /// Never produced by the built-in analyzers; a split chroma region is
    /// written as nothing.
    pub split: bool,
    pub coefficients: [i32; 64],
}

impl Default for ChromaRegion {
    fn default() -> Self {
        Self {
            complex: false,
            split: false,
            coefficients: [0; 64],
        }
    }
}

/// State of one 16x16 block for the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macroblock {
    pub x: u32,
    pub y: u32,
    pub predict: bool,
    pub luma_mode: u8,
    /// Quadrants in 2x2 raster order.
    pub luma: [LumaRegion; 4],
    pub chroma_mode: u8,
    /// U then V.
    pub chroma: [ChromaRegion; 2],
}

impl Macroblock {
    pub fn new(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            predict: false,
            luma_mode: 0,
            luma: Default::default(),
            chroma_mode: 0,
            chroma: Default::default(),
        }
    }

    /// Clears everything but the origin.
    pub fn reset(&mut self) {
        *self = Self::new(self.x, self.y);
    }

    /// Complexity flags packed as luma quadrants in bits 0-3, chroma planes
    /// in bits 4-5.
    pub fn block_mask(&self) -> usize {
        let luma = self
            .luma
            .iter()
            .enumerate()
            .fold(0, |mask, (i, r)| mask | (usize::from(r.complex) << i));
        let chroma = self
            .chroma
            .iter()
            .enumerate()
            .fold(0, |mask, (i, r)| mask | (usize::from(r.complex) << (4 + i)));
        luma | chroma
    }

    fn needs_coefficients(&self) -> bool {
        self.luma
            .iter()
            .any(|r| r.complex && (!r.split || r.coded.iter().any(|&c| c)))
            || self.chroma.iter().any(|r| r.complex && !r.split)
    }

    /// Writes the macroblock body: mask, modes, then the coefficient blocks.
    /// A coefficient table is only required when at least one block is coded.
    pub fn write_body(&self, vlc: Option<&VlcTable>, w: &mut BitWriter) -> Result<()> {
        for mode in [self.luma_mode, self.chroma_mode] {
            if mode > MAX_PREDICTION_MODE {
                return Err(EncoderError::InvalidPredictionMode { mode });
            }
        }
        let vlc = match vlc {
            Some(table) => Some(table),
            None if self.needs_coefficients() => return Err(EncoderError::MissingVlcTable),
            None => None,
        };

        w.write_ue(u32::from(BLOCK_MASK_CODE[self.block_mask()]));
        w.write_bits(u64::from(self.luma_mode), 3);

        for region in &self.luma {
            if !region.complex {
                continue;
            }
            if region.split {
                w.write_ue(u32::from(SUBBLOCK_MASK_CODE[region.coded_mask()]));
                for (&coded, block) in region.coded.iter().zip(&region.sub_coefficients) {
                    if coded {
                        encode_block(block, table(vlc)?, w)?;
                    }
                }
            } else {
                w.write_bit(true);
                encode_block(&region.coefficients, table(vlc)?, w)?;
            }
        }

        w.write_bits(u64::from(self.chroma_mode), 3);

        for region in &self.chroma {
            if region.complex && !region.split {
                w.write_bit(true);
                encode_block(&region.coefficients, table(vlc)?, w)?;
            }
        }
        Ok(())
    }
}

fn table(vlc: Option<&VlcTable>) -> Result<&VlcTable> {
    vlc.ok_or(EncoderError::MissingVlcTable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vlc::VlcCode;

    fn table() -> VlcTable {
        VlcTable::from_codes(&[
            VlcCode {
                level: 0,
                run: 0,
                last: true,
                code: 0b010,
                len: 3,
            },
            VlcCode {
                level: 1,
                run: 0,
                last: true,
                code: 0b11,
                len: 2,
            },
        ])
        .unwrap()
    }

    fn body(mb: &Macroblock, vlc: Option<&VlcTable>) -> (Vec<u8>, usize) {
        let mut w = BitWriter::new();
        mb.write_body(vlc, &mut w).unwrap();
        let len = w.bit_len();
        (w.finalize(), len)
    }

    fn pattern(bits: &str) -> (Vec<u8>, usize) {
        let mut w = BitWriter::new();
        for c in bits.chars().filter(|c| !c.is_whitespace()) {
            w.write_bit(c == '1');
        }
        let len = w.bit_len();
        (w.finalize(), len)
    }

    #[test]
    fn reset_keeps_origin() {
        let mut mb = Macroblock::new(32, 48);
        mb.predict = true;
        mb.luma_mode = 5;
        mb.luma[2].complex = true;
        mb.chroma[1].coefficients[3] = 9;
        mb.reset();
        assert_eq!(mb, Macroblock::new(32, 48));
    }

    #[test]
    fn block_mask_bit_layout() {
        let mut mb = Macroblock::new(0, 0);
        mb.luma[1].complex = true;
        mb.luma[3].complex = true;
        mb.chroma[0].complex = true;
        assert_eq!(mb.block_mask(), 0b01_1010);
    }

    #[test]
    fn flat_block_needs_no_table() {
        let mut mb = Macroblock::new(0, 0);
        mb.luma_mode = 2;
        mb.chroma_mode = 1;
        // mask 0 -> ue(0) = 1, then 010, then 001
        assert_eq!(body(&mb, None), pattern("1 010 001"));
    }

    #[test]
    fn unsplit_luma_and_chroma_blocks() {
        let mut mb = Macroblock::new(0, 0);
        mb.luma[0].complex = true;
        mb.luma[0].coefficients[0] = 1;
        mb.chroma[1].complex = true;
        // mask 0b10_0001 = 33 -> code 55 -> ue(55) = 00000 111000
        assert_eq!(BLOCK_MASK_CODE[33], 55);
        assert_eq!(
            body(&mb, Some(&table())),
            pattern("00000111000 000 1 110 000 1 0100")
        );
    }

    #[test]
    fn split_luma_codes_flagged_sub_blocks() {
        let mut mb = Macroblock::new(0, 0);
        mb.luma[2].complex = true;
        mb.luma[2].split = true;
        mb.luma[2].coded = [false, true, false, true];
        mb.luma[2].sub_coefficients[1][0] = -1;
        // block mask 0b100 -> 5 -> ue = 00110; sub mask 0b1010 -> 13 -> ue = 0001110
        assert_eq!(BLOCK_MASK_CODE[4], 5);
        assert_eq!(SUBBLOCK_MASK_CODE[0b1010], 13);
        assert_eq!(
            body(&mb, Some(&table())),
            pattern("00110 000 0001110 111 0100 000")
        );
    }

    #[test]
    fn split_chroma_writes_nothing() {
        let mut mb = Macroblock::new(0, 0);
        mb.chroma[0].complex = true;
        mb.chroma[0].split = true;
        let (_, len) = body(&mb, None);
        // ue(BLOCK_MASK_CODE[16]) + two 3-bit modes
        let mut w = BitWriter::new();
        w.write_ue(u32::from(BLOCK_MASK_CODE[16]));
        assert_eq!(len, w.bit_len() + 6);
    }

    #[test]
    fn missing_table_is_reported() {
        let mut mb = Macroblock::new(0, 0);
        mb.chroma[0].complex = true;
        let mut w = BitWriter::new();
        assert!(matches!(
            mb.write_body(None, &mut w),
            Err(EncoderError::MissingVlcTable)
        ));
    }

    #[test]
    fn out_of_range_mode_is_rejected() {
        let mut mb = Macroblock::new(0, 0);
        mb.chroma_mode = 8;
        let mut w = BitWriter::new();
        assert!(matches!(
            mb.write_body(None, &mut w),
            Err(EncoderError::InvalidPredictionMode { mode: 8 })
        ));
        assert_eq!(w.bit_len(), 0);
    }
}
