use crate::frame::{BYTES_PER_PIXEL, Frame};
use crate::macroblock::MACROBLOCK_SIZE;

const CHUNK: usize = 8;

/// True when the 16x16 block at `(x, y)` matches `previous` in every byte
/// of every pixel. Both frames must cover the block.
pub fn blocks_identical(current: &Frame, previous: &Frame, x: u32, y: u32) -> bool {
    let start = x as usize * BYTES_PER_PIXEL;
    let end = start + MACROBLOCK_SIZE as usize * BYTES_PER_PIXEL;
    (y..y + MACROBLOCK_SIZE).all(|row| {
        let a = &current.row(row)[start..end];
        let b = &previous.row(row)[start..end];
        a.chunks_exact(CHUNK).zip(b.chunks_exact(CHUNK)).all(|(ca, cb)| ca == cb)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(x: u32, y: u32) -> u32 {
        0xFF00_0000 | ((x * 7 + y * 13) & 0xFF_FFFF)
    }

    #[test]
    fn identical_frames_match_everywhere() {
        let a = Frame::from_fn(48, 32, pattern);
        let b = a.clone();
        for y in (0..32).step_by(16) {
            for x in (0..48).step_by(16) {
                assert!(blocks_identical(&a, &b, x, y));
            }
        }
    }

    #[test]
    fn single_channel_change_is_detected() {
        let a = Frame::from_fn(32, 32, pattern);
        // Alpha of one pixel in the bottom-right block.
        let b = Frame::from_fn(32, 32, |x, y| {
            if (x, y) == (31, 31) {
                pattern(x, y) & 0x00FF_FFFF
            } else {
                pattern(x, y)
            }
        });
        assert!(blocks_identical(&a, &b, 0, 0));
        assert!(blocks_identical(&a, &b, 16, 0));
        assert!(blocks_identical(&a, &b, 0, 16));
        assert!(!blocks_identical(&a, &b, 16, 16));
    }

    #[test]
    fn row_padding_is_ignored() {
        let packed = Frame::solid(16, 16, 0xFF10_2030);
        let mut data = Vec::new();
        for y in 0..16 {
            data.extend_from_slice(packed.row(y));
            data.extend_from_slice(&[y as u8; 16]);
        }
        let padded = Frame::with_stride(16, 16, 80, data).unwrap();
        assert!(blocks_identical(&packed, &padded, 0, 0));
    }
}
