#[derive(Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    current_byte: u8,
    bits_in_current: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.current_byte = (self.current_byte << 1) | (bit as u8);
        self.bits_in_current += 1;
        if self.bits_in_current == 8 {
            self.buf.push(self.current_byte);
            self.current_byte = 0;
            self.bits_in_current = 0;
        }
    }

    /// Writes the low `n` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u64, n: u8) {
        debug_assert!(n <= 64);
        for i in (0..n).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    /// Unsigned Exp-Golomb code.
    pub fn write_ue(&mut self, value: u32) {
        let coded = u64::from(value) + 1;
        let width = 64 - coded.leading_zeros() as u8;
        self.write_bits(0, width - 1);
        self.write_bits(coded, width);
    }

    /// Signed Exp-Golomb code: 0, 1, -1, 2, -2, ... map to 0, 1, 2, 3, 4, ...
    pub fn write_se(&mut self, value: i32) {
        let mapped = if value > 0 {
            (value as u32) * 2 - 1
        } else {
            value.unsigned_abs() * 2
        };
        self.write_ue(mapped);
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> usize {
        self.buf.len() * 8 + self.bits_in_current as usize
    }

    pub fn byte_align(&mut self) {
        if self.bits_in_current > 0 {
            self.current_byte <<= 8 - self.bits_in_current;
            self.buf.push(self.current_byte);
            self.current_byte = 0;
            self.bits_in_current = 0;
        }
    }

    pub fn finalize(mut self) -> Vec<u8> {
        self.byte_align();
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bit_true() {
        let mut w = BitWriter::new();
        w.write_bit(true);
        assert_eq!(w.finalize(), vec![0x80]);
    }

    #[test]
    fn write_3_bits() {
        let mut w = BitWriter::new();
        w.write_bits(0b101, 3);
        assert_eq!(w.finalize(), vec![0xA0]);
    }

    #[test]
    fn write_across_byte_boundary() {
        let mut w = BitWriter::new();
        w.write_bits(0b11111, 5);
        w.write_bits(0b11111, 5);
        assert_eq!(w.finalize(), vec![0xFF, 0xC0]);
    }

    #[test]
    fn byte_align_pads_with_zeros() {
        let mut w = BitWriter::new();
        w.write_bits(0b111, 3);
        w.byte_align();
        assert_eq!(w.finalize(), vec![0xE0]);
    }

    #[test]
    fn empty_writer() {
        let w = BitWriter::new();
        assert_eq!(w.finalize(), Vec::<u8>::new());
    }

    #[test]
    fn write_16_bits() {
        let mut w = BitWriter::new();
        w.write_bits(0xCAFE, 16);
        assert_eq!(w.finalize(), vec![0xCA, 0xFE]);
    }

    #[test]
    fn ue_zero_is_single_one_bit() {
        let mut w = BitWriter::new();
        w.write_ue(0);
        assert_eq!(w.bit_len(), 1);
        assert_eq!(w.finalize(), vec![0x80]);
    }

    #[test]
    fn ue_small_values() {
        // 1 -> 010, 2 -> 011, 3 -> 00100
        let mut w = BitWriter::new();
        w.write_ue(1);
        w.write_ue(2);
        w.write_ue(3);
        assert_eq!(w.bit_len(), 11);
        assert_eq!(w.finalize(), vec![0b0100_1100, 0b1000_0000]);
    }

    #[test]
    fn ue_largest_permutation_index() {
        // 63 -> 64 = 0b1000000, 6 leading zeros
        let mut w = BitWriter::new();
        w.write_ue(63);
        assert_eq!(w.bit_len(), 13);
        assert_eq!(w.finalize(), vec![0b0000_0010, 0b0000_0000]);
    }

    #[test]
    fn se_mapping() {
        // 0 -> 1, 1 -> 010, -1 -> 011
        let mut w = BitWriter::new();
        w.write_se(0);
        w.write_se(1);
        w.write_se(-1);
        assert_eq!(w.bit_len(), 7);
        assert_eq!(w.finalize(), vec![0b1010_0110]);
    }

    #[test]
    fn bit_len_tracks_partial_bytes() {
        let mut w = BitWriter::new();
        w.write_bits(0, 9);
        assert_eq!(w.bit_len(), 9);
        w.write_bits(0, 16);
        assert_eq!(w.bit_len(), 25);
    }
}
