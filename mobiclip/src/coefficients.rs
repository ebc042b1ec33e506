//! Run-length coding of one zigzag-ordered transform block.

use crate::bitwriter::BitWriter;
use crate::error::{EncoderError, Result};
use crate::vlc::{Codeword, ESCAPE_BITS, ESCAPE_CODE, MAX_LEVEL, VlcTable};

const RAW_MIN: i32 = -2048;
const RAW_MAX: i32 = 2047;

/// How a single coefficient ends up in the bitstream, cheapest form first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoefficientCode {
    Direct(Codeword),
    AdjustedRun(Codeword),
    AdjustedLevel(Codeword),
    Raw { last: bool, run: u32, value: i32 },
}

impl CoefficientCode {
    /// Picks the shortest available form for `value` preceded by `run` zeros.
    pub fn choose(
        value: i32,
        run: u32,
        last: bool,
        position: usize,
        vlc: &VlcTable,
    ) -> Result<Self> {
        let level = value.unsigned_abs();

        if let Some(cw) = vlc.codeword(level, run, last) {
            return Ok(Self::Direct(cw));
        }

        if level <= MAX_LEVEL {
            let adjusted_run = run as i32 - vlc.run_offset(level, last);
            if adjusted_run >= 0
                && let Some(cw) = vlc.codeword(level, adjusted_run as u32, last)
            {
                return Ok(Self::AdjustedRun(cw));
            }
        }

        let adjusted_level = i64::from(level) - i64::from(vlc.level_offset(run, last));
        if (0..=i64::from(MAX_LEVEL)).contains(&adjusted_level)
            && let Some(cw) = vlc.codeword(adjusted_level as u32, run, last)
        {
            return Ok(Self::AdjustedLevel(cw));
        }

        if !(RAW_MIN..=RAW_MAX).contains(&value) {
            return Err(EncoderError::CoefficientOutOfRange { value, position });
        }
        Ok(Self::Raw { last, run, value })
    }

    pub fn write(&self, negative: bool, w: &mut BitWriter) {
        match *self {
            Self::Direct(cw) => write_codeword(w, cw, negative),
            Self::AdjustedRun(cw) => {
                write_escape(w);
                w.write_bit(true);
                w.write_bit(false);
                write_codeword(w, cw, negative);
            }
            Self::AdjustedLevel(cw) => {
                write_escape(w);
                w.write_bit(false);
                write_codeword(w, cw, negative);
            }
            Self::Raw { last, run, value } => {
                write_escape(w);
                w.write_bit(true);
                w.write_bit(true);
                w.write_bit(last);
                w.write_bits(u64::from(run), 6);
                w.write_bits(u64::from(value as u32 & 0xFFF), 12);
            }
        }
    }
}

fn write_escape(w: &mut BitWriter) {
    w.write_bits(u64::from(ESCAPE_CODE), ESCAPE_BITS);
}

fn write_codeword(w: &mut BitWriter, cw: Codeword, negative: bool) {
    w.write_bits(u64::from(cw.bits | u32::from(negative)), cw.len);
}

/// Codes a 16- or 64-entry block. Everything after the last non-zero
/// coefficient is implied; an all-zero block still codes its DC as level 0.
pub fn encode_block(coefficients: &[i32], vlc: &VlcTable, w: &mut BitWriter) -> Result<()> {
    if coefficients.len() != 16 && coefficients.len() != 64 {
        return Err(EncoderError::InvalidBlockLength {
            len: coefficients.len(),
        });
    }

    let last = coefficients.iter().rposition(|&c| c != 0).unwrap_or(0);
    let mut run = 0u32;
    for (position, &value) in coefficients[..=last].iter().enumerate() {
        let is_last = position == last;
        if value == 0 && !is_last {
            run += 1;
            continue;
        }
        CoefficientCode::choose(value, run, is_last, position, vlc)?.write(value < 0, w);
        run = 0;
    }
    Ok(())
}
