//! Run/level VLC table for transform coefficients.
//!
//! The table is held in the decoder's form: a 4096-entry lookup keyed by the
//! next 12 bits of the stream. Each entry packs the code width (bits 0-3,
//! 0 = unused slot), level (bits 4-8), run (bits 9-14) and the last flag
//! (bit 15). Code widths include the trailing sign bit. A 256-byte offset
//! table drives the two cheap escape forms: `[run | last << 6]` holds the
//! level offset, `[0x80 + (level | last << 6)]` the run offset.
//!
//! The encoder side needs the inverse mapping, built once per table.

use tracing::debug;

use crate::error::{EncoderError, Result};

pub const LOOKUP_BITS: u8 = 12;
const LOOKUP_SIZE: usize = 1 << LOOKUP_BITS;
const OFFSETS_SIZE: usize = 256;
const RUN_OFFSET_BASE: usize = 0x80;

pub const MAX_LEVEL: u32 = 31;
pub const MAX_RUN: u32 = 63;

pub const ESCAPE_CODE: u32 = 3;
pub const ESCAPE_BITS: u8 = 7;

/// Byte length of a serialized table: little-endian lookup then offsets.
pub const ASSET_LEN: usize = LOOKUP_SIZE * 2 + OFFSETS_SIZE;

const NO_CODE: u16 = u16::MAX;

/// One prefix code of the table, without its sign bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlcCode {
    pub level: u8,
    pub run: u8,
    pub last: bool,
    pub code: u16,
    pub len: u8,
}

/// Bits to emit for one symbol, sign slot included and cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codeword {
    pub bits: u32,
    pub len: u8,
}

#[derive(Clone)]
pub struct VlcTable {
    lookup: Vec<u16>,
    reverse: Vec<u16>,
    offsets: [u8; OFFSETS_SIZE],
}

impl std::fmt::Debug for VlcTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VlcTable")
            .field("symbols", &self.symbol_count())
            .finish()
    }
}

fn pack_entry(level: u8, run: u8, last: bool, width: u8) -> u16 {
    u16::from(width & 0xF)
        | (u16::from(level & 0x1F) << 4)
        | (u16::from(run & 0x3F) << 9)
        | (u16::from(last) << 15)
}

fn unpack_entry(entry: u16) -> (u32, u32, bool, u8) {
    (
        u32::from((entry >> 4) & 0x1F),
        u32::from((entry >> 9) & 0x3F),
        entry >> 15 == 1,
        (entry & 0xF) as u8,
    )
}

fn reverse_index(level: u32, run: u32, last: bool) -> usize {
    ((level as usize * (MAX_RUN as usize + 1)) + run as usize) * 2 + last as usize
}

impl VlcTable {
    /// Wraps a decoder lookup table and its offset table.
    pub fn from_lookup(lookup: Vec<u16>, offsets: [u8; OFFSETS_SIZE]) -> Result<Self> {
        if lookup.len() != LOOKUP_SIZE {
            return Err(EncoderError::InvalidVlcTable(format!(
                "lookup has {} entries, expected {LOOKUP_SIZE}",
                lookup.len()
            )));
        }

        let mut reverse = vec![NO_CODE; reverse_index(MAX_LEVEL, MAX_RUN, true) + 1];
        for (idx, &entry) in lookup.iter().enumerate() {
            let (level, run, last, width) = unpack_entry(entry);
            if width == 0 {
                continue;
            }
            let slot = &mut reverse[reverse_index(level, run, last)];
            if *slot == NO_CODE {
                *slot = idx as u16;
            }
        }

        let table = Self {
            lookup,
            reverse,
            offsets,
        };
        debug!(symbols = table.symbol_count(), "built VLC table");
        Ok(table)
    }

    /// Parses the binary asset layout described in the module docs.
    pub fn from_asset(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ASSET_LEN {
            return Err(EncoderError::InvalidVlcTable(format!(
                "asset is {} bytes, expected {ASSET_LEN}",
                bytes.len()
            )));
        }
        let (lookup_bytes, offset_bytes) = bytes.split_at(LOOKUP_SIZE * 2);
        let lookup = lookup_bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let mut offsets = [0u8; OFFSETS_SIZE];
        offsets.copy_from_slice(offset_bytes);
        Self::from_lookup(lookup, offsets)
    }

    pub fn from_asset_file(path: &std::path::Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_asset(&bytes)
    }

    /// Builds a table from prefix codes. Escape offsets follow the usual
    /// run/level convention: the level offset is the largest level coded for
    /// a run, the run offset is one past the largest run coded for a level.
    pub fn from_codes(codes: &[VlcCode]) -> Result<Self> {
        let escape_start = (ESCAPE_CODE as usize) << (LOOKUP_BITS - ESCAPE_BITS);
        let escape_end = (ESCAPE_CODE as usize + 1) << (LOOKUP_BITS - ESCAPE_BITS);

        let mut lookup = vec![0u16; LOOKUP_SIZE];
        let mut offsets = [0u8; OFFSETS_SIZE];

        for c in codes {
            let width = c.len + 1;
            if c.len == 0 || width > LOOKUP_BITS {
                return Err(EncoderError::InvalidVlcTable(format!(
                    "code for level {} run {} has unsupported length {}",
                    c.level, c.run, c.len
                )));
            }
            if u32::from(c.level) > MAX_LEVEL || u32::from(c.run) > MAX_RUN {
                return Err(EncoderError::InvalidVlcTable(format!(
                    "symbol level {} run {} out of range",
                    c.level, c.run
                )));
            }
            if u32::from(c.code) >> c.len != 0 {
                return Err(EncoderError::InvalidVlcTable(format!(
                    "code {:#x} wider than {} bits",
                    c.code, c.len
                )));
            }

            let start = usize::from(c.code) << (LOOKUP_BITS - c.len);
            let end = (usize::from(c.code) + 1) << (LOOKUP_BITS - c.len);
            if start < escape_end && escape_start < end {
                return Err(EncoderError::InvalidVlcTable(format!(
                    "code {:#x}/{} overlaps the escape prefix",
                    c.code, c.len
                )));
            }

            let entry = pack_entry(c.level, c.run, c.last, width);
            for slot in &mut lookup[start..end] {
                if *slot != 0 {
                    return Err(EncoderError::InvalidVlcTable(format!(
                        "code {:#x}/{} is not prefix-free",
                        c.code, c.len
                    )));
                }
                *slot = entry;
            }

            let last_bit = usize::from(c.last) << 6;
            let level_offset = &mut offsets[usize::from(c.run) | last_bit];
            *level_offset = (*level_offset).max(c.level);
            let run_offset = &mut offsets[RUN_OFFSET_BASE + (usize::from(c.level) | last_bit)];
            *run_offset = (*run_offset).max(c.run + 1);
        }

        Self::from_lookup(lookup, offsets)
    }

    /// Codeword for `(level, run, last)`, if the table has one.
    pub fn codeword(&self, level: u32, run: u32, last: bool) -> Option<Codeword> {
        if level > MAX_LEVEL || run > MAX_RUN {
            return None;
        }
        let idx = self.reverse[reverse_index(level, run, last)];
        if idx == NO_CODE {
            return None;
        }
        let len = (self.lookup[idx as usize] & 0xF) as u8;
        let idx = u32::from(idx);
        let bits = if len < LOOKUP_BITS {
            idx >> (LOOKUP_BITS - len)
        } else {
            idx << (len - LOOKUP_BITS)
        };
        Some(Codeword { bits, len })
    }

    /// Amount subtracted from a level before the adjusted-level escape.
    pub fn level_offset(&self, run: u32, last: bool) -> i32 {
        i32::from(self.offsets[(run as usize & 0x3F) | (usize::from(last) << 6)])
    }

    /// Amount subtracted from a run before the adjusted-run escape.
    pub fn run_offset(&self, level: u32, last: bool) -> i32 {
        let index = (level as usize & 0x3F) | (usize::from(last) << 6);
        i32::from(self.offsets[RUN_OFFSET_BASE + index])
    }

    pub fn symbol_count(&self) -> usize {
        self.reverse.iter().filter(|&&idx| idx != NO_CODE).count()
    }
}
