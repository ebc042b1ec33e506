//! Per-macroblock mode and coefficient decisions.
//!
//! The encoder walks macroblocks and hands each non-skipped one to an
//! [`Analyzer`]; the analyzer fills the [`Macroblock`] and may write the
//! reconstruction it expects the decoder to produce into the session
//! buffers carried by [`AnalysisContext`].

use std::fmt;

use crate::dct::{forward_dct4x4, forward_dct8x8, inverse_dct4x4, inverse_dct8x8};
use crate::dequant::DequantTables;
use crate::frame::Frame;
use crate::macroblock::Macroblock;
use crate::satd::block_satd;
use crate::scan::{ZIGZAG_4X4, ZIGZAG_8X8, to_zigzag};

/// Prediction every built-in analyzer codes its residual against.
pub const MID_LEVEL: u8 = 128;

const MAX_LEVEL: i32 = 2047;

const YUV_FIX: i32 = 16;
const YUV_HALF: i32 = 1 << (YUV_FIX - 1);

/// BT.601 limited-range luma from 8-bit RGB.
pub fn rgb_to_y(r: u8, g: u8, b: u8) -> u8 {
    let luma = 16839 * i32::from(r) + 33059 * i32::from(g) + 6420 * i32::from(b);
    ((luma + YUV_HALF + (16 << YUV_FIX)) >> YUV_FIX) as u8
}

fn rgb_to_u_raw(r: u8, g: u8, b: u8) -> i32 {
    -9719 * i32::from(r) - 19081 * i32::from(g) + 28800 * i32::from(b) + (128 << YUV_FIX)
}

fn rgb_to_v_raw(r: u8, g: u8, b: u8) -> i32 {
    28800 * i32::from(r) - 24116 * i32::from(g) - 4684 * i32::from(b) + (128 << YUV_FIX)
}

/// Chroma of the 2x2 luma neighbourhood whose top-left pixel is `(x, y)`.
pub fn chroma_at(frame: &Frame, x: u32, y: u32) -> (u8, u8) {
    let mut u = 0;
    let mut v = 0;
    for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
        let (r, g, b) = frame.rgb(x + dx, y + dy);
        u += rgb_to_u_raw(r, g, b);
        v += rgb_to_v_raw(r, g, b);
    }
    let round = YUV_HALF << 2;
    (
        ((u + round) >> (YUV_FIX + 2)).clamp(0, 255) as u8,
        ((v + round) >> (YUV_FIX + 2)).clamp(0, 255) as u8,
    )
}

/// 8x8 luma samples with top-left at `(x, y)`.
pub fn luma_block(frame: &Frame, x: u32, y: u32) -> [u8; 64] {
    std::array::from_fn(|i| {
        let (r, g, b) = frame.rgb(x + (i % 8) as u32, y + (i / 8) as u32);
        rgb_to_y(r, g, b)
    })
}

/// U and V 8x8 blocks for the macroblock at `(x, y)`.
pub fn chroma_blocks(frame: &Frame, x: u32, y: u32) -> ([u8; 64], [u8; 64]) {
    let mut u = [0u8; 64];
    let mut v = [0u8; 64];
    for i in 0..64 {
        let (cu, cv) = chroma_at(frame, x + 2 * (i % 8) as u32, y + 2 * (i / 8) as u32);
        u[i] = cu;
        v[i] = cv;
    }
    (u, v)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaPlane {
    U,
    V,
}

/// What an analyzer sees of the session for one macroblock.
pub struct AnalysisContext<'a> {
    pub frame: &'a Frame,
    pub quantizer: u8,
    pub dequant: &'a DequantTables,
    pub stride: usize,
    /// `stride * height` luma reconstruction.
    pub luma: &'a mut [u8],
    /// `stride * height / 2`; U in the left half of each row, V in the right.
    pub chroma: &'a mut [u8],
}

impl AnalysisContext<'_> {
    /// Copies a square block of `size` luma pixels to `(x, y)`. Columns at
    /// or past the stride are dropped.
    pub fn store_luma(&mut self, x: u32, y: u32, size: usize, pixels: &[u8]) {
        let x = x as usize;
        let visible = size.min(self.stride.saturating_sub(x));
        if visible == 0 {
            return;
        }
        for (row, line) in pixels.chunks_exact(size).enumerate() {
            let start = (y as usize + row) * self.stride + x;
            self.luma[start..start + visible].copy_from_slice(&line[..visible]);
        }
    }

    /// Copies an 8x8 chroma block whose top-left chroma sample is `(x, y)`.
    /// Columns at or past half the stride are dropped.
    pub fn store_chroma(&mut self, plane: ChromaPlane, x: u32, y: u32, pixels: &[u8; 64]) {
        let half = self.stride / 2;
        let base = match plane {
            ChromaPlane::U => 0,
            ChromaPlane::V => half,
        };
        let x = x as usize;
        let visible = 8.min(half.saturating_sub(x));
        if visible == 0 {
            return;
        }
        for (row, line) in pixels.chunks_exact(8).enumerate() {
            let start = (y as usize + row) * self.stride + base + x;
            self.chroma[start..start + visible].copy_from_slice(&line[..visible]);
        }
    }
}

impl fmt::Debug for AnalysisContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisContext")
            .field("quantizer", &self.quantizer)
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}

/// Decides modes and coefficients for non-skipped macroblocks. Called in
/// this order per block: `configure_luma`, `analyze_chroma`, then
/// `setup_transforms`. Both chroma regions are marked complex between the
/// last two calls; `setup_transforms` may clear them.
pub trait Analyzer: fmt::Debug {
    fn configure_luma(&mut self, ctx: &mut AnalysisContext<'_>, mb: &mut Macroblock);

    /// Returns the chroma prediction mode.
    fn analyze_chroma(&mut self, ctx: &mut AnalysisContext<'_>, mb: &mut Macroblock) -> u8;

    fn setup_transforms(&mut self, ctx: &mut AnalysisContext<'_>, mb: &mut Macroblock);
}

/// Codes every block as flat: fixed modes, no residual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlatAnalyzer {
    pub luma_mode: u8,
    pub chroma_mode: u8,
}

impl Analyzer for FlatAnalyzer {
    fn configure_luma(&mut self, ctx: &mut AnalysisContext<'_>, mb: &mut Macroblock) {
        mb.luma_mode = self.luma_mode;
        ctx.store_luma(mb.x, mb.y, 16, &[MID_LEVEL; 256]);
    }

    fn analyze_chroma(&mut self, _ctx: &mut AnalysisContext<'_>, _mb: &mut Macroblock) -> u8 {
        self.chroma_mode
    }

    fn setup_transforms(&mut self, ctx: &mut AnalysisContext<'_>, mb: &mut Macroblock) {
        for region in &mut mb.chroma {
            region.complex = false;
        }
        for plane in [ChromaPlane::U, ChromaPlane::V] {
            ctx.store_chroma(plane, mb.x / 2, mb.y / 2, &[MID_LEVEL; 64]);
        }
    }
}

/// Quantized form of one transform block.
struct CodedBlock<const N: usize> {
    /// Levels in coding order.
    levels: [i32; N],
    reconstruction: [u8; N],
    nonzero: u32,
}

fn quantize<const N: usize>(coeffs: &[i32; N], steps: &[f32; N]) -> ([i32; N], [i32; N]) {
    let mut levels = [0i32; N];
    let mut dequantized = [0i32; N];
    for i in 0..N {
        let level = ((coeffs[i] as f32 / steps[i]).round() as i32).clamp(-MAX_LEVEL, MAX_LEVEL);
        levels[i] = level;
        dequantized[i] = (level as f32 * steps[i]) as i32;
    }
    (levels, dequantized)
}

fn residual<const N: usize>(source: &[u8; N]) -> [i32; N] {
    std::array::from_fn(|i| i32::from(source[i]) - i32::from(MID_LEVEL))
}

fn code_8x8(source: &[u8; 64], steps: &[f32; 64]) -> CodedBlock<64> {
    let (levels, dequantized) = quantize(&forward_dct8x8(&residual(source)), steps);
    CodedBlock {
        levels: to_zigzag(&levels, &ZIGZAG_8X8),
        reconstruction: inverse_dct8x8(&dequantized, &[MID_LEVEL; 64]),
        nonzero: levels.iter().filter(|&&l| l != 0).count() as u32,
    }
}

fn code_4x4(source: &[u8; 16], steps: &[f32; 16]) -> CodedBlock<16> {
    let (levels, dequantized) = quantize(&forward_dct4x4(&residual(source)), steps);
    CodedBlock {
        levels: to_zigzag(&levels, &ZIGZAG_4X4),
        reconstruction: inverse_dct4x4(&dequantized, &[MID_LEVEL; 16]),
        nonzero: levels.iter().filter(|&&l| l != 0).count() as u32,
    }
}

fn sub_block(block: &[u8; 64], index: usize) -> [u8; 16] {
    let (ox, oy) = ((index % 2) * 4, (index / 2) * 4);
    std::array::from_fn(|i| block[(oy + i / 4) * 8 + ox + i % 4])
}

fn place_sub_block(block: &mut [u8; 64], index: usize, pixels: &[u8; 16]) {
    let (ox, oy) = ((index % 2) * 4, (index / 2) * 4);
    for (i, &p) in pixels.iter().enumerate() {
        block[(oy + i / 4) * 8 + ox + i % 4] = p;
    }
}

/// Transforms the residual against a mid-level prediction, choosing per
/// luma quadrant between one 8x8 block and four 4x4 blocks by SATD plus a
/// rate term proportional to the quantizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformAnalyzer {
    pub luma_mode: u8,
    pub chroma_mode: u8,
}

impl TransformAnalyzer {
    fn lambda(quantizer: u8) -> u32 {
        u32::from(quantizer)
    }
}

impl Analyzer for TransformAnalyzer {
    fn configure_luma(&mut self, ctx: &mut AnalysisContext<'_>, mb: &mut Macroblock) {
        mb.luma_mode = self.luma_mode;
        let lambda = Self::lambda(ctx.quantizer);

        for (q, region) in mb.luma.iter_mut().enumerate() {
            let x = mb.x + (q as u32 % 2) * 8;
            let y = mb.y + (q as u32 / 2) * 8;
            let source = luma_block(ctx.frame, x, y);

            let whole = code_8x8(&source, &ctx.dequant.table_8x8);
            let quarters: [CodedBlock<16>; 4] =
                std::array::from_fn(|s| code_4x4(&sub_block(&source, s), &ctx.dequant.table_4x4));

            let mut split_recon = [0u8; 64];
            for (s, quarter) in quarters.iter().enumerate() {
                place_sub_block(&mut split_recon, s, &quarter.reconstruction);
            }
            let split_nonzero: u32 = quarters.iter().map(|b| b.nonzero).sum();

            if whole.nonzero == 0 && split_nonzero == 0 {
                ctx.store_luma(x, y, 8, &[MID_LEVEL; 64]);
                continue;
            }

            let whole_cost = block_satd(&source, &whole.reconstruction, 8) + lambda * whole.nonzero;
            let split_cost = block_satd(&source, &split_recon, 8) + lambda * split_nonzero;

            region.complex = true;
            if split_cost < whole_cost {
                region.split = true;
                for (s, quarter) in quarters.iter().enumerate() {
                    region.coded[s] = quarter.nonzero > 0;
                    region.sub_coefficients[s] = quarter.levels;
                }
                ctx.store_luma(x, y, 8, &split_recon);
            } else {
                region.coefficients = whole.levels;
                ctx.store_luma(x, y, 8, &whole.reconstruction);
            }
        }
    }

    fn analyze_chroma(&mut self, _ctx: &mut AnalysisContext<'_>, _mb: &mut Macroblock) -> u8 {
        self.chroma_mode
    }

    fn setup_transforms(&mut self, ctx: &mut AnalysisContext<'_>, mb: &mut Macroblock) {
        let (u, v) = chroma_blocks(ctx.frame, mb.x, mb.y);
        for ((region, source), plane) in mb
            .chroma
            .iter_mut()
            .zip([u, v])
            .zip([ChromaPlane::U, ChromaPlane::V])
        {
            let coded = code_8x8(&source, &ctx.dequant.table_8x8);
            if coded.nonzero == 0 {
                region.complex = false;
                ctx.store_chroma(plane, mb.x / 2, mb.y / 2, &[MID_LEVEL; 64]);
            } else {
                region.coefficients = coded.levels;
                ctx.store_chroma(plane, mb.x / 2, mb.y / 2, &coded.reconstruction);
            }
        }
    }
}
