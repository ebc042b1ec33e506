use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::analysis::{AnalysisContext, Analyzer, FlatAnalyzer};
use crate::bitwriter::BitWriter;
use crate::dequant::DequantTables;
use crate::error::{EncoderError, Result};
use crate::frame::Frame;
use crate::history::FrameHistory;
use crate::macroblock::{MACROBLOCK_SIZE, Macroblock};
use crate::packet::{FrameType, Packet};
use crate::skip::blocks_identical;
use crate::tables::{MAX_QUANTIZER, MIN_QUANTIZER};
use crate::vlc::VlcTable;
use crate::{DEFAULT_MAX_PREDICTED_FRAMES, DEFAULT_QUANTIZER};

const PREDICTED_BLOCK_MARKER: u64 = 7;
const TERMINATOR_BITS: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Clamped to `12..=52`.
    pub quantizer: i32,
    /// Prediction frames allowed between two intra frames.
    pub max_predicted_frames: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            quantizer: DEFAULT_QUANTIZER,
            max_predicted_frames: DEFAULT_MAX_PREDICTED_FRAMES,
        }
    }
}

/// Row pitch of the reconstruction buffers for a given frame width.
pub fn stride_for_width(width: u32) -> usize {
    match width {
        0..=256 => 256,
        257..=512 => 512,
        _ => 1024,
    }
}

/// Buffers the analyzer writes before a frame can still fail.
struct Snapshot {
    luma_recon: Vec<u8>,
    chroma_recon: Vec<u8>,
    macroblocks: Vec<Macroblock>,
}

#[derive(Debug)]
pub struct Encoder {
    quantizer: u8,
    max_predicted_frames: u32,
    width: u32,
    height: u32,
    stride: usize,
    dequant: DequantTables,
    luma_recon: Vec<u8>,
    chroma_recon: Vec<u8>,
    macroblocks: Vec<Macroblock>,
    mb_cols: usize,
    last_frame_type: Option<FrameType>,
    predicted_frames: u32,
    history: FrameHistory,
    frame_index: u64,
    vlc: Option<Arc<VlcTable>>,
    analyzer: Box<dyn Analyzer + Send>,
}

impl Encoder {
    pub fn new(quantizer: i32, width: u32, height: u32) -> Result<Self> {
        Self::with_config(
            width,
            height,
            EncoderConfig {
                quantizer,
                ..Default::default()
            },
        )
    }

    pub fn with_config(width: u32, height: u32, config: EncoderConfig) -> Result<Self> {
        if !width.is_multiple_of(MACROBLOCK_SIZE) || !height.is_multiple_of(MACROBLOCK_SIZE) {
            return Err(EncoderError::InvalidDimensions { width, height });
        }

        let quantizer = config.quantizer.clamp(MIN_QUANTIZER, MAX_QUANTIZER);
        if quantizer != config.quantizer {
            warn!(requested = config.quantizer, quantizer, "quantizer clamped");
        }

        let stride = stride_for_width(width);
        let mb_cols = (width / MACROBLOCK_SIZE) as usize;
        let mb_rows = (height / MACROBLOCK_SIZE) as usize;
        let macroblocks = (0..mb_rows)
            .flat_map(|row| {
                (0..mb_cols).map(move |col| {
                    Macroblock::new(col as u32 * MACROBLOCK_SIZE, row as u32 * MACROBLOCK_SIZE)
                })
            })
            .collect();

        info!(
            width,
            height,
            quantizer,
            stride,
            max_predicted_frames = config.max_predicted_frames,
            "created encoder"
        );

        Ok(Self {
            quantizer: quantizer as u8,
            max_predicted_frames: config.max_predicted_frames,
            width,
            height,
            stride,
            dequant: DequantTables::new(quantizer),
            luma_recon: vec![0; stride * height as usize],
            chroma_recon: vec![0; stride * height as usize / 2],
            macroblocks,
            mb_cols,
            last_frame_type: None,
            predicted_frames: 0,
            history: FrameHistory::new(),
            frame_index: 0,
            vlc: None,
            analyzer: Box::new(FlatAnalyzer::default()),
        })
    }

    pub fn with_vlc_table(mut self, table: Arc<VlcTable>) -> Self {
        self.set_vlc_table(table);
        self
    }

    pub fn with_analyzer(mut self, analyzer: Box<dyn Analyzer + Send>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn set_vlc_table(&mut self, table: Arc<VlcTable>) {
        debug!(symbols = table.symbol_count(), "installed VLC table");
        self.vlc = Some(table);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn quantizer(&self) -> u8 {
        self.quantizer
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn dequant_tables(&self) -> &DequantTables {
        &self.dequant
    }

    pub fn luma_reconstruction(&self) -> &[u8] {
        &self.luma_recon
    }

    pub fn chroma_reconstruction(&self) -> &[u8] {
        &self.chroma_recon
    }

    /// Row-major macroblock grid as left by the last encode call.
    pub fn macroblocks(&self) -> &[Macroblock] {
        &self.macroblocks
    }

    pub fn macroblock(&self, col: usize, row: usize) -> Option<&Macroblock> {
        if col >= self.mb_cols {
            return None;
        }
        self.macroblocks.get(row * self.mb_cols + col)
    }

    pub fn last_frame_type(&self) -> Option<FrameType> {
        self.last_frame_type
    }

    /// Prediction frames emitted since the last intra frame.
    pub fn predicted_frames(&self) -> u32 {
        self.predicted_frames
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_index
    }

    pub fn history(&self) -> &FrameHistory {
        &self.history
    }

    fn next_frame_type(&self) -> FrameType {
        match self.last_frame_type {
            Some(_) if self.predicted_frames < self.max_predicted_frames => FrameType::Prediction,
            _ => FrameType::Intra,
        }
    }

    pub fn encode_frame(&mut self, frame: Frame) -> Result<Vec<u8>> {
        self.encode_packet(frame).map(|packet| packet.data)
    }

    /// Encodes one frame. Session state only changes when the whole frame
    /// was coded; on error the reconstruction buffers and macroblock grid
    /// are restored and the next call sees the same GOP position.
    pub fn encode_packet(&mut self, frame: Frame) -> Result<Packet> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(EncoderError::DimensionMismatch {
                expected_w: self.width,
                expected_h: self.height,
                got_w: frame.width(),
                got_h: frame.height(),
            });
        }

        let frame_type = self.next_frame_type();
        let saved = self.snapshot();
        let coded = match frame_type {
            FrameType::Intra => self.encode_intra(&frame).map(|data| (data, 0)),
            FrameType::Prediction => self.encode_prediction(&frame),
        };
        let (data, skipped) = match coded {
            Ok(coded) => coded,
            Err(err) => {
                self.restore(saved);
                return Err(err);
            }
        };

        match frame_type {
            FrameType::Intra => self.predicted_frames = 0,
            FrameType::Prediction => self.predicted_frames += 1,
        }
        self.last_frame_type = Some(frame_type);
        self.history.push(frame);

        let frame_number = self.frame_index;
        self.frame_index += 1;

        debug!(
            frame_number,
            ?frame_type,
            bytes = data.len(),
            skipped,
            "encoded frame"
        );

        Ok(Packet {
            data,
            frame_type,
            frame_number,
        })
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            luma_recon: self.luma_recon.clone(),
            chroma_recon: self.chroma_recon.clone(),
            macroblocks: self.macroblocks.clone(),
        }
    }

    fn restore(&mut self, saved: Snapshot) {
        self.luma_recon = saved.luma_recon;
        self.chroma_recon = saved.chroma_recon;
        self.macroblocks = saved.macroblocks;
    }

    fn analyze_macroblock(&mut self, frame: &Frame, index: usize) {
        let Self {
            analyzer,
            macroblocks,
            luma_recon,
            chroma_recon,
            dequant,
            quantizer,
            stride,
            ..
        } = self;
        let mb = &mut macroblocks[index];
        mb.reset();

        let mut ctx = AnalysisContext {
            frame,
            quantizer: *quantizer,
            dequant,
            stride: *stride,
            luma: luma_recon,
            chroma: chroma_recon,
        };
        analyzer.configure_luma(&mut ctx, mb);
        mb.chroma_mode = analyzer.analyze_chroma(&mut ctx, mb);
        for region in &mut mb.chroma {
            region.complex = true;
        }
        analyzer.setup_transforms(&mut ctx, mb);

        trace!(
            x = mb.x,
            y = mb.y,
            mask = mb.block_mask(),
            luma_mode = mb.luma_mode,
            chroma_mode = mb.chroma_mode,
            "analyzed macroblock"
        );
    }

    fn encode_intra(&mut self, frame: &Frame) -> Result<Vec<u8>> {
        for index in 0..self.macroblocks.len() {
            self.analyze_macroblock(frame, index);
        }

        let mut w = BitWriter::new();
        w.write_bit(true); // intra
        w.write_bit(true); // YUV
        w.write_bit(false); // table selector
        w.write_bits(u64::from(self.quantizer), 6);

        let vlc = self.vlc.as_deref();
        for mb in &self.macroblocks {
            w.write_bit(false);
            mb.write_body(vlc, &mut w)?;
        }

        w.write_bits(0, TERMINATOR_BITS);
        Ok(w.finalize())
    }

    fn encode_prediction(&mut self, frame: &Frame) -> Result<(Vec<u8>, usize)> {
        let mut skipped = 0;
        for index in 0..self.macroblocks.len() {
            let (x, y) = (self.macroblocks[index].x, self.macroblocks[index].y);
            let identical = self
                .history
                .latest()
                .is_some_and(|previous| blocks_identical(frame, previous, x, y));

            if identical {
                let mb = &mut self.macroblocks[index];
                mb.reset();
                mb.predict = true;
                skipped += 1;
                trace!(x, y, "skipped macroblock");
            } else {
                self.analyze_macroblock(frame, index);
            }
        }

        let mut w = BitWriter::new();
        w.write_bit(false); // prediction
        w.write_se(0); // reserved delta

        let vlc = self.vlc.as_deref();
        for mb in &self.macroblocks {
            if mb.predict {
                w.write_bit(true);
                w.write_ue(0);
            } else {
                w.write_bits(PREDICTED_BLOCK_MARKER, 5);
                mb.write_body(vlc, &mut w)?;
            }
        }

        w.write_bits(0, TERMINATOR_BITS);
        Ok((w.finalize(), skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey(width: u32, height: u32) -> Frame {
        Frame::solid(width, height, 0xFF80_8080)
    }

    #[test]
    fn new_valid_dimensions() {
        let enc = Encoder::new(20, 64, 48).unwrap();
        assert_eq!(enc.width(), 64);
        assert_eq!(enc.height(), 48);
        assert_eq!(enc.quantizer(), 20);
        assert_eq!(enc.macroblocks().len(), 12);
        assert_eq!(enc.macroblock(3, 2).map(|mb| (mb.x, mb.y)), Some((48, 32)));
        assert!(enc.macroblock(4, 0).is_none());
    }

    #[test]
    fn new_rejects_unaligned_dimensions() {
        match Encoder::new(12, 33, 32) {
            Err(EncoderError::InvalidDimensions { width, height }) => {
                assert_eq!((width, height), (33, 32));
            }
            other => panic!("expected InvalidDimensions, got {other:?}"),
        }
        assert!(Encoder::new(12, 32, 8).is_err());
    }

    #[test]
    fn any_multiple_of_sixteen_is_accepted() {
        let wide = Encoder::new(12, 1040, 16).unwrap();
        assert_eq!(wide.stride(), 1024);
        assert_eq!(wide.luma_reconstruction().len(), 1024 * 16);
        assert_eq!(wide.macroblocks().len(), 65);

        let empty = Encoder::new(12, 0, 16).unwrap();
        assert!(empty.macroblocks().is_empty());
    }

    #[test]
    fn quantizer_is_clamped() {
        assert_eq!(Encoder::new(0, 16, 16).unwrap().quantizer(), 12);
        assert_eq!(Encoder::new(200, 16, 16).unwrap().quantizer(), 52);
    }

    #[test]
    fn reconstruction_buffers_follow_stride() {
        let enc = Encoder::new(12, 320, 32).unwrap();
        assert_eq!(enc.stride(), 512);
        assert_eq!(enc.luma_reconstruction().len(), 512 * 32);
        assert_eq!(enc.chroma_reconstruction().len(), 512 * 16);
    }

    #[test]
    fn first_frame_is_intra() {
        let mut enc = Encoder::new(12, 32, 32).unwrap();
        assert_eq!(enc.last_frame_type(), None);
        let packet = enc.encode_packet(grey(32, 32)).unwrap();
        assert_eq!(packet.frame_type, FrameType::Intra);
        assert_eq!(packet.frame_number, 0);
        assert_eq!(enc.history().len(), 1);
    }

    #[test]
    fn max_predicted_frames_controls_gop() {
        let config = EncoderConfig {
            quantizer: 12,
            max_predicted_frames: 2,
        };
        let mut enc = Encoder::with_config(16, 16, config).unwrap();
        let types: Vec<FrameType> = (0..7)
            .map(|_| enc.encode_packet(grey(16, 16)).unwrap().frame_type)
            .collect();
        use FrameType::*;
        assert_eq!(
            types,
            vec![Intra, Prediction, Prediction, Intra, Prediction, Prediction, Intra]
        );
    }

    #[test]
    fn zero_predicted_frames_is_all_intra() {
        let config = EncoderConfig {
            quantizer: 12,
            max_predicted_frames: 0,
        };
        let mut enc = Encoder::with_config(16, 16, config).unwrap();
        for _ in 0..3 {
            assert_eq!(
                enc.encode_packet(grey(16, 16)).unwrap().frame_type,
                FrameType::Intra
            );
        }
    }

    #[test]
    fn dimension_mismatch_error() {
        let mut enc = Encoder::new(12, 32, 32).unwrap();
        match enc.encode_frame(grey(64, 32)) {
            Err(EncoderError::DimensionMismatch {
                expected_w,
                expected_h,
                got_w,
                got_h,
            }) => {
                assert_eq!((expected_w, expected_h), (32, 32));
                assert_eq!((got_w, got_h), (64, 32));
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
        assert_eq!(enc.frame_count(), 0);
    }

    #[test]
    fn flat_intra_frame_bytes() {
        let mut enc = Encoder::new(12, 32, 32).unwrap();
        let data = enc.encode_frame(grey(32, 32)).unwrap();
        assert_eq!(data, vec![0xC6, 0x20, 0x20, 0x20, 0x20, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn repeated_frame_is_fully_skipped() {
        let mut enc = Encoder::new(12, 32, 32).unwrap();
        enc.encode_frame(grey(32, 32)).unwrap();
        let data = enc.encode_frame(grey(32, 32)).unwrap();
        // 0, se(0), 4 x (1, ue(0)), 16 zero bits
        assert_eq!(data, vec![0x7F, 0xC0, 0x00, 0x00]);
        assert!(enc.macroblocks().iter().all(|mb| mb.predict));
    }

    #[test]
    fn changed_block_is_recoded() {
        let mut enc = Encoder::new(12, 32, 16).unwrap();
        enc.encode_frame(grey(32, 16)).unwrap();
        let changed =
            Frame::from_fn(32, 16, |x, _| if x >= 16 { 0xFF00_0000 } else { 0xFF80_8080 });
        let data = enc.encode_frame(changed).unwrap();
        assert!(enc.macroblocks()[0].predict);
        assert!(!enc.macroblocks()[1].predict);
        // 0 1 | 1 1 | 00111 1 000 000 | 16 zeros
        assert_eq!(data, vec![0b0111_0011, 0b1100_0000, 0x00, 0x00]);
    }

    #[test]
    fn frame_numbers_increment() {
        let mut enc = Encoder::new(12, 16, 16).unwrap();
        for expected in 0..5u64 {
            let packet = enc.encode_packet(grey(16, 16)).unwrap();
            assert_eq!(packet.frame_number, expected);
        }
        assert_eq!(enc.frame_count(), 5);
        assert_eq!(enc.predicted_frames(), 4);
    }

    #[test]
    fn stride_tiers() {
        assert_eq!(stride_for_width(16), 256);
        assert_eq!(stride_for_width(256), 256);
        assert_eq!(stride_for_width(272), 512);
        assert_eq!(stride_for_width(512), 512);
        assert_eq!(stride_for_width(528), 1024);
    }
}
