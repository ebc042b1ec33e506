#![forbid(unsafe_code)]

pub mod analysis;
pub mod bitwriter;
pub mod coefficients;
pub mod dct;
pub mod dequant;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod history;
pub mod macroblock;
pub mod packet;
pub mod satd;
pub mod scan;
pub mod skip;
pub mod tables;
pub mod vlc;

pub use analysis::{AnalysisContext, Analyzer, FlatAnalyzer, TransformAnalyzer};
pub use encoder::{Encoder, EncoderConfig, stride_for_width};
pub use error::{EncoderError, Result};
pub use frame::Frame;
pub use packet::{FrameType, Packet};
pub use vlc::{VlcCode, VlcTable};

pub const DEFAULT_QUANTIZER: i32 = 12;
pub const DEFAULT_MAX_PREDICTED_FRAMES: u32 = 30;

/// Encodes `frames` in order with a fresh session and returns one packet
/// per frame.
pub fn encode(
    frames: impl IntoIterator<Item = Frame>,
    width: u32,
    height: u32,
    config: EncoderConfig,
    vlc: Option<std::sync::Arc<VlcTable>>,
) -> Result<Vec<Packet>> {
    let mut encoder = Encoder::with_config(width, height, config)?;
    if let Some(table) = vlc {
        encoder.set_vlc_table(table);
    }
    frames
        .into_iter()
        .map(|frame| encoder.encode_packet(frame))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_returns_one_packet_per_frame() {
        let frames = (0..3).map(|_| Frame::solid(32, 32, 0xFF10_2030));
        let packets = encode(frames, 32, 32, EncoderConfig::default(), None).unwrap();
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].frame_type, FrameType::Intra);
        assert_eq!(packets[2].frame_type, FrameType::Prediction);
        assert_eq!(packets[2].frame_number, 2);
    }

    #[test]
    fn encode_rejects_bad_geometry() {
        let frames = vec![Frame::solid(24, 16, 0)];
        assert!(matches!(
            encode(frames, 24, 16, EncoderConfig::default(), None),
            Err(EncoderError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn quantizer_changes_intra_header() {
        let a = encode([Frame::solid(16, 16, 0xFF00_0000)], 16, 16, EncoderConfig::default(), None)
            .unwrap();
        let b = encode(
            [Frame::solid(16, 16, 0xFF00_0000)],
            16,
            16,
            EncoderConfig {
                quantizer: 30,
                ..Default::default()
            },
            None,
        )
        .unwrap();
        assert_ne!(a[0].data, b[0].data);
    }
}
