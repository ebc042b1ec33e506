use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncoderError {
    /// Frame dimensions must be multiples of 16.
    #[error("invalid dimensions {width}x{height}: both must be multiples of 16")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("frame dimension mismatch: expected {expected_w}x{expected_h}, got {got_w}x{got_h}")]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        got_w: u32,
        got_h: u32,
    },

    /// Pixel buffer too small for the declared geometry.
    #[error("invalid frame buffer {width}x{height}/{stride}: got {actual} bytes, need {expected}")]
    InvalidFrameBuffer {
        width: u32,
        height: u32,
        stride: usize,
        expected: usize,
        actual: usize,
    },

    /// Coefficient does not fit the 12-bit raw escape field.
    #[error("coefficient {value} at scan position {position} is outside -2048..=2047")]
    CoefficientOutOfRange { value: i32, position: usize },

    #[error("prediction mode {mode} does not fit in 3 bits")]
    InvalidPredictionMode { mode: u8 },

    #[error("coefficient block has {len} entries, expected 16 or 64")]
    InvalidBlockLength { len: usize },

    #[error("a VLC table is required to code transform coefficients")]
    MissingVlcTable,

    #[error("invalid VLC table: {0}")]
    InvalidVlcTable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EncoderError>;
