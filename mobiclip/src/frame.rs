//! 32-bit ARGB input frames. Pixels are stored in memory as B, G, R, A.

use std::path::Path;

use crate::error::{EncoderError, Result};

pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
}

impl Frame {
    /// Wraps a tightly packed buffer.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::with_stride(width, height, width as usize * BYTES_PER_PIXEL, data)
    }

    /// Wraps a buffer whose rows are `stride` bytes apart.
    pub fn with_stride(width: u32, height: u32, stride: usize, data: Vec<u8>) -> Result<Self> {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        let expected = stride * height as usize;
        if stride < row_bytes || data.len() < expected {
            return Err(EncoderError::InvalidFrameBuffer {
                width,
                height,
                stride,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u32) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y).to_le_bytes());
            }
        }
        Self {
            data,
            width,
            height,
            stride: width as usize * BYTES_PER_PIXEL,
        }
    }

    pub fn solid(width: u32, height: u32, argb: u32) -> Self {
        Self::from_fn(width, height, |_, _| argb)
    }

    /// Checkerboard of `cell`-sized squares, `bright` in the top-left cell.
    pub fn grid(width: u32, height: u32, cell: u32, bright: u32, dark: u32) -> Self {
        let cell = cell.max(1);
        Self::from_fn(width, height, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                bright
            } else {
                dark
            }
        })
    }

    /// Splits a file of back-to-back tightly packed frames. A trailing
    /// partial frame is an error.
    pub fn all_from_raw(data: &[u8], width: u32, height: u32) -> Result<Vec<Self>> {
        let frame_len = width as usize * height as usize * BYTES_PER_PIXEL;
        if frame_len == 0 || data.len() % frame_len != 0 {
            return Err(EncoderError::InvalidFrameBuffer {
                width,
                height,
                stride: width as usize * BYTES_PER_PIXEL,
                expected: frame_len,
                actual: data.len(),
            });
        }
        data.chunks_exact(frame_len)
            .map(|chunk| Self::new(width, height, chunk.to_vec()))
            .collect()
    }

    pub fn all_from_raw_file(path: &Path, width: u32, height: u32) -> Result<Vec<Self>> {
        let data = std::fs::read(path)?;
        Self::all_from_raw(&data, width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The `width * 4` meaningful bytes of row `y`.
    ///
    /// # Panics
    /// If `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * BYTES_PER_PIXEL]
    }

    /// Pixel at `(x, y)` as `0xAARRGGBB`.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        let offset = x as usize * BYTES_PER_PIXEL;
        let px = &self.row(y)[offset..offset + BYTES_PER_PIXEL];
        u32::from_le_bytes([px[0], px[1], px[2], px[3]])
    }

    pub fn rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let [b, g, r, _] = self.pixel(x, y).to_le_bytes();
        (r, g, b)
    }
}
