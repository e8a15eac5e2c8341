//! Raw display captures and their PNG encoding.
//!
//! Platform backends hand back a [`Frame`] of tightly packed 8-bit RGBA
//! pixels.  Both supported capture APIs produce BGRA with a per-row stride
//! that may exceed `width * 4`, so [`Frame::from_bgra_rows`] does the swizzle
//! and the row compaction in one pass.

use thiserror::Error;

/// Errors produced while building or encoding a [`Frame`].
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame buffer is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("row stride {stride} is smaller than {min} bytes")]
    StrideTooSmall { stride: usize, min: usize },

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

/// One complete capture of the primary display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Frame {
    /// Wraps an RGBA buffer, rejecting partial frames.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Builds a frame from BGRA rows laid out `stride` bytes apart.
    ///
    /// The alpha channel is forced opaque; desktop captures report undefined
    /// alpha on some display configurations.
    pub fn from_bgra_rows(
        width: u32,
        height: u32,
        stride: usize,
        bgra: &[u8],
    ) -> Result<Self, FrameError> {
        let row_bytes = width as usize * 4;
        if stride < row_bytes {
            return Err(FrameError::StrideTooSmall {
                stride,
                min: row_bytes,
            });
        }
        let needed = stride * height.saturating_sub(1) as usize + row_bytes;
        if height > 0 && bgra.len() < needed {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                expected: needed,
                actual: bgra.len(),
            });
        }

        let mut rgba = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            for px in bgra[start..start + row_bytes].chunks_exact(4) {
                rgba.extend_from_slice(&[px[2], px[1], px[0], 0xFF]);
            }
        }
        Self::new(width, height, rgba)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Encodes the frame as an 8-bit RGBA PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, FrameError> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.rgba)?;
            writer.finish()?;
        }
        Ok(out)
    }
}
