//! Frame types flowing through the capture path.

use crate::defaults::{CHANNELS, FRAME_SIZE, RAW_CHANNELS};
use crate::error::{GlossError, Result};
use image::RgbaImage;

/// A raw RGBA raster as produced by a frame source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    width: u32,
    height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    data: Vec<u8>,
}

impl RawFrame {
    /// Creates a frame from RGBA bytes, validating dimensions and length.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GlossError::invalid_frame(format!(
                "degenerate dimensions {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize * RAW_CHANNELS;
        if data.len() != expected {
            return Err(GlossError::invalid_frame(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Creates a frame where every pixel has the same RGB value (alpha 255).
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self> {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * RAW_CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Channel value at pixel `(x, y)`.
    #[inline]
    pub(crate) fn channel(&self, x: usize, y: usize, c: usize) -> u8 {
        self.data[(y * self.width as usize + x) * RAW_CHANNELS + c]
    }
}

impl TryFrom<RgbaImage> for RawFrame {
    type Error = GlossError;

    fn try_from(image: RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw())
    }
}

/// A normalized 224×224×3 frame, values in [-1, 1], channel innermost.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFrame {
    data: Vec<f32>,
}

impl ProcessedFrame {
    /// Number of values in one processed frame.
    pub const LEN: usize = FRAME_SIZE * FRAME_SIZE * CHANNELS;

    /// Wraps an H×W×C buffer of exactly [`Self::LEN`] values.
    pub fn from_vec(data: Vec<f32>) -> Result<Self> {
        if data.len() != Self::LEN {
            return Err(GlossError::invalid_frame(format!(
                "processed frame needs {} values, got {}",
                Self::LEN,
                data.len()
            )));
        }
        Ok(Self { data })
    }

    /// A frame with every value set to `value`.
    pub fn filled(value: f32) -> Self {
        Self {
            data: vec![value; Self::LEN],
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Value at row `h`, column `w`, channel `c`.
    #[inline]
    pub fn get(&self, h: usize, w: usize, c: usize) -> f32 {
        self.data[(h * FRAME_SIZE + w) * CHANNELS + c]
    }
}

impl AsRef<ProcessedFrame> for ProcessedFrame {
    fn as_ref(&self) -> &ProcessedFrame {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_frame_rejects_zero_dimensions() {
        assert!(matches!(
            RawFrame::new(0, 10, vec![]),
            Err(GlossError::InvalidFrame { .. })
        ));
        assert!(matches!(
            RawFrame::new(10, 0, vec![]),
            Err(GlossError::InvalidFrame { .. })
        ));
    }

    #[test]
    fn raw_frame_rejects_length_mismatch() {
        let result = RawFrame::new(2, 2, vec![0u8; 15]);
        match result {
            Err(GlossError::InvalidFrame { message }) => {
                assert!(message.contains("expected 16 bytes"));
            }
            other => panic!("Expected InvalidFrame, got {:?}", other),
        }
    }

    #[test]
    fn raw_frame_channel_indexing() {
        let data = vec![
            1, 2, 3, 255, // (0,0)
            4, 5, 6, 255, // (1,0)
            7, 8, 9, 255, // (0,1)
            10, 11, 12, 255, // (1,1)
        ];
        let frame = RawFrame::new(2, 2, data).unwrap();
        assert_eq!(frame.channel(1, 0, 0), 4);
        assert_eq!(frame.channel(0, 1, 2), 9);
        assert_eq!(frame.channel(1, 1, 1), 11);
    }

    #[test]
    fn raw_frame_from_rgba_image() {
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let frame = RawFrame::try_from(image).unwrap();
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channel(2, 1, 1), 20);
    }

    #[test]
    fn solid_frame_fills_every_pixel() {
        let frame = RawFrame::solid(4, 3, [128, 64, 32]).unwrap();
        assert_eq!(frame.data().len(), 4 * 3 * 4);
        assert_eq!(frame.channel(3, 2, 0), 128);
        assert_eq!(frame.channel(3, 2, 2), 32);
    }

    #[test]
    fn processed_frame_requires_exact_length() {
        assert!(ProcessedFrame::from_vec(vec![0.0; 10]).is_err());
        assert!(ProcessedFrame::from_vec(vec![0.0; ProcessedFrame::LEN]).is_ok());
    }

    #[test]
    fn processed_frame_get_is_channel_innermost() {
        let mut data = vec![0.0; ProcessedFrame::LEN];
        data[(5 * FRAME_SIZE + 7) * CHANNELS + 2] = 0.5;
        let frame = ProcessedFrame::from_vec(data).unwrap();
        assert_eq!(frame.get(5, 7, 2), 0.5);
        assert_eq!(frame.get(7, 5, 2), 0.0);
    }
}
