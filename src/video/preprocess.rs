//! Frame preprocessing: aspect-preserving bilinear resize, center crop, and
//! normalization into the model's [-1, 1] input range.
//!
//! The resize scales the short side to [`FRAME_SIZE`] and the crop keeps the
//! central `FRAME_SIZE × FRAME_SIZE` window. Only the pixels inside the crop
//! window are ever sampled, so the full resized image is never materialized.
//! The numeric steps match the ones the model was trained with:
//!
//! - `scale = FRAME_SIZE / min(width, height)`
//! - resized dimension `= floor(dim * scale)`
//! - bilinear sample at `src = dst / scale`, interpolating along x then y,
//!   rounded to the nearest byte
//! - `out = (value / 255) * 2 - 1`

use crate::defaults::{CHANNELS, FRAME_SIZE};
use crate::error::{GlossError, Result};
use crate::video::frame::{ProcessedFrame, RawFrame};

/// Sampling coordinates for one destination row or column.
#[derive(Debug, Clone, Copy)]
struct Tap {
    lo: usize,
    hi: usize,
    frac: f64,
}

/// Converts raw RGBA frames into normalized model frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Resize, crop, and normalize one frame.
    pub fn process(&self, raw: &RawFrame) -> Result<ProcessedFrame> {
        let width = raw.width() as usize;
        let height = raw.height() as usize;
        if width == 0 || height == 0 {
            return Err(GlossError::invalid_frame(format!(
                "degenerate dimensions {}x{}",
                width, height
            )));
        }

        let min_dim = width.min(height);
        let scale = FRAME_SIZE as f64 / min_dim as f64;
        let (resized_w, resized_h) = resized_dimensions(width, height);

        let crop_x = resized_w.saturating_sub(FRAME_SIZE) / 2;
        let crop_y = resized_h.saturating_sub(FRAME_SIZE) / 2;

        let cols = taps(crop_x, scale, width);
        let rows = taps(crop_y, scale, height);

        let mut out = Vec::with_capacity(ProcessedFrame::LEN);
        for row in &rows {
            for col in &cols {
                for c in 0..CHANNELS {
                    let v00 = raw.channel(col.lo, row.lo, c) as f64;
                    let v10 = raw.channel(col.hi, row.lo, c) as f64;
                    let v01 = raw.channel(col.lo, row.hi, c) as f64;
                    let v11 = raw.channel(col.hi, row.hi, c) as f64;

                    let top = v00 * (1.0 - col.frac) + v10 * col.frac;
                    let bottom = v01 * (1.0 - col.frac) + v11 * col.frac;
                    let value = top * (1.0 - row.frac) + bottom * row.frac;

                    out.push(normalize(value.round().clamp(0.0, 255.0) as u8));
                }
            }
        }

        ProcessedFrame::from_vec(out)
    }
}

/// Dimensions after scaling the short side to [`FRAME_SIZE`].
///
/// Integer arithmetic gives `floor(dim * FRAME_SIZE / min_dim)` without the
/// rounding drift of a float multiply, so the short side is always exact.
pub fn resized_dimensions(width: usize, height: usize) -> (usize, usize) {
    let min_dim = width.min(height).max(1);
    (width * FRAME_SIZE / min_dim, height * FRAME_SIZE / min_dim)
}

/// Map a byte to the model's [-1, 1] range.
#[inline]
pub fn normalize(value: u8) -> f32 {
    (value as f32 / 255.0) * 2.0 - 1.0
}

fn taps(crop_origin: usize, scale: f64, src_len: usize) -> Vec<Tap> {
    (0..FRAME_SIZE)
        .map(|i| {
            let src = (crop_origin + i) as f64 / scale;
            let lo = (src.floor() as usize).min(src_len - 1);
            let hi = (lo + 1).min(src_len - 1);
            Tap {
                lo,
                hi,
                frac: src - lo as f64,
            }
        })
        .collect()
}
