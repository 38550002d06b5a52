//! Layout transform from buffered frames to the model's input tensor.
//!
//! Frames are stored time-major with pixels row-major and channels innermost
//! (T × H × W × C). The model consumes a channel-major clip
//! (1 × C × T × H × W), so every element moves:
//!
//! ```text
//! src = t*(H*W*C) + (h*W + w)*C + c
//! dst = c*(T*H*W) + t*(H*W) + h*W + w
//! ```

use crate::defaults::{CHANNELS, FRAME_SIZE, WINDOW_FRAMES};
use crate::error::{GlossError, Result};
use crate::infer::ModelInput;
use crate::video::frame::ProcessedFrame;

#[derive(Debug, Clone, Copy, Default)]
pub struct TensorAssembler;

impl TensorAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Logical input shape: `[batch, channels, time, height, width]`.
    pub fn shape() -> [usize; 5] {
        [1, CHANNELS, WINDOW_FRAMES, FRAME_SIZE, FRAME_SIZE]
    }

    /// Build the model input from exactly [`WINDOW_FRAMES`] frames, oldest first.
    pub fn build<F: AsRef<ProcessedFrame>>(&self, frames: &[F]) -> Result<ModelInput> {
        if frames.len() != WINDOW_FRAMES {
            return Err(GlossError::InsufficientFrames {
                needed: WINDOW_FRAMES,
                got: frames.len(),
            });
        }

        let plane = FRAME_SIZE * FRAME_SIZE;
        let channel_stride = WINDOW_FRAMES * plane;
        let mut data = vec![0.0f32; CHANNELS * channel_stride];

        for (t, frame) in frames.iter().enumerate() {
            let frame_offset = t * plane;
            for (pixel, values) in frame.as_ref().as_slice().chunks_exact(CHANNELS).enumerate() {
                for (c, &value) in values.iter().enumerate() {
                    data[c * channel_stride + frame_offset + pixel] = value;
                }
            }
        }

        let [b, c, t, h, w] = Self::shape();
        ModelInput::from_shape_vec((b, c, t, h, w), data)
            .map_err(|e| GlossError::inference(format!("failed to shape input tensor: {}", e)))
    }
}
