//! Default configuration constants for glosscast.
//!
//! Shape constants describe the recognition model's input contract and are
//! shared by the preprocessor, the frame buffer, and the tensor assembler.

/// Side length of a processed frame in pixels.
pub const FRAME_SIZE: usize = 224;

/// Color channels kept per pixel (RGB; alpha is discarded).
pub const CHANNELS: usize = 3;

/// Channels per pixel in a raw RGBA frame.
pub const RAW_CHANNELS: usize = 4;

/// Number of frames the model consumes per inference (temporal window).
pub const WINDOW_FRAMES: usize = 64;

/// Number of predictions kept per ranking.
pub const TOP_K: usize = 5;

/// Capture loop period in milliseconds (~30 fps).
pub const CAPTURE_PERIOD_MS: u64 = 30;

/// Inference loop poll period in milliseconds.
pub const POLL_PERIOD_MS: u64 = 100;

/// Minimum spacing between inference completions in milliseconds.
pub const INFERENCE_INTERVAL_MS: u64 = 2000;

/// Raw frames queued between the capture and preprocessing threads.
/// Captures beyond this are dropped rather than stalling the camera.
pub const FRAME_QUEUE: usize = 4;

/// How long `disable()` waits for an in-flight inference before detaching it.
pub const SHUTDOWN_TIMEOUT_MS: u64 = 1000;

/// Capacity of the caption channel handed to the transport collaborator.
pub const CAPTION_BUFFER: usize = 16;

/// Class count used for the synthetic gloss table when the model does not
/// report one (WLASL-2000 vocabulary).
pub const FALLBACK_CLASS_COUNT: usize = 2000;

/// Default model artifact path.
pub const MODEL_PATH: &str = "models/i3d_asl2000.onnx";

/// Default gloss table path.
pub const GLOSS_PATH: &str = "glosses/wlasl_glosses.json";

/// Model input tensor name.
pub const INPUT_NAME: &str = "input";

/// Model output tensor name.
pub const OUTPUT_NAME: &str = "output";

/// Placeholder label for a class index with no gloss.
pub fn placeholder_label(index: usize) -> String {
    format!("Sign_{}", index)
}
