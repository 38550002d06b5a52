//! Capture side of the pipeline: raw frames, frame sources, preprocessing.

pub mod frame;
pub mod preprocess;
pub mod source;

pub use frame::{ProcessedFrame, RawFrame};
pub use preprocess::Preprocessor;
pub use source::{FrameSource, ImageSequenceSource, MockFrameSource};
