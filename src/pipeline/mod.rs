//! Live recognition pipeline.
//!
//! Capture, preprocessing and inference each run on their own thread while
//! the pipeline is enabled. They share a sliding frame window, and a throttle
//! gate keeps model runs spaced apart and never overlapping.

pub mod buffer;
pub mod clock;
pub mod error;
pub mod orchestrator;
pub mod sink;
pub mod stats;
pub mod throttle;

pub use buffer::FrameBuffer;
pub use clock::{Clock, MockClock, SystemClock};
pub use error::{ErrorReporter, LogReporter, StageError};
pub use orchestrator::{
    Pipeline, PipelineConfig, PipelineOrchestrator, PipelineState, PipelineStatus,
};
pub use sink::{CaptionSink, ChannelSink, CollectorSink};
pub use stats::{PipelineStats, StatsSnapshot};
pub use throttle::{ThrottleGate, ThrottlePermit};
