//! glosscast - live sign language recognition for video calls
//!
//! Samples camera frames, keeps a sliding 64-frame window, runs an I3D-style
//! action recognition model over it every couple of seconds and turns the
//! top-ranked glosses into captions.
//!
//! ```no_run
//! use glosscast::{Config, GlossTable, MockEngine, MockFrameSource, Pipeline};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load_or_default(std::path::Path::new("glosscast.toml"))?;
//! let engine = Arc::new(MockEngine::new("demo"));
//! let table = Arc::new(GlossTable::synthetic(3));
//! let (sink, captions) = config.caption_channel();
//!
//! let mut pipeline = Pipeline::new(config.pipeline_config()).build(
//!     Box::new(MockFrameSource::new()),
//!     engine,
//!     table,
//!     Box::new(sink),
//! );
//! pipeline.enable()?;
//! if let Ok(caption) = captions.recv() {
//!     println!("{caption}");
//! }
//! pipeline.disable();
//! # Ok(())
//! # }
//! ```

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod config;
pub mod defaults;
pub mod error;
pub mod gloss;
pub mod infer;
pub mod pipeline;
pub mod video;

// Core traits (source → infer → sink)
pub use infer::InferenceEngine;
pub use pipeline::sink::CaptionSink;
pub use video::FrameSource;

// Building blocks
pub use gloss::{GlossTable, Prediction, PredictionRanker, PredictionSet};
pub use infer::{MockEngine, ModelInput, RawOutput, TensorAssembler};
#[cfg(feature = "onnx")]
pub use infer::{OnnxConfig, OnnxEngine};
pub use video::{ImageSequenceSource, MockFrameSource, Preprocessor, ProcessedFrame, RawFrame};

// Pipeline
pub use pipeline::{
    ChannelSink, CollectorSink, FrameBuffer, Pipeline, PipelineConfig, PipelineOrchestrator,
    PipelineState, PipelineStatus, ThrottleGate,
};

// Error handling
pub use error::{GlossError, Result};

// Config
pub use config::Config;

// Stage error reporting
pub use pipeline::error::{ErrorReporter, LogReporter, StageError};
