//! Model side of the pipeline: input assembly and model execution.

pub mod engine;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod tensor;

pub use engine::{InferenceEngine, MockEngine};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxConfig, OnnxEngine};
pub use tensor::TensorAssembler;

/// Model input clip, `[batch, channels, time, height, width]`.
pub type ModelInput = ndarray::Array5<f32>;

/// Raw model output, `[batch, classes, ...spatial]`.
pub type RawOutput = ndarray::ArrayD<f32>;
