use crate::error::{GlossError, Result};
use crate::infer::{ModelInput, RawOutput};
use ndarray::{ArrayD, IxDyn};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Trait for sign recognition model execution.
///
/// A loaded engine value is the model handle: implementations load their
/// artifact in a constructor and are shared read-only afterwards. `run` may
/// block for a long time; callers guarantee it is never invoked concurrently
/// from the pipeline.
pub trait InferenceEngine: Send + Sync {
    /// Run the model on a `[1, 3, T, H, W]` clip and return the raw output.
    fn run(&self, input: &ModelInput) -> Result<RawOutput>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Number of output classes, when the engine knows it up front.
    fn class_count(&self) -> Option<usize> {
        None
    }

    /// Check if the engine is ready to run
    fn is_ready(&self) -> bool {
        true
    }
}

/// Implement InferenceEngine for Arc<T> to allow sharing across sessions.
impl<T: InferenceEngine> InferenceEngine for Arc<T> {
    fn run(&self, input: &ModelInput) -> Result<RawOutput> {
        (**self).run(input)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn class_count(&self) -> Option<usize> {
        (**self).class_count()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock engine for testing
#[derive(Debug, Clone)]
pub struct MockEngine {
    model_name: String,
    output: RawOutput,
    should_fail: bool,
    ready: bool,
    latency: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockEngine {
    /// Create a mock engine returning three fixed logits.
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            output: logits_output(&[5.0, 1.0, 0.5]),
            should_fail: false,
            ready: true,
            latency: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Configure the mock to return `[1, classes]` logits
    pub fn with_logits(mut self, logits: &[f32]) -> Self {
        self.output = logits_output(logits);
        self
    }

    /// Configure the mock to return an arbitrary output tensor
    pub fn with_output(mut self, output: RawOutput) -> Self {
        self.output = output;
        self
    }

    /// Configure the mock to fail on run
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to report it is not ready
    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Configure the mock to sleep before returning
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Shared counter of `run` invocations.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

fn logits_output(logits: &[f32]) -> RawOutput {
    ArrayD::from_shape_vec(IxDyn(&[1, logits.len()]), logits.to_vec())
        .unwrap_or_else(|_| ArrayD::zeros(IxDyn(&[1, 0])))
}

impl InferenceEngine for MockEngine {
    fn run(&self, input: &ModelInput) -> Result<RawOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        if self.should_fail {
            return Err(GlossError::inference("mock inference failure"));
        }
        if input.shape()[0] != 1 {
            return Err(GlossError::inference(format!(
                "expected batch of 1, got {}",
                input.shape()[0]
            )));
        }
        Ok(self.output.clone())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn class_count(&self) -> Option<usize> {
        self.output.shape().get(1).copied()
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}
