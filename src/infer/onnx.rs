//! ONNX Runtime backed engine for the I3D sign recognition model.

use crate::defaults;
use crate::error::{GlossError, Result};
use crate::infer::engine::InferenceEngine;
use crate::infer::{ModelInput, RawOutput};
use ort::{
    inputs,
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};

/// Configuration for ONNX engine initialization
#[derive(Debug, Clone)]
pub struct OnnxConfig {
    pub model_path: PathBuf,
    pub input_name: String,
    pub output_name: String,
    pub threads: Option<usize>,
    /// Class count of the model head, if known ahead of the first run.
    pub class_count: Option<usize>,
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(defaults::MODEL_PATH),
            input_name: defaults::INPUT_NAME.to_string(),
            output_name: defaults::OUTPUT_NAME.to_string(),
            threads: None,
            class_count: None,
        }
    }
}

impl From<&crate::config::ModelConfig> for OnnxConfig {
    fn from(config: &crate::config::ModelConfig) -> Self {
        Self {
            model_path: config.path.clone(),
            input_name: config.input_name.clone(),
            output_name: config.output_name.clone(),
            threads: config.threads,
            class_count: config.classes,
        }
    }
}

pub struct OnnxEngine {
    /// `Session::run` needs exclusive access.
    session: Mutex<Session>,
    model_name: String,
    input_name: String,
    output_name: String,
    class_count: Option<usize>,
}

fn load_error(config: &OnnxConfig, e: impl Display) -> GlossError {
    GlossError::ModelLoad {
        path: config.model_path.display().to_string(),
        message: e.to_string(),
    }
}

impl OnnxEngine {
    /// Load the model artifact. Called once at startup; failures are not retried.
    pub fn load(config: OnnxConfig) -> Result<Self> {
        info!(model = %config.model_path.display(), "loading ONNX model");

        if !config.model_path.exists() {
            return Err(load_error(&config, "file does not exist"));
        }

        let mut builder = Session::builder()
            .map_err(|e| load_error(&config, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(&config, e))?;

        if let Some(threads) = config.threads {
            builder = builder
                .with_intra_threads(threads)
                .map_err(|e| load_error(&config, e))?;
        }

        #[cfg(feature = "cuda")]
        {
            use ort::execution_providers::CUDAExecutionProvider;
            builder = builder
                .with_execution_providers([CUDAExecutionProvider::default().build()])
                .map_err(|e| load_error(&config, e))?;
        }

        let session = builder
            .commit_from_file(&config.model_path)
            .map_err(|e| load_error(&config, e))?;

        let model_name = config
            .model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        info!(model = %model_name, "model loaded");

        Ok(Self {
            session: Mutex::new(session),
            model_name,
            input_name: config.input_name,
            output_name: config.output_name,
            class_count: config.class_count,
        })
    }
}

impl InferenceEngine for OnnxEngine {
    fn run(&self, input: &ModelInput) -> Result<RawOutput> {
        let start = Instant::now();
        let tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| GlossError::inference(format!("failed to create tensor ref: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| GlossError::inference("session lock poisoned"))?;

        let outputs = session
            .run(inputs![self.input_name.as_str() => tensor])
            .map_err(|e| GlossError::inference(e.to_string()))?;

        let value = match outputs.get(self.output_name.as_str()) {
            Some(value) => value,
            None => &outputs[0],
        };

        let output = value
            .try_extract_array::<f32>()
            .map_err(|e| GlossError::malformed_output(format!("output is not f32: {}", e)))?
            .into_owned();

        debug!(
            shape = ?output.shape(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "inference finished"
        );

        Ok(output)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn class_count(&self) -> Option<usize> {
        self.class_count
    }
}
