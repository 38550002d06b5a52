use crate::defaults;
use crate::gloss::GlossTable;
use crate::pipeline::orchestrator::PipelineConfig;
use crate::pipeline::sink::ChannelSink;
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub pipeline: PipelineSettings,
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub gloss_path: PathBuf,
    pub input_name: String,
    pub output_name: String,
    /// Intra-op threads for the runtime; `None` lets the runtime decide.
    pub threads: Option<usize>,
    /// Class count of the model head; sizes the fallback gloss table.
    pub classes: Option<usize>,
}

/// Loop cadence and ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    pub capture_period_ms: u64,
    pub poll_period_ms: u64,
    pub inference_interval_ms: u64,
    pub top_k: usize,
    pub caption_buffer: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(defaults::MODEL_PATH),
            gloss_path: PathBuf::from(defaults::GLOSS_PATH),
            input_name: defaults::INPUT_NAME.to_string(),
            output_name: defaults::OUTPUT_NAME.to_string(),
            threads: None,
            classes: None,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            capture_period_ms: defaults::CAPTURE_PERIOD_MS,
            poll_period_ms: defaults::POLL_PERIOD_MS,
            inference_interval_ms: defaults::INFERENCE_INTERVAL_MS,
            top_k: defaults::TOP_K,
            caption_buffer: defaults::CAPTION_BUFFER,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist.
    ///
    /// Invalid TOML and invalid values are still errors.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Default configuration file path: `<config dir>/glosscast/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("glosscast").join("config.toml"))
    }

    /// Pipeline timing and ranking settings for the orchestrator.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            capture_period: Duration::from_millis(self.pipeline.capture_period_ms),
            poll_period: Duration::from_millis(self.pipeline.poll_period_ms),
            inference_interval: Duration::from_millis(self.pipeline.inference_interval_ms),
            top_k: self.pipeline.top_k,
            ..PipelineConfig::default()
        }
    }

    /// Gloss table from `model.gloss_path`, or placeholder labels sized to
    /// the model's class count when the file can't be used.
    pub fn gloss_table(&self, model_classes: Option<usize>) -> GlossTable {
        let classes = model_classes
            .or(self.model.classes)
            .unwrap_or(defaults::FALLBACK_CLASS_COUNT);
        GlossTable::load_or_fallback(&self.model.gloss_path, classes)
    }

    /// Bounded caption channel for the transport side.
    pub fn caption_channel(&self) -> (ChannelSink, Receiver<String>) {
        ChannelSink::bounded(self.pipeline.caption_buffer)
    }

    fn validate(&self) -> crate::error::Result<()> {
        let invalid = |message: &str| {
            Err(crate::error::GlossError::ConfigParse {
                message: message.to_string(),
            })
        };
        if self.pipeline.capture_period_ms == 0 {
            return invalid("pipeline.capture_period_ms must be positive");
        }
        if self.pipeline.poll_period_ms == 0 {
            return invalid("pipeline.poll_period_ms must be positive");
        }
        if self.pipeline.top_k == 0 {
            return invalid("pipeline.top_k must be positive");
        }
        if self.pipeline.caption_buffer == 0 {
            return invalid("pipeline.caption_buffer must be positive");
        }
        Ok(())
    }
}
