//! Error types for glosscast.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlossError {
    // Frame errors
    #[error("Invalid frame: {message}")]
    InvalidFrame { message: String },

    #[error("Frame source error: {message}")]
    FrameSource { message: String },

    #[error("Insufficient frames: need {needed}, got {got}")]
    InsufficientFrames { needed: usize, got: usize },

    // Model errors
    #[error("Failed to load model from {path}: {message}")]
    ModelLoad { path: String, message: String },

    #[error("Model is not loaded")]
    ModelNotLoaded,

    #[error("Inference failed: {message}")]
    InferenceRun { message: String },

    #[error("Malformed model output: {message}")]
    MalformedOutput { message: String },

    // Gloss table errors
    #[error("Failed to load gloss table from {path}: {message}")]
    GlossTable { path: String, message: String },

    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl GlossError {
    pub fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame {
            message: message.into(),
        }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::InferenceRun {
            message: message.into(),
        }
    }

    pub fn malformed_output(message: impl Into<String>) -> Self {
        Self::MalformedOutput {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GlossError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_invalid_frame_display() {
        let error = GlossError::invalid_frame("width is zero");
        assert_eq!(error.to_string(), "Invalid frame: width is zero");
    }

    #[test]
    fn test_insufficient_frames_display() {
        let error = GlossError::InsufficientFrames { needed: 64, got: 12 };
        assert_eq!(error.to_string(), "Insufficient frames: need 64, got 12");
    }

    #[test]
    fn test_model_load_display() {
        let error = GlossError::ModelLoad {
            path: "/models/i3d.onnx".to_string(),
            message: "file not found".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to load model from /models/i3d.onnx: file not found"
        );
    }

    #[test]
    fn test_inference_display() {
        let error = GlossError::inference("out of memory");
        assert_eq!(error.to_string(), "Inference failed: out of memory");
    }

    #[test]
    fn test_malformed_output_display() {
        let error = GlossError::malformed_output("rank 1");
        assert_eq!(error.to_string(), "Malformed model output: rank 1");
    }

    #[test]
    fn test_gloss_table_display() {
        let error = GlossError::GlossTable {
            path: "glosses.json".to_string(),
            message: "expected array".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to load gloss table from glosses.json: expected array"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: GlossError = io_error.into();
        assert!(error.to_string().contains("file not found"));

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: GlossError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<GlossError>();
        assert_sync::<GlossError>();
    }
}
