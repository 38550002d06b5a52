//! Error types and reporting for pipeline stages.

use std::fmt;
use tracing::{error, warn};

/// Errors raised inside a running stage.
#[derive(Debug, Clone)]
pub enum StageError {
    /// The stage logs and keeps going (dropped frame, failed inference).
    Recoverable(String),
    /// The stage cannot continue.
    Fatal(String),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::Recoverable(msg) => write!(f, "Recoverable error: {}", msg),
            StageError::Fatal(msg) => write!(f, "Fatal error: {}", msg),
        }
    }
}

impl std::error::Error for StageError {}

/// Trait for reporting stage errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a stage.
    fn report(&self, stage: &str, error: &StageError);
}

/// Reporter that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, stage: &str, error: &StageError) {
        match error {
            StageError::Recoverable(msg) => warn!(stage, "{}", msg),
            StageError::Fatal(msg) => error!(stage, "{}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_display() {
        let recoverable = StageError::Recoverable("temporary failure".to_string());
        assert_eq!(
            recoverable.to_string(),
            "Recoverable error: temporary failure"
        );

        let fatal = StageError::Fatal("critical failure".to_string());
        assert_eq!(fatal.to_string(), "Fatal error: critical failure");
    }

    #[test]
    fn test_log_reporter() {
        let reporter = LogReporter;
        reporter.report("capture", &StageError::Recoverable("test error".to_string()));
        reporter.report("inference", &StageError::Fatal("test error".to_string()));
    }
}
