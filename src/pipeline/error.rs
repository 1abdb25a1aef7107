//! Pipeline Error Types

use std::time::Duration;

/// Intake validation failures
///
/// These never surface as return values from `submit`; they are delivered
/// through the error callback because submission is fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("message sender must not be empty")]
    EmptySender,

    #[error("message content must not be empty")]
    EmptyContent,
}

/// Failure signalled by a processor while handling a message
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProcessorError {
    #[error("processing timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("{message}")]
    Failed { message: String },
}

impl ProcessorError {
    /// Convenience constructor for ad-hoc processor failures
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Processor '{identifier}' is already registered")]
    DuplicateProcessor { identifier: String },

    #[error("Invalid message: {source}")]
    InvalidMessage {
        #[source]
        source: ValidationError,
    },

    #[error("Processor '{identifier}' failed: {source}")]
    ProcessorFailed {
        identifier: String,
        #[source]
        source: ProcessorError,
    },
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
