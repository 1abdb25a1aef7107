//! Provider boundary error types

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("provider is not connected")]
    NotConnected,

    #[error("connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("token rejected: {reason}")]
    TokenRejected { reason: String },

    #[error("operation '{operation}' failed: {reason}")]
    OperationFailed { operation: String, reason: String },

    #[error("audio device not found: {device_id}")]
    DeviceNotFound { device_id: String },
}

impl ProviderError {
    pub fn operation_failed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}
