//! Session error types

use crate::pipeline::PipelineError;
use crate::provider::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session is not connected")]
    NotConnected,

    #[error("session is already connected to '{channel_id}'")]
    AlreadyConnected { channel_id: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
