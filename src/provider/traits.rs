//! The vendor provider capability trait

use async_trait::async_trait;

use crate::pipeline::Message;
use crate::provider::error::ProviderError;
use crate::provider::types::{
    AudioDevice, ChannelRelayConfig, RelayChannelDescriptor, StreamPushConfig,
};

/// Vendor-specific transport backing one communication session
///
/// Implemented by vendor adapters outside this crate. All methods are
/// fallible and may suspend on network I/O; the SDK never assumes a call
/// returns quickly. Implementations must be safe to share behind an
/// `Arc<dyn CommunicationProvider>`.
#[async_trait]
pub trait CommunicationProvider: Send + Sync {
    /// Vendor name for logging and diagnostics
    fn name(&self) -> &str;

    /// Join the channel described by `descriptor`
    async fn connect(&self, descriptor: &RelayChannelDescriptor) -> Result<(), ProviderError>;

    /// Leave the current channel
    async fn disconnect(&self) -> Result<(), ProviderError>;

    /// Install a renewed credential for the current session
    async fn renew_token(&self, token: &str) -> Result<(), ProviderError>;

    /// Enable or disable local audio capture
    async fn set_audio_enabled(&self, enabled: bool) -> Result<(), ProviderError>;

    /// Send an outbound message over the vendor transport
    async fn send_message(&self, message: &Message) -> Result<(), ProviderError>;

    /// Begin pushing the session's mixed stream to an external endpoint
    async fn start_stream_push(&self, config: &StreamPushConfig) -> Result<(), ProviderError>;

    async fn stop_stream_push(&self) -> Result<(), ProviderError>;

    /// Begin relaying the source channel into the destination channels
    async fn start_channel_relay(&self, config: &ChannelRelayConfig) -> Result<(), ProviderError>;

    async fn stop_channel_relay(&self) -> Result<(), ProviderError>;

    /// Enumerate audio devices known to the vendor engine
    async fn audio_devices(&self) -> Result<Vec<AudioDevice>, ProviderError>;

    /// Route audio through the given device
    async fn select_audio_device(&self, device_id: &str) -> Result<(), ProviderError>;
}
