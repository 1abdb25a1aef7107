//! Vendor provider abstraction
//!
//! The SDK stays portable across communication vendors by talking to a
//! [`CommunicationProvider`] trait object. Vendor adapters (the actual
//! audio/video engines, token plumbing and network transports) live outside
//! this crate; [`MockProvider`] is the in-crate test double.

mod error;
mod mock;
mod traits;
mod types;

pub use error::ProviderError;
pub use mock::{MockProvider, ProviderCall};
pub use traits::CommunicationProvider;
pub use types::{
    AudioDevice, AudioSettings, ChannelRelayConfig, RelayChannelDescriptor, StreamPushConfig,
};
