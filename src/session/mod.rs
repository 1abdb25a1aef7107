//! Session facade
//!
//! [`SessionManager`] ties the SDK together: it owns an injected
//! [`CommunicationProvider`](crate::provider::CommunicationProvider), a
//! message [`PipelineManager`](crate::pipeline::PipelineManager) and an
//! [`AsyncNotificationManager`](crate::notifications::AsyncNotificationManager),
//! and exposes join/leave, audio device control, speaking detection, stream
//! push and channel relay on top of them.

mod devices;
mod error;
mod forward;
mod manager;
mod speaking;

pub use devices::AudioDeviceControl;
pub use error::SessionError;
pub use forward::{OutboundForwardProcessor, OUTBOUND_FLAG};
pub use manager::SessionManager;
pub use speaking::{SpeakingConfig, SpeakingDetector, SpeakingTransition};
