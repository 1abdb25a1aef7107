//! In-process event notification system
//!
//! Publishes SDK lifecycle events (session, media, pipeline, system) to
//! filtered subscribers over unbounded channels. Subscribers that close
//! their receiver are cleaned up on the next publish. The manager is an
//! explicit instance owned by the composition root; there is no global
//! service.

mod error;
mod event;
mod manager;
mod traits;

pub use error::NotificationError;
pub use event::{
    Event, EventFilter, MediaEvent, MediaEventType, PipelineEvent, PipelineEventType,
    SessionEvent, SessionEventType, SystemEvent, SystemEventType,
};
pub use manager::AsyncNotificationManager;
pub use traits::{Subscriber, SubscriberStatistics};
