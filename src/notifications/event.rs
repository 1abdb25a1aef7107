//! Event types for the notification system

use std::time::SystemTime;

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEventType {
    Joining,
    Joined,
    Left,
    TokenRenewed,
    TokenExpired,
    SpeakingStarted,
    SpeakingStopped,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MediaEventType {
    StreamPushStarted,
    StreamPushStopped,
    RelayStarted,
    RelayStopped,
    DeviceChanged,
    MuteChanged,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEventType {
    Started,
    Draining,
    Stopped,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SystemEventType {
    Startup,
    Shutdown,
}

/// Events scoped to one communication session/channel
#[derive(Clone, Debug)]
pub struct SessionEvent {
    pub event_type: SessionEventType,
    pub timestamp: SystemTime,
    pub channel_id: String,
    /// Remote participant concerned, where applicable (speaking events)
    pub user_id: Option<String>,
    pub message: Option<String>,
}

impl SessionEvent {
    pub fn new(event_type: SessionEventType, channel_id: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            channel_id,
            user_id: None,
            message: None,
        }
    }

    pub fn with_user(event_type: SessionEventType, channel_id: String, user_id: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            channel_id,
            user_id: Some(user_id),
            message: None,
        }
    }

    pub fn with_message(
        event_type: SessionEventType,
        channel_id: String,
        message: String,
    ) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            channel_id,
            user_id: None,
            message: Some(message),
        }
    }
}

/// Media control events: stream push, relay, devices, mute state
#[derive(Clone, Debug)]
pub struct MediaEvent {
    pub event_type: MediaEventType,
    pub timestamp: SystemTime,
    pub detail: Option<String>,
}

impl MediaEvent {
    pub fn new(event_type: MediaEventType) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            detail: None,
        }
    }

    pub fn with_detail(event_type: MediaEventType, detail: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            detail: Some(detail),
        }
    }
}

/// Message pipeline lifecycle events
#[derive(Clone, Debug)]
pub struct PipelineEvent {
    pub event_type: PipelineEventType,
    pub timestamp: SystemTime,
    pub message: Option<String>,
}

impl PipelineEvent {
    pub fn new(event_type: PipelineEventType) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: None,
        }
    }

    pub fn with_message(event_type: PipelineEventType, message: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: Some(message),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SystemEvent {
    pub event_type: SystemEventType,
    pub timestamp: SystemTime,
    pub message: Option<String>,
}

impl SystemEvent {
    pub fn new(event_type: SystemEventType) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: None,
        }
    }

    pub fn with_message(event_type: SystemEventType, message: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: Some(message),
        }
    }
}

/// Unified event enum that encompasses all event types
#[derive(Clone, Debug)]
pub enum Event {
    Session(SessionEvent),
    Media(MediaEvent),
    Pipeline(PipelineEvent),
    System(SystemEvent),
}

/// Event filtering options for subscribers
#[derive(Clone, Debug, PartialEq)]
pub enum EventFilter {
    SessionOnly,
    MediaOnly,
    PipelineOnly,
    SystemOnly,
    SessionAndMedia,
    All,
}

impl EventFilter {
    /// Check if an event should be accepted by this filter
    pub fn accepts(&self, event: &Event) -> bool {
        matches!(
            (self, event),
            (EventFilter::SessionOnly, Event::Session(_))
                | (EventFilter::MediaOnly, Event::Media(_))
                | (EventFilter::PipelineOnly, Event::Pipeline(_))
                | (EventFilter::SystemOnly, Event::System(_))
                | (EventFilter::SessionAndMedia, Event::Session(_))
                | (EventFilter::SessionAndMedia, Event::Media(_))
                | (EventFilter::All, _)
        )
    }
}
