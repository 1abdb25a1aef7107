//! SessionManager - the SDK entry point
//!
//! An explicit instance owned by the application's composition root: it is
//! handed a vendor provider and builds the pipeline, notification manager,
//! audio control and speaking detector around it. No global state.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::core::retry::{retry_async, RetryPolicy};
use crate::notifications::{
    AsyncNotificationManager, Event, EventFilter, MediaEvent, MediaEventType, PipelineEvent,
    PipelineEventType, SessionEvent, SessionEventType,
};
use crate::pipeline::{Message, PipelineConfig, PipelineManager, PipelineResult};
use crate::provider::{
    AudioDevice, AudioSettings, ChannelRelayConfig, CommunicationProvider,
    RelayChannelDescriptor, StreamPushConfig,
};
use crate::session::devices::AudioDeviceControl;
use crate::session::error::SessionError;
use crate::session::forward::{OutboundForwardProcessor, OUTBOUND_FLAG};
use crate::session::speaking::{SpeakingConfig, SpeakingDetector, SpeakingTransition};

/// How long `leave` lets the pipeline drain before forcing a stop
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Facade over one real-time communication session
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use commlink::provider::{MockProvider, RelayChannelDescriptor};
/// use commlink::session::SessionManager;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = Arc::new(MockProvider::new());
/// let session = SessionManager::new(provider);
///
/// let channel = RelayChannelDescriptor::new("room-1", "token", "u1")?;
/// session.join(channel).await?;
///
/// session.send_text("hello everyone").await?;
/// session.leave().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionManager {
    provider: Arc<dyn CommunicationProvider>,
    pipeline: Arc<PipelineManager>,
    notifications: Arc<AsyncMutex<AsyncNotificationManager>>,
    audio: AudioDeviceControl,
    speaking: SpeakingDetector,
    channel: Mutex<Option<RelayChannelDescriptor>>,
    token_retry: RetryPolicy,
}

impl SessionManager {
    /// Create a session manager with default pipeline and audio settings
    pub fn new(provider: Arc<dyn CommunicationProvider>) -> Self {
        Self::with_config(
            provider,
            PipelineConfig::default(),
            AudioSettings::default(),
            SpeakingConfig::default(),
        )
    }

    pub fn with_config(
        provider: Arc<dyn CommunicationProvider>,
        pipeline_config: PipelineConfig,
        audio_settings: AudioSettings,
        speaking_config: SpeakingConfig,
    ) -> Self {
        let pipeline = Arc::new(PipelineManager::with_config(pipeline_config));

        Self {
            audio: AudioDeviceControl::new(Arc::clone(&provider), audio_settings),
            speaking: SpeakingDetector::new(speaking_config),
            provider,
            pipeline,
            notifications: Arc::new(AsyncMutex::new(AsyncNotificationManager::new())),
            channel: Mutex::new(None),
            token_retry: RetryPolicy::default(),
        }
    }

    /// The message pipeline, for processor registration and statistics
    pub fn pipeline(&self) -> &PipelineManager {
        &self.pipeline
    }

    /// Register the tail-of-chain processor that forwards outbound-flagged
    /// messages over the provider transport
    pub fn enable_outbound_forwarding(&self) -> PipelineResult<()> {
        self.pipeline
            .register_processor(Arc::new(OutboundForwardProcessor::new(Arc::clone(
                &self.provider,
            ))))
    }

    /// Subscribe to session/media/pipeline events
    pub async fn subscribe(
        &self,
        subscriber_id: impl Into<String>,
        filter: EventFilter,
        source: impl Into<String>,
    ) -> UnboundedReceiver<Event> {
        self.notifications
            .lock()
            .await
            .subscribe(subscriber_id.into(), filter, source.into())
    }

    async fn publish_event(&self, event: Event) {
        let mut notifications = self.notifications.lock().await;
        if let Err(error) = notifications.publish(event).await {
            log::warn!("event publish failed: {}", error);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.channel.lock().unwrap().is_some()
    }

    pub fn current_channel(&self) -> Option<String> {
        self.channel
            .lock()
            .unwrap()
            .as_ref()
            .map(|descriptor| descriptor.channel_id().to_string())
    }

    fn connected_channel(&self) -> Result<String, SessionError> {
        self.current_channel().ok_or(SessionError::NotConnected)
    }

    /// Join a channel: connect the provider, then start the pipeline
    pub async fn join(&self, descriptor: RelayChannelDescriptor) -> Result<(), SessionError> {
        // Claim the slot first so concurrent joins fail fast
        {
            let mut channel = self.channel.lock().unwrap();
            if let Some(current) = channel.as_ref() {
                return Err(SessionError::AlreadyConnected {
                    channel_id: current.channel_id().to_string(),
                });
            }
            *channel = Some(descriptor.clone());
        }

        let channel_id = descriptor.channel_id().to_string();
        self.publish_event(Event::Session(SessionEvent::new(
            SessionEventType::Joining,
            channel_id.clone(),
        )))
        .await;

        if let Err(error) = self.provider.connect(&descriptor).await {
            *self.channel.lock().unwrap() = None;
            self.publish_event(Event::Session(SessionEvent::with_message(
                SessionEventType::Error,
                channel_id,
                error.to_string(),
            )))
            .await;
            return Err(error.into());
        }

        self.pipeline.start();
        self.publish_event(Event::Pipeline(PipelineEvent::new(
            PipelineEventType::Started,
        )))
        .await;

        self.publish_event(Event::Session(SessionEvent::new(
            SessionEventType::Joined,
            channel_id.clone(),
        )))
        .await;
        log::info!(
            "joined channel '{}' via provider '{}'",
            channel_id,
            self.provider.name()
        );
        Ok(())
    }

    /// Leave the current channel, draining queued messages first
    pub async fn leave(&self) -> Result<(), SessionError> {
        self.leave_with_timeout(DEFAULT_DRAIN_TIMEOUT).await
    }

    pub async fn leave_with_timeout(&self, drain_timeout: Duration) -> Result<(), SessionError> {
        let descriptor = self
            .channel
            .lock()
            .unwrap()
            .take()
            .ok_or(SessionError::NotConnected)?;
        let channel_id = descriptor.channel_id().to_string();

        self.publish_event(Event::Pipeline(PipelineEvent::new(
            PipelineEventType::Draining,
        )))
        .await;
        let drained = self.pipeline.graceful_shutdown(drain_timeout).await;
        if !drained {
            log::warn!("pipeline drain incomplete when leaving '{}'", channel_id);
        }
        self.publish_event(Event::Pipeline(PipelineEvent::new(
            PipelineEventType::Stopped,
        )))
        .await;

        self.provider.disconnect().await?;
        self.publish_event(Event::Session(SessionEvent::new(
            SessionEventType::Left,
            channel_id.clone(),
        )))
        .await;
        log::info!("left channel '{}'", channel_id);
        Ok(())
    }

    /// Install a renewed credential, retrying transient rejections
    pub async fn renew_token(&self, token: &str) -> Result<(), SessionError> {
        let channel_id = self.connected_channel()?;

        let provider = Arc::clone(&self.provider);
        let result = retry_async("token_renewal", self.token_retry.clone(), || {
            let provider = Arc::clone(&provider);
            async move { provider.renew_token(token).await }
        })
        .await;

        match result {
            Ok(()) => {
                self.publish_event(Event::Session(SessionEvent::new(
                    SessionEventType::TokenRenewed,
                    channel_id,
                )))
                .await;
                Ok(())
            }
            Err(error) => {
                self.publish_event(Event::Session(SessionEvent::with_message(
                    SessionEventType::TokenExpired,
                    channel_id,
                    error.to_string(),
                )))
                .await;
                Err(error.into())
            }
        }
    }

    /// Feed a provider-delivered inbound message into the pipeline
    pub fn submit_incoming(&self, message: Message) {
        self.pipeline.submit(message);
    }

    /// Queue an outbound message for processing and transport
    ///
    /// The message runs through the full processor chain; delivery happens
    /// in the forwarding processor (see
    /// [`enable_outbound_forwarding`](Self::enable_outbound_forwarding)).
    pub async fn send_message(&self, message: Message) -> Result<(), SessionError> {
        let channel_id = self.connected_channel()?;
        let message = message
            .with_channel(channel_id)
            .with_metadata(OUTBOUND_FLAG, true);
        self.pipeline.submit(message);
        Ok(())
    }

    /// Convenience wrapper for outbound text from the local user
    pub async fn send_text(&self, body: impl Into<String>) -> Result<(), SessionError> {
        let descriptor = self
            .channel
            .lock()
            .unwrap()
            .clone()
            .ok_or(SessionError::NotConnected)?;
        self.send_message(Message::text(descriptor.user_id(), body))
            .await
    }

    /// Mute or unmute local capture
    pub async fn set_muted(&self, muted: bool) -> Result<(), SessionError> {
        self.audio.set_muted(muted).await?;
        self.publish_event(Event::Media(MediaEvent::with_detail(
            MediaEventType::MuteChanged,
            muted.to_string(),
        )))
        .await;
        Ok(())
    }

    pub fn is_muted(&self) -> bool {
        self.audio.is_muted()
    }

    pub fn set_playback_volume(&self, volume: u8) -> Result<(), SessionError> {
        self.audio.set_playback_volume(volume)?;
        Ok(())
    }

    pub fn audio_settings(&self) -> AudioSettings {
        self.audio.settings()
    }

    pub async fn audio_devices(&self) -> Result<Vec<AudioDevice>, SessionError> {
        Ok(self.audio.list_devices().await?)
    }

    pub async fn select_audio_device(&self, device_id: &str) -> Result<(), SessionError> {
        self.audio.select_device(device_id).await?;
        self.publish_event(Event::Media(MediaEvent::with_detail(
            MediaEventType::DeviceChanged,
            device_id.to_string(),
        )))
        .await;
        Ok(())
    }

    /// Push the session's mixed stream to an external RTMP endpoint
    pub async fn start_stream_push(&self, config: &StreamPushConfig) -> Result<(), SessionError> {
        self.connected_channel()?;
        self.provider.start_stream_push(config).await?;
        self.publish_event(Event::Media(MediaEvent::with_detail(
            MediaEventType::StreamPushStarted,
            config.url().to_string(),
        )))
        .await;
        Ok(())
    }

    pub async fn stop_stream_push(&self) -> Result<(), SessionError> {
        self.provider.stop_stream_push().await?;
        self.publish_event(Event::Media(MediaEvent::new(
            MediaEventType::StreamPushStopped,
        )))
        .await;
        Ok(())
    }

    /// Relay the current channel into the destinations named by `config`
    pub async fn start_relay(&self, config: &ChannelRelayConfig) -> Result<(), SessionError> {
        self.connected_channel()?;
        self.provider.start_channel_relay(config).await?;
        self.publish_event(Event::Media(MediaEvent::with_detail(
            MediaEventType::RelayStarted,
            config.source().channel_id().to_string(),
        )))
        .await;
        Ok(())
    }

    pub async fn stop_relay(&self) -> Result<(), SessionError> {
        self.provider.stop_channel_relay().await?;
        self.publish_event(Event::Media(MediaEvent::new(MediaEventType::RelayStopped)))
            .await;
        Ok(())
    }

    /// Feed a per-participant volume report from the provider
    ///
    /// Emits `SpeakingStarted`/`SpeakingStopped` session events on state
    /// transitions. Reports while not connected are ignored.
    pub async fn handle_volume_report(&self, user_id: &str, volume: u8) {
        let Some(channel_id) = self.current_channel() else {
            return;
        };

        let transition = self.speaking.observe(user_id, volume, Instant::now());
        let event_type = match transition {
            Some(SpeakingTransition::Started) => SessionEventType::SpeakingStarted,
            Some(SpeakingTransition::Stopped) => SessionEventType::SpeakingStopped,
            None => return,
        };

        self.publish_event(Event::Session(SessionEvent::with_user(
            event_type,
            channel_id,
            user_id.to_string(),
        )))
        .await;
    }

    pub fn is_user_speaking(&self, user_id: &str) -> bool {
        self.speaking.is_speaking(user_id)
    }
}
