//! In-memory provider double for tests and examples
//!
//! Records every call and supports targeted failure injection so session
//! logic (join/leave, token renewal retry, media control) can be exercised
//! without a vendor engine.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::pipeline::Message;
use crate::provider::error::ProviderError;
use crate::provider::traits::CommunicationProvider;
use crate::provider::types::{
    AudioDevice, ChannelRelayConfig, RelayChannelDescriptor, StreamPushConfig,
};

/// One recorded provider invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Connect(String),
    Disconnect,
    RenewToken,
    SetAudioEnabled(bool),
    SendMessage,
    StartStreamPush(String),
    StopStreamPush,
    StartChannelRelay(String),
    StopChannelRelay,
    AudioDevices,
    SelectAudioDevice(String),
}

/// Recording test double for [`CommunicationProvider`]
pub struct MockProvider {
    calls: Mutex<Vec<ProviderCall>>,
    sent_messages: Mutex<Vec<Message>>,
    devices: Mutex<Vec<AudioDevice>>,
    connected: AtomicBool,
    fail_connect: AtomicBool,
    renew_failures_remaining: AtomicUsize,
    send_failures_remaining: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            sent_messages: Mutex::new(Vec::new()),
            devices: Mutex::new(vec![AudioDevice {
                id: "default".to_string(),
                name: "Built-in Microphone".to_string(),
                is_default: true,
            }]),
            connected: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            renew_failures_remaining: AtomicUsize::new(0),
            send_failures_remaining: AtomicUsize::new(0),
        }
    }

    pub fn with_devices(devices: Vec<AudioDevice>) -> Self {
        let provider = Self::new();
        *provider.devices.lock().unwrap() = devices;
        provider
    }

    /// Make every subsequent `connect` fail
    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make the next `count` calls to `renew_token` fail
    pub fn fail_next_renewals(&self, count: usize) {
        self.renew_failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` calls to `send_message` fail
    pub fn fail_next_sends(&self, count: usize) {
        self.send_failures_remaining.store(count, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<Message> {
        self.sent_messages.lock().unwrap().clone()
    }

    fn record(&self, call: ProviderCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn consume_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommunicationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&self, descriptor: &RelayChannelDescriptor) -> Result<(), ProviderError> {
        self.record(ProviderCall::Connect(descriptor.channel_id().to_string()));
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ProviderError::ConnectionFailed {
                reason: "injected connect failure".to_string(),
            });
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.record(ProviderCall::Disconnect);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn renew_token(&self, _token: &str) -> Result<(), ProviderError> {
        self.record(ProviderCall::RenewToken);
        if Self::consume_failure(&self.renew_failures_remaining) {
            return Err(ProviderError::TokenRejected {
                reason: "injected renewal failure".to_string(),
            });
        }
        Ok(())
    }

    async fn set_audio_enabled(&self, enabled: bool) -> Result<(), ProviderError> {
        self.record(ProviderCall::SetAudioEnabled(enabled));
        Ok(())
    }

    async fn send_message(&self, message: &Message) -> Result<(), ProviderError> {
        self.record(ProviderCall::SendMessage);
        if Self::consume_failure(&self.send_failures_remaining) {
            return Err(ProviderError::operation_failed(
                "send_message",
                "injected send failure",
            ));
        }
        self.sent_messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn start_stream_push(&self, config: &StreamPushConfig) -> Result<(), ProviderError> {
        self.record(ProviderCall::StartStreamPush(config.url().to_string()));
        Ok(())
    }

    async fn stop_stream_push(&self) -> Result<(), ProviderError> {
        self.record(ProviderCall::StopStreamPush);
        Ok(())
    }

    async fn start_channel_relay(&self, config: &ChannelRelayConfig) -> Result<(), ProviderError> {
        self.record(ProviderCall::StartChannelRelay(
            config.source().channel_id().to_string(),
        ));
        Ok(())
    }

    async fn stop_channel_relay(&self) -> Result<(), ProviderError> {
        self.record(ProviderCall::StopChannelRelay);
        Ok(())
    }

    async fn audio_devices(&self) -> Result<Vec<AudioDevice>, ProviderError> {
        self.record(ProviderCall::AudioDevices);
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn select_audio_device(&self, device_id: &str) -> Result<(), ProviderError> {
        self.record(ProviderCall::SelectAudioDevice(device_id.to_string()));
        let known = self
            .devices
            .lock()
            .unwrap()
            .iter()
            .any(|device| device.id == device_id);
        if !known {
            return Err(ProviderError::DeviceNotFound {
                device_id: device_id.to_string(),
            });
        }
        Ok(())
    }
}
