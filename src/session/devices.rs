//! Audio device and volume control surface

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::provider::{AudioDevice, AudioSettings, CommunicationProvider, ProviderError};

/// Mute/volume/device state layered over the provider's audio engine
pub struct AudioDeviceControl {
    provider: Arc<dyn CommunicationProvider>,
    settings: RwLock<AudioSettings>,
    muted: AtomicBool,
}

impl AudioDeviceControl {
    pub fn new(provider: Arc<dyn CommunicationProvider>, settings: AudioSettings) -> Self {
        Self {
            provider,
            settings: RwLock::new(settings),
            muted: AtomicBool::new(false),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    /// Mute or unmute local capture
    pub async fn set_muted(&self, muted: bool) -> Result<(), ProviderError> {
        self.provider.set_audio_enabled(!muted).await?;
        self.muted.store(muted, Ordering::Release);
        log::debug!("local audio {}", if muted { "muted" } else { "unmuted" });
        Ok(())
    }

    /// Adjust playback volume (0..=100)
    pub fn set_playback_volume(&self, volume: u8) -> Result<(), ProviderError> {
        let updated = self
            .settings
            .read()
            .unwrap()
            .clone()
            .with_playback_volume(volume)?;
        *self.settings.write().unwrap() = updated;
        Ok(())
    }

    pub fn settings(&self) -> AudioSettings {
        self.settings.read().unwrap().clone()
    }

    pub async fn list_devices(&self) -> Result<Vec<AudioDevice>, ProviderError> {
        self.provider.audio_devices().await
    }

    pub async fn select_device(&self, device_id: &str) -> Result<(), ProviderError> {
        self.provider.select_audio_device(device_id).await
    }
}
