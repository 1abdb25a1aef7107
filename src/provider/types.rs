//! Range-checked value objects crossing the provider boundary
//!
//! Constructors validate every field, so a value of one of these types is
//! known-good wherever it travels. Validation failures come back as
//! [`ProviderError::InvalidConfig`].

use serde::{Deserialize, Serialize};

use crate::core::validation::{validate_non_empty, validate_range, validate_stream_url};
use crate::provider::error::ProviderError;

/// Sample rates the audio engines accept
const PERMITTED_SAMPLE_RATES: [u32; 5] = [8000, 16000, 24000, 44100, 48000];

/// Audio capture/playback settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSettings {
    sample_rate: u32,
    bitrate_kbps: u32,
    playback_volume: u8,
    recording_volume: u8,
}

impl AudioSettings {
    pub fn new(
        sample_rate: u32,
        bitrate_kbps: u32,
        playback_volume: u8,
        recording_volume: u8,
    ) -> Result<Self, ProviderError> {
        if !PERMITTED_SAMPLE_RATES.contains(&sample_rate) {
            return Err(ProviderError::InvalidConfig(format!(
                "sample_rate must be one of {:?}, got {}",
                PERMITTED_SAMPLE_RATES, sample_rate
            )));
        }
        validate_range("bitrate_kbps", bitrate_kbps, 16, 320)
            .map_err(ProviderError::InvalidConfig)?;
        validate_range("playback_volume", playback_volume, 0, 100)
            .map_err(ProviderError::InvalidConfig)?;
        validate_range("recording_volume", recording_volume, 0, 100)
            .map_err(ProviderError::InvalidConfig)?;

        Ok(Self {
            sample_rate,
            bitrate_kbps,
            playback_volume,
            recording_volume,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bitrate_kbps(&self) -> u32 {
        self.bitrate_kbps
    }

    pub fn playback_volume(&self) -> u8 {
        self.playback_volume
    }

    pub fn recording_volume(&self) -> u8 {
        self.recording_volume
    }

    pub fn with_playback_volume(mut self, volume: u8) -> Result<Self, ProviderError> {
        validate_range("playback_volume", volume, 0, 100).map_err(ProviderError::InvalidConfig)?;
        self.playback_volume = volume;
        Ok(self)
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            bitrate_kbps: 64,
            playback_volume: 100,
            recording_volume: 100,
        }
    }
}

/// Target for pushing the session's mixed stream to an RTMP endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPushConfig {
    url: String,
    width: u32,
    height: u32,
    fps: u32,
    video_bitrate_kbps: u32,
}

impl StreamPushConfig {
    pub fn new(
        url: impl Into<String>,
        width: u32,
        height: u32,
        fps: u32,
        video_bitrate_kbps: u32,
    ) -> Result<Self, ProviderError> {
        let url = url.into();
        validate_stream_url(&url).map_err(ProviderError::InvalidConfig)?;
        validate_range("width", width, 16, 4096).map_err(ProviderError::InvalidConfig)?;
        validate_range("height", height, 16, 4096).map_err(ProviderError::InvalidConfig)?;
        validate_range("fps", fps, 1, 60).map_err(ProviderError::InvalidConfig)?;
        validate_range("video_bitrate_kbps", video_bitrate_kbps, 1, 10_000)
            .map_err(ProviderError::InvalidConfig)?;

        Ok(Self {
            url,
            width,
            height,
            fps,
            video_bitrate_kbps,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn video_bitrate_kbps(&self) -> u32 {
        self.video_bitrate_kbps
    }
}

/// Identifies one channel a client can join or relay to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayChannelDescriptor {
    channel_id: String,
    token: String,
    user_id: String,
}

impl RelayChannelDescriptor {
    pub fn new(
        channel_id: impl Into<String>,
        token: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let channel_id = channel_id.into();
        let token = token.into();
        let user_id = user_id.into();

        validate_non_empty("channel_id", &channel_id).map_err(ProviderError::InvalidConfig)?;
        validate_non_empty("token", &token).map_err(ProviderError::InvalidConfig)?;
        validate_non_empty("user_id", &user_id).map_err(ProviderError::InvalidConfig)?;

        Ok(Self {
            channel_id,
            token,
            user_id,
        })
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Relay of one source channel into one or more destination channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRelayConfig {
    source: RelayChannelDescriptor,
    destinations: Vec<RelayChannelDescriptor>,
}

impl ChannelRelayConfig {
    pub fn new(
        source: RelayChannelDescriptor,
        destinations: Vec<RelayChannelDescriptor>,
    ) -> Result<Self, ProviderError> {
        if destinations.is_empty() {
            return Err(ProviderError::InvalidConfig(
                "relay needs at least one destination channel".to_string(),
            ));
        }
        Ok(Self {
            source,
            destinations,
        })
    }

    pub fn source(&self) -> &RelayChannelDescriptor {
        &self.source
    }

    pub fn destinations(&self) -> &[RelayChannelDescriptor] {
        &self.destinations
    }
}

/// One audio input/output device as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_settings_defaults_are_valid() {
        let settings = AudioSettings::default();
        assert_eq!(settings.sample_rate(), 48000);
        assert_eq!(settings.playback_volume(), 100);

        // Round-trip through the validating constructor
        AudioSettings::new(
            settings.sample_rate(),
            settings.bitrate_kbps(),
            settings.playback_volume(),
            settings.recording_volume(),
        )
        .unwrap();
    }

    #[test]
    fn test_audio_settings_rejects_bad_sample_rate() {
        let result = AudioSettings::new(11025, 64, 100, 100);
        assert!(matches!(result, Err(ProviderError::InvalidConfig(_))));
    }

    #[test]
    fn test_audio_settings_rejects_out_of_range_bitrate() {
        assert!(AudioSettings::new(48000, 8, 100, 100).is_err());
        assert!(AudioSettings::new(48000, 321, 100, 100).is_err());
        assert!(AudioSettings::new(48000, 16, 100, 100).is_ok());
        assert!(AudioSettings::new(48000, 320, 100, 100).is_ok());
    }

    #[test]
    fn test_stream_push_config_validation() {
        assert!(StreamPushConfig::new("rtmp://live.example.com/app/key", 1280, 720, 30, 2000).is_ok());
        assert!(StreamPushConfig::new("http://live.example.com/app", 1280, 720, 30, 2000).is_err());
        assert!(StreamPushConfig::new("rtmp://live.example.com/app", 8, 720, 30, 2000).is_err());
        assert!(StreamPushConfig::new("rtmp://live.example.com/app", 1280, 720, 0, 2000).is_err());
        assert!(
            StreamPushConfig::new("rtmp://live.example.com/app", 1280, 720, 30, 20_000).is_err()
        );
    }

    #[test]
    fn test_relay_descriptor_requires_all_fields() {
        assert!(RelayChannelDescriptor::new("room-1", "tok", "u1").is_ok());
        assert!(RelayChannelDescriptor::new("", "tok", "u1").is_err());
        assert!(RelayChannelDescriptor::new("room-1", "", "u1").is_err());
        assert!(RelayChannelDescriptor::new("room-1", "tok", " ").is_err());
    }

    #[test]
    fn test_relay_config_requires_destinations() {
        let source = RelayChannelDescriptor::new("src", "tok", "u1").unwrap();
        assert!(ChannelRelayConfig::new(source.clone(), vec![]).is_err());

        let dest = RelayChannelDescriptor::new("dst", "tok", "u1").unwrap();
        let relay = ChannelRelayConfig::new(source, vec![dest]).unwrap();
        assert_eq!(relay.destinations().len(), 1);
    }
}
