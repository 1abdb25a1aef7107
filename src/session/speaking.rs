//! Speaking-activity detection from provider volume reports
//!
//! The provider periodically reports per-participant volume levels
//! (0..=100). A participant is speaking once their level crosses the
//! threshold; they stop speaking only after staying below it for the
//! hangover interval, which keeps natural pauses from flapping the state.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Detection tunables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakingConfig {
    /// Volume level (0..=100) at or above which a participant counts as
    /// speaking
    pub threshold: u8,
    /// How long the level must stay below the threshold before the
    /// participant counts as silent again
    pub hangover: Duration,
}

impl Default for SpeakingConfig {
    fn default() -> Self {
        Self {
            threshold: 40,
            hangover: Duration::from_millis(600),
        }
    }
}

/// State change produced by one volume observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakingTransition {
    Started,
    Stopped,
}

#[derive(Debug)]
struct SpeakerState {
    speaking: bool,
    last_above: Instant,
}

/// Per-participant speaking state machine
#[derive(Debug)]
pub struct SpeakingDetector {
    config: SpeakingConfig,
    speakers: Mutex<HashMap<String, SpeakerState>>,
}

impl SpeakingDetector {
    pub fn new(config: SpeakingConfig) -> Self {
        Self {
            config,
            speakers: Mutex::new(HashMap::new()),
        }
    }

    /// Feed one volume report; returns a transition when the speaking state
    /// of `user_id` changes
    pub fn observe(&self, user_id: &str, volume: u8, now: Instant) -> Option<SpeakingTransition> {
        let mut speakers = self.speakers.lock().unwrap();
        let state = speakers
            .entry(user_id.to_string())
            .or_insert_with(|| SpeakerState {
                speaking: false,
                last_above: now,
            });

        if volume >= self.config.threshold {
            state.last_above = now;
            if !state.speaking {
                state.speaking = true;
                return Some(SpeakingTransition::Started);
            }
            None
        } else if state.speaking
            && now.duration_since(state.last_above) >= self.config.hangover
        {
            state.speaking = false;
            Some(SpeakingTransition::Stopped)
        } else {
            None
        }
    }

    pub fn is_speaking(&self, user_id: &str) -> bool {
        self.speakers
            .lock()
            .unwrap()
            .get(user_id)
            .map(|state| state.speaking)
            .unwrap_or(false)
    }

    /// Drop tracked state for a participant who left
    pub fn forget(&self, user_id: &str) {
        self.speakers.lock().unwrap().remove(user_id);
    }
}

impl Default for SpeakingDetector {
    fn default() -> Self {
        Self::new(SpeakingConfig::default())
    }
}
