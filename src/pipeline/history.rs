//! Bounded history of terminal message outcomes
//!
//! Append-only log pruned by entry count and by message expiry. Useful for
//! debugging and for UI surfaces showing recent traffic; cleared explicitly
//! via the pipeline manager.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::pipeline::message::{Message, MessageKind};

/// Terminal outcome of one processing pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MessageOutcome {
    /// The processor walk completed and the message was handled
    Processed,
    /// A processor vetoed the message
    Filtered,
    /// Every eligible processor failed
    Failed,
}

/// One history record
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub message: Message,
    pub outcome: MessageOutcome,
    pub completed_at: DateTime<Utc>,
}

/// Query filter for history reads; empty filter matches everything
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub outcome: Option<MessageOutcome>,
    pub sender_id: Option<String>,
    pub channel_id: Option<String>,
    pub kind: Option<MessageKind>,
    /// Keep only the most recent N matches
    pub limit: Option<usize>,
}

impl HistoryFilter {
    /// Filter matching every entry
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_outcome(mut self, outcome: MessageOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn from_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    pub fn in_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, entry: &HistoryEntry) -> bool {
        if let Some(outcome) = self.outcome {
            if entry.outcome != outcome {
                return false;
            }
        }
        if let Some(sender_id) = &self.sender_id {
            if &entry.message.sender_id != sender_id {
                return false;
            }
        }
        if let Some(channel_id) = &self.channel_id {
            if entry.message.channel_id.as_ref() != Some(channel_id) {
                return false;
            }
        }
        if let Some(kind) = &self.kind {
            if &entry.message.kind != kind {
                return false;
            }
        }
        true
    }
}

/// Bounded, append-only outcome log
#[derive(Debug)]
pub struct MessageHistory {
    entries: Mutex<VecDeque<HistoryEntry>>,
    max_entries: AtomicUsize,
}

impl MessageHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            max_entries: AtomicUsize::new(max_entries),
        }
    }

    pub fn set_max_entries(&self, max_entries: usize) {
        self.max_entries.store(max_entries, Ordering::Relaxed);
        let mut entries = self.entries.lock().unwrap();
        Self::enforce_cap(&mut entries, max_entries);
    }

    fn enforce_cap(entries: &mut VecDeque<HistoryEntry>, max_entries: usize) {
        while entries.len() > max_entries {
            entries.pop_front();
        }
    }

    /// Append a terminal outcome, pruning expired entries and the oldest
    /// entries beyond the cap
    pub fn record(&self, message: Message, outcome: MessageOutcome) {
        let now = Utc::now();
        let max_entries = self.max_entries.load(Ordering::Relaxed);
        let mut entries = self.entries.lock().unwrap();

        entries.retain(|entry| !entry.message.is_expired(now));
        entries.push_back(HistoryEntry {
            message,
            outcome,
            completed_at: now,
        });
        Self::enforce_cap(&mut entries, max_entries);
    }

    /// Matching entries, oldest first
    pub fn query(&self, filter: &HistoryFilter) -> Vec<HistoryEntry> {
        let now = Utc::now();
        let entries = self.entries.lock().unwrap();

        let mut matched: Vec<HistoryEntry> = entries
            .iter()
            .filter(|entry| !entry.message.is_expired(now))
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();

        if let Some(limit) = filter.limit {
            if matched.len() > limit {
                matched.drain(..matched.len() - limit);
            }
        }
        matched
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
