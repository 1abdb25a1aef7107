//! Processing statistics
//!
//! Counters are atomic so that concurrent submission and concurrent draining
//! never lose or double-count an outcome, and reading a snapshot never blocks
//! producers. The derived processing rate counts messages reaching a terminal
//! outcome (processed, filtered or failed) over a trailing window.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Trailing window used for the processing rate
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Atomically maintained pipeline counters
#[derive(Debug)]
pub struct ProcessingStatistics {
    enabled: AtomicBool,
    total_received: AtomicU64,
    total_processed: AtomicU64,
    total_filtered: AtomicU64,
    total_skipped: AtomicU64,
    total_failed: AtomicU64,
    total_dropped: AtomicU64,
    total_retried: AtomicU64,
    total_expired: AtomicU64,
    completions: Mutex<VecDeque<Instant>>,
}

/// Point-in-time copy of all counters plus the derived rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    pub total_received: u64,
    pub total_processed: u64,
    pub total_filtered: u64,
    pub total_skipped: u64,
    pub total_failed: u64,
    pub total_dropped: u64,
    pub total_retried: u64,
    pub total_expired: u64,
    /// Terminal outcomes per second over the trailing window
    pub processing_rate: f64,
}

impl ProcessingStatistics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            total_received: AtomicU64::new(0),
            total_processed: AtomicU64::new(0),
            total_filtered: AtomicU64::new(0),
            total_skipped: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
            total_dropped: AtomicU64::new(0),
            total_retried: AtomicU64::new(0),
            total_expired: AtomicU64::new(0),
            completions: Mutex::new(VecDeque::new()),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn bump(&self, counter: &AtomicU64) {
        if self.is_enabled() {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_completion(&self) {
        if !self.is_enabled() {
            return;
        }
        let now = Instant::now();
        let mut completions = self.completions.lock().unwrap();
        completions.push_back(now);
        while let Some(front) = completions.front() {
            if now.duration_since(*front) > RATE_WINDOW {
                completions.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn record_received(&self) {
        self.bump(&self.total_received);
    }

    pub fn record_processed(&self) {
        self.bump(&self.total_processed);
        self.record_completion();
    }

    pub fn record_filtered(&self) {
        self.bump(&self.total_filtered);
        self.record_completion();
    }

    pub fn record_skipped(&self) {
        self.bump(&self.total_skipped);
    }

    pub fn record_failed(&self) {
        self.bump(&self.total_failed);
        self.record_completion();
    }

    pub fn record_dropped(&self) {
        self.bump(&self.total_dropped);
    }

    pub fn record_retried(&self) {
        self.bump(&self.total_retried);
    }

    pub fn record_expired(&self) {
        self.bump(&self.total_expired);
    }

    /// Terminal outcomes per second over the trailing window
    pub fn processing_rate(&self) -> f64 {
        let mut completions = self.completions.lock().unwrap();
        let now = Instant::now();
        while let Some(front) = completions.front() {
            if now.duration_since(*front) > RATE_WINDOW {
                completions.pop_front();
            } else {
                break;
            }
        }
        completions.len() as f64 / RATE_WINDOW.as_secs_f64()
    }

    /// Copy out all counters without blocking producers
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            total_received: self.total_received.load(Ordering::Relaxed),
            total_processed: self.total_processed.load(Ordering::Relaxed),
            total_filtered: self.total_filtered.load(Ordering::Relaxed),
            total_skipped: self.total_skipped.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            total_dropped: self.total_dropped.load(Ordering::Relaxed),
            total_retried: self.total_retried.load(Ordering::Relaxed),
            total_expired: self.total_expired.load(Ordering::Relaxed),
            processing_rate: self.processing_rate(),
        }
    }

    /// Return every counter to zero; safe to call repeatedly
    pub fn reset(&self) {
        self.total_received.store(0, Ordering::Relaxed);
        self.total_processed.store(0, Ordering::Relaxed);
        self.total_filtered.store(0, Ordering::Relaxed);
        self.total_skipped.store(0, Ordering::Relaxed);
        self.total_failed.store(0, Ordering::Relaxed);
        self.total_dropped.store(0, Ordering::Relaxed);
        self.total_retried.store(0, Ordering::Relaxed);
        self.total_expired.store(0, Ordering::Relaxed);
        self.completions.lock().unwrap().clear();
    }
}

impl Default for ProcessingStatistics {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = ProcessingStatistics::default();

        stats.record_received();
        stats.record_received();
        stats.record_processed();
        stats.record_filtered();
        stats.record_dropped();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_received, 2);
        assert_eq!(snapshot.total_processed, 1);
        assert_eq!(snapshot.total_filtered, 1);
        assert_eq!(snapshot.total_dropped, 1);
        assert_eq!(snapshot.total_failed, 0);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let stats = ProcessingStatistics::default();

        stats.record_received();
        stats.record_processed();
        stats.record_retried();
        stats.record_expired();

        stats.reset();
        let snapshot = stats.snapshot();

        assert_eq!(snapshot.total_received, 0);
        assert_eq!(snapshot.total_processed, 0);
        assert_eq!(snapshot.total_retried, 0);
        assert_eq!(snapshot.total_expired, 0);
        assert_eq!(snapshot.processing_rate, 0.0);

        // Idempotent
        stats.reset();
        assert_eq!(stats.snapshot(), snapshot);
    }

    #[test]
    fn test_disabled_statistics_record_nothing() {
        let stats = ProcessingStatistics::new(false);

        stats.record_received();
        stats.record_processed();
        stats.record_failed();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_received, 0);
        assert_eq!(snapshot.total_processed, 0);
        assert_eq!(snapshot.total_failed, 0);
        assert_eq!(snapshot.processing_rate, 0.0);
    }

    #[test]
    fn test_rate_reflects_recent_completions() {
        let stats = ProcessingStatistics::default();
        assert_eq!(stats.processing_rate(), 0.0);

        for _ in 0..60 {
            stats.record_processed();
        }

        // 60 completions inside the 60s window -> about one per second
        let rate = stats.processing_rate();
        assert!(rate > 0.9 && rate <= 1.1, "unexpected rate {}", rate);
    }

    #[test]
    fn test_concurrent_updates_do_not_lose_counts() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(ProcessingStatistics::default());
        let mut handles = Vec::new();

        for _ in 0..4 {
            let stats = stats.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    stats.record_received();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.snapshot().total_received, 4000);
    }
}
