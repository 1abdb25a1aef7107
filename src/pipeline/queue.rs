//! Bounded priority queue holding accepted-but-not-yet-dispatched messages
//!
//! Ordering key is `(priority desc, enqueue sequence asc)`: the consumer
//! always receives the highest-priority, oldest message. When full, the
//! *incoming* message is dropped (drop-newest) - backpressure is applied to
//! producers, never to in-flight consumers.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;
use tokio::sync::Notify;

use crate::pipeline::message::{Message, MessagePriority};

/// Result of an enqueue attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Admitted with the assigned enqueue sequence
    Enqueued(u64),
    /// Rejected because the queue is at capacity (drop-newest)
    Dropped,
    /// Rejected because intake is closed (stopping or draining)
    Closed,
}

#[derive(Debug)]
struct QueueEntry {
    priority: MessagePriority,
    sequence: u64,
    message: Message,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: higher priority wins, then lower sequence (older first)
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Debug)]
struct QueueInner {
    heap: BinaryHeap<QueueEntry>,
    next_sequence: u64,
}

/// Priority queue with a configurable capacity and suspending dequeue
///
/// Safe under concurrent producers and a single consumer loop. Enqueue and
/// dequeue are O(log n); size is O(1) amortized.
#[derive(Debug)]
pub struct MessageQueue {
    inner: Mutex<QueueInner>,
    /// Capacity; `usize::MAX` means effectively unbounded, 0 rejects all
    max_size: AtomicUsize,
    intake_open: AtomicBool,
    notify: Notify,
}

impl MessageQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                heap: BinaryHeap::new(),
                next_sequence: 1,
            }),
            max_size: AtomicUsize::new(max_size),
            intake_open: AtomicBool::new(true),
            notify: Notify::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size.load(AtomicOrdering::Relaxed)
    }

    /// Adjust capacity; already-admitted messages are never evicted
    pub fn set_max_size(&self, max_size: usize) {
        self.max_size.store(max_size, AtomicOrdering::Relaxed);
    }

    pub fn is_intake_open(&self) -> bool {
        self.intake_open.load(AtomicOrdering::Acquire)
    }

    /// Close intake: no further enqueues; dequeue drains the remainder and
    /// then resolves to `None`
    pub fn close_intake(&self) {
        self.intake_open.store(false, AtomicOrdering::Release);
        self.notify.notify_waiters();
    }

    /// Reopen intake after a stop, keeping any messages left from before
    pub fn reopen(&self) {
        self.intake_open.store(true, AtomicOrdering::Release);
    }

    /// Attempt to admit a message
    pub fn enqueue(&self, message: Message) -> EnqueueOutcome {
        if !self.is_intake_open() {
            return EnqueueOutcome::Closed;
        }

        let max_size = self.max_size();
        let sequence = {
            let mut inner = self.inner.lock().unwrap();
            if inner.heap.len() >= max_size {
                return EnqueueOutcome::Dropped;
            }

            let sequence = inner.next_sequence;
            inner.next_sequence += 1;
            inner.heap.push(QueueEntry {
                priority: message.priority,
                sequence,
                message,
            });
            sequence
        };

        self.notify.notify_one();
        EnqueueOutcome::Enqueued(sequence)
    }

    /// Pop the highest-priority, oldest message without waiting
    pub fn try_dequeue(&self) -> Option<Message> {
        self.inner
            .lock()
            .unwrap()
            .heap
            .pop()
            .map(|entry| entry.message)
    }

    /// Wait until a message is available or intake is closed and drained
    ///
    /// Returns `None` only once intake is closed and the queue is empty.
    pub async fn dequeue(&self) -> Option<Message> {
        loop {
            // Register interest before checking, so a concurrent enqueue
            // between the check and the await is not missed.
            let notified = self.notify.notified();

            if let Some(message) = self.try_dequeue() {
                return Some(message);
            }

            if !self.is_intake_open() {
                if self.is_empty() {
                    return None;
                }
                continue;
            }

            notified.await;
        }
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}
