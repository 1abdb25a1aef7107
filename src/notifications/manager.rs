//! AsyncNotificationManager implementation

use crate::notifications::error::NotificationError;
use crate::notifications::event::{Event, EventFilter};
use crate::notifications::traits::SubscriberStatistics;
use std::collections::HashMap;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

struct SubscriberInfo {
    filter: EventFilter,
    source: String,
    sender: UnboundedSender<Event>,
    statistics: SubscriberStatistics,
}

/// Fan-out event publisher with per-subscriber filtering
///
/// Each subscriber gets an unbounded receiver; publishing never blocks.
/// Subscribers whose channel has closed are removed on the next publish.
pub struct AsyncNotificationManager {
    subscribers: HashMap<String, SubscriberInfo>,
}

impl AsyncNotificationManager {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }

    /// Subscribe to events matching `filter`
    ///
    /// Re-subscribing with an existing id replaces the previous
    /// subscription (the old receiver goes dead) and logs a warning.
    pub fn subscribe(
        &mut self,
        subscriber_id: String,
        filter: EventFilter,
        source: String,
    ) -> UnboundedReceiver<Event> {
        let (sender, receiver) = unbounded_channel();

        let subscriber_info = SubscriberInfo {
            filter,
            source: source.clone(),
            sender,
            statistics: SubscriberStatistics::new(),
        };

        if let Some(existing) = self.subscribers.insert(subscriber_id.clone(), subscriber_info) {
            log::warn!(
                "Subscriber '{}' replaced existing subscription (source: {} -> {})",
                subscriber_id,
                existing.source,
                source
            );
        }

        receiver
    }

    /// Remove a subscription; absent ids are a no-op
    pub fn unsubscribe(&mut self, subscriber_id: &str) {
        self.subscribers.remove(subscriber_id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn has_subscriber(&self, subscriber_id: &str) -> bool {
        self.subscribers.contains_key(subscriber_id)
    }

    pub fn clear_subscribers(&mut self) {
        self.subscribers.clear();
    }

    pub fn get_subscriber_statistics(&self, subscriber_id: &str) -> Option<&SubscriberStatistics> {
        self.subscribers
            .get(subscriber_id)
            .map(|info| &info.statistics)
    }

    /// Deliver an event to every subscriber whose filter accepts it
    ///
    /// Subscribers with closed channels are dropped and reported in the
    /// returned error; delivery to the remaining subscribers still happens.
    pub async fn publish(&mut self, event: Event) -> Result<(), NotificationError> {
        let mut failed_subscribers = Vec::new();
        let event_type = match &event {
            Event::Session(_) => "Session",
            Event::Media(_) => "Media",
            Event::Pipeline(_) => "Pipeline",
            Event::System(_) => "System",
        }
        .to_string();

        for (subscriber_id, subscriber_info) in &self.subscribers {
            if subscriber_info.filter.accepts(&event) {
                subscriber_info.statistics.increment_queue_size();

                if subscriber_info.sender.send(event.clone()).is_err() {
                    subscriber_info.statistics.record_error();
                    failed_subscribers.push(subscriber_id.clone());
                } else {
                    subscriber_info.statistics.record_event_delivered();
                }
            }
        }

        for subscriber_id in &failed_subscribers {
            log::debug!("removing subscriber '{}' with closed channel", subscriber_id);
            self.subscribers.remove(subscriber_id);
        }

        if !failed_subscribers.is_empty() {
            return Err(NotificationError::PublishFailed {
                event_type,
                failed_subscribers,
            });
        }

        Ok(())
    }
}

impl Default for AsyncNotificationManager {
    fn default() -> Self {
        Self::new()
    }
}
