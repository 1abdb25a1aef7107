//! Message types for the processing pipeline
//!
//! A [`Message`] is immutable once created: processors receive a message by
//! value and return a new value, they never edit in place. The pipeline hands
//! a message from the queue to the dispatch engine for exactly one processing
//! pass and then to history and statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::core::validation::validate_non_empty;
use crate::pipeline::error::ValidationError;

/// Sender id used for messages originated by the SDK itself
pub const SYSTEM_SENDER: &str = "system";

/// Delivery priority, highest first when draining the queue
///
/// Variant order matters: `Ord` is derived, so `Urgent > High > Normal > Low`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessagePriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for MessagePriority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Tagged message variant; processors use it for eligibility decisions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Plain text chat message
    Text,
    /// SDK- or application-generated control message
    System,
    /// Application-defined message type identified by name
    Custom(String),
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Text => write!(f, "text"),
            MessageKind::System => write!(f, "system"),
            MessageKind::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

/// Scalar value stored in message metadata and structured content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Message payload, matching the message kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageContent {
    /// Plain text payload
    Text(String),
    /// Structured key/value payload
    Structured(BTreeMap<String, MetadataValue>),
    /// Opaque binary payload
    Binary(Vec<u8>),
}

impl MessageContent {
    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(text) => text.trim().is_empty(),
            MessageContent::Structured(map) => map.is_empty(),
            MessageContent::Binary(bytes) => bytes.is_empty(),
        }
    }
}

/// One unit of communication flowing through the pipeline
///
/// Metadata is append-only across a processing pass: processors may add
/// entries but must never remove existing ones. The dispatch engine adopts
/// returned messages wholesale, so this is a contract on processor
/// implementations (see [`MessageProcessor`](crate::pipeline::MessageProcessor)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier, assigned at construction
    pub id: Uuid,
    /// Tagged variant deciding processor eligibility
    pub kind: MessageKind,
    /// Payload matching `kind`
    pub content: MessageContent,
    /// Originator; `"system"` for SDK-generated messages
    pub sender_id: String,
    /// Optional room/channel scope
    pub channel_id: Option<String>,
    /// Queue drain priority
    pub priority: MessagePriority,
    /// Append-only key/value annotations
    pub metadata: BTreeMap<String, MetadataValue>,
    /// Messages observed past this instant are discardable without processing
    pub expires_at: Option<DateTime<Utc>>,
    /// Set once at construction
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn with_parts(sender_id: String, kind: MessageKind, content: MessageContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content,
            sender_id,
            channel_id: None,
            priority: MessagePriority::default(),
            metadata: BTreeMap::new(),
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    /// Create a plain text message
    pub fn text(sender_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_parts(
            sender_id.into(),
            MessageKind::Text,
            MessageContent::Text(body.into()),
        )
    }

    /// Create a system message with a structured payload, sent as `"system"`
    pub fn system(payload: BTreeMap<String, MetadataValue>) -> Self {
        Self::with_parts(
            SYSTEM_SENDER.to_string(),
            MessageKind::System,
            MessageContent::Structured(payload),
        )
    }

    /// Create a custom message carrying an opaque payload
    pub fn custom(
        sender_id: impl Into<String>,
        name: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self::with_parts(
            sender_id.into(),
            MessageKind::Custom(name.into()),
            MessageContent::Binary(payload),
        )
    }

    pub fn with_priority(mut self, priority: MessagePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Set an absolute expiry instant
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set expiry relative to the creation timestamp
    pub fn expires_in(mut self, ttl: chrono::Duration) -> Self {
        self.expires_at = Some(self.created_at + ttl);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether the message has expired as of `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expiry) if now > expiry)
    }

    /// Serialize for transport; vendor adapters ship this form
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a message received from the transport
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    /// Intake validation: sender and content must be non-empty
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_non_empty("sender_id", &self.sender_id)
            .map_err(|_| ValidationError::EmptySender)?;
        if self.content.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(MessagePriority::Urgent > MessagePriority::High);
        assert!(MessagePriority::High > MessagePriority::Normal);
        assert!(MessagePriority::Normal > MessagePriority::Low);
    }

    #[test]
    fn test_text_message_construction() {
        let message = Message::text("u1", "hi").with_channel("room-7");

        assert_eq!(message.kind, MessageKind::Text);
        assert_eq!(message.sender_id, "u1");
        assert_eq!(message.channel_id.as_deref(), Some("room-7"));
        assert_eq!(message.priority, MessagePriority::Normal);
        assert!(message.metadata.is_empty());
        assert!(message.expires_at.is_none());
        assert!(message.validate().is_ok());
    }

    #[test]
    fn test_system_message_uses_system_sender() {
        let mut payload = BTreeMap::new();
        payload.insert("action".to_string(), MetadataValue::from("member_joined"));

        let message = Message::system(payload);
        assert_eq!(message.sender_id, SYSTEM_SENDER);
        assert_eq!(message.kind, MessageKind::System);
        assert!(message.validate().is_ok());
    }

    #[test]
    fn test_unique_ids() {
        let a = Message::text("u1", "one");
        let b = Message::text("u1", "one");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_validation_rejects_empty_sender() {
        let message = Message::text("", "hi");
        assert_eq!(message.validate(), Err(ValidationError::EmptySender));

        let message = Message::text("   ", "hi");
        assert_eq!(message.validate(), Err(ValidationError::EmptySender));
    }

    #[test]
    fn test_validation_rejects_empty_content() {
        let message = Message::text("u1", "");
        assert_eq!(message.validate(), Err(ValidationError::EmptyContent));

        let message = Message::custom("u1", "telemetry", vec![]);
        assert_eq!(message.validate(), Err(ValidationError::EmptyContent));

        let message = Message::system(BTreeMap::new());
        assert_eq!(message.validate(), Err(ValidationError::EmptyContent));
    }

    #[test]
    fn test_expiry() {
        let message = Message::text("u1", "hi").expires_in(chrono::Duration::milliseconds(50));

        assert!(!message.is_expired(message.created_at));
        assert!(message.is_expired(message.created_at + chrono::Duration::milliseconds(51)));

        let eternal = Message::text("u1", "hi");
        assert!(!eternal.is_expired(Utc::now() + chrono::Duration::days(365)));
    }

    #[test]
    fn test_json_round_trip() {
        let message = Message::text("u1", "hi")
            .with_channel("room-7")
            .with_priority(MessagePriority::Urgent)
            .with_metadata("hops", 3i64);

        let json = message.to_json().unwrap();
        let parsed = Message::from_json(&json).unwrap();

        assert_eq!(parsed.id, message.id);
        assert_eq!(parsed.priority, MessagePriority::Urgent);
        assert_eq!(parsed.metadata.get("hops"), Some(&MetadataValue::Integer(3)));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(MessageKind::Text.to_string(), "text");
        assert_eq!(
            MessageKind::Custom("poll".to_string()).to_string(),
            "custom:poll"
        );
    }
}
