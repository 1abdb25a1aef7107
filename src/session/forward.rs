//! Outbound message forwarding processor
//!
//! Outbound messages travel through the same pipeline as inbound ones; the
//! forwarding processor sits at the tail of the chain (low priority) and
//! hands messages marked outbound to the provider transport. Transport
//! failures surface as processor failures, so they get the pipeline's retry
//! policy and error callbacks like any other fault.

use async_trait::async_trait;
use std::sync::Arc;

use crate::pipeline::{Message, MessageProcessor, MetadataValue, ProcessorError};
use crate::provider::CommunicationProvider;

/// Metadata key marking a message for outbound delivery
pub const OUTBOUND_FLAG: &str = "outbound";

/// Forwards outbound-flagged messages over the provider transport
pub struct OutboundForwardProcessor {
    provider: Arc<dyn CommunicationProvider>,
    priority: i32,
}

impl OutboundForwardProcessor {
    /// Default priority puts forwarding after all application processors
    pub fn new(provider: Arc<dyn CommunicationProvider>) -> Self {
        Self::with_priority(provider, -100)
    }

    pub fn with_priority(provider: Arc<dyn CommunicationProvider>, priority: i32) -> Self {
        Self { provider, priority }
    }
}

#[async_trait]
impl MessageProcessor for OutboundForwardProcessor {
    fn identifier(&self) -> &str {
        "outbound-forward"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_process(&self, message: &Message) -> bool {
        message.metadata.get(OUTBOUND_FLAG) == Some(&MetadataValue::Bool(true))
    }

    async fn process(&self, message: Message) -> Result<Option<Message>, ProcessorError> {
        self.provider
            .send_message(&message)
            .await
            .map_err(|error| ProcessorError::failed(error.to_string()))?;
        log::trace!(
            "message {} forwarded via provider '{}'",
            message.id,
            self.provider.name()
        );
        Ok(Some(message))
    }
}
