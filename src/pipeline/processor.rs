//! Message processor capability trait
//!
//! A processor is a named, prioritized unit of message-handling logic.
//! Implementers register any type satisfying [`MessageProcessor`] with a
//! [`ProcessorRegistry`](crate::pipeline::ProcessorRegistry); the dispatch
//! engine walks eligible processors in `(priority desc, registration order)`
//! order for every dequeued message.

use async_trait::async_trait;

use crate::pipeline::error::ProcessorError;
use crate::pipeline::message::Message;

/// A prioritized, independently registered unit of message-handling logic
///
/// # Contract
///
/// - `identifier` must be unique within one registry instance.
/// - `can_process` must be cheap and synchronous; it runs on the dispatch
///   path for every message.
/// - `process` may suspend arbitrarily long (network I/O); the engine bounds
///   it with the configured processing timeout.
/// - Returning `Ok(Some(message))` continues the chain with the returned
///   value; metadata is append-only - add entries, never remove existing
///   ones.
/// - Returning `Ok(None)` vetoes the message (filtering): the chain stops and
///   no later processor runs. Filtering is an intentional decision, distinct
///   from failure.
/// - Returning `Err` is an operational fault: it is counted and reported, but
///   the chain continues with the next processor using the last
///   successfully-produced message value.
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    /// Unique key within one registry instance
    fn identifier(&self) -> &str;

    /// Higher values run earlier; ties broken by registration order
    fn priority(&self) -> i32 {
        0
    }

    /// Cheap, synchronous eligibility predicate
    fn can_process(&self, message: &Message) -> bool;

    /// Inspect and optionally transform, veto, or fail
    async fn process(&self, message: Message) -> Result<Option<Message>, ProcessorError>;
}
