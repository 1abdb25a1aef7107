//! Message Processing Pipeline
//!
//! Routes structured messages through an ordered set of independently
//! registered processors, enforcing priority and backpressure, retrying
//! transient failures and reporting outcome statistics, all under concurrent
//! load.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────┐   ┌──────────┐   ┌──────────┐
//!  │ caller A │   │ caller B │   │ provider │   (concurrent producers)
//!  └────┬─────┘   └────┬─────┘   └────┬─────┘
//!       │ submit       │ submit       │ submit
//!       ▼              ▼              ▼
//!  ┌─────────────────────────────────────────┐
//!  │            PipelineManager              │
//!  │  intake validation → bounded priority   │
//!  │  queue (priority desc, arrival asc)     │
//!  └────────────────────┬────────────────────┘
//!                       │ dequeue (single consumer loop)
//!                       ▼
//!  ┌─────────────────────────────────────────┐
//!  │             DispatchEngine              │
//!  │  registry snapshot → eligible walk      │
//!  │  (retry / timeout / veto / isolation)   │
//!  └────────────────────┬────────────────────┘
//!                       │ terminal outcome
//!                       ▼
//!       statistics + history + callbacks
//! ```
//!
//! # Outcomes
//!
//! Every dequeued message settles into exactly one terminal outcome:
//! **processed** (the walk completed), **filtered** (a processor vetoed it),
//! **skipped** (no eligible processor), or it is silently discarded when
//! expired. Processor *failure* is not a terminal outcome by itself: the
//! chain continues with the next processor, isolating faults per processor
//! rather than per message.
//!
//! # Example
//!
//! ```rust,no_run
//! use commlink::pipeline::{Message, MessagePriority, PipelineManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = PipelineManager::new();
//! pipeline.start();
//!
//! pipeline.submit(
//!     Message::text("u1", "hello room").with_priority(MessagePriority::High),
//! );
//!
//! let stats = pipeline.statistics();
//! println!("processed so far: {}", stats.total_processed);
//!
//! pipeline.graceful_shutdown(std::time::Duration::from_secs(5)).await;
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod history;
mod manager;
mod message;
mod processor;
mod queue;
mod registry;
mod stats;

pub use config::{PipelineConfig, RetryScope};
pub use error::{PipelineError, PipelineResult, ProcessorError, ValidationError};
pub use history::{HistoryEntry, HistoryFilter, MessageHistory, MessageOutcome};
pub use manager::{PipelineManager, PipelineState};
pub use message::{
    Message, MessageContent, MessageKind, MessagePriority, MetadataValue, SYSTEM_SENDER,
};
pub use processor::MessageProcessor;
pub use queue::{EnqueueOutcome, MessageQueue};
pub use registry::{ProcessorRegistry, SharedProcessorRegistry};
pub use stats::{ProcessingStatistics, StatisticsSnapshot};

#[cfg(test)]
mod tests;
