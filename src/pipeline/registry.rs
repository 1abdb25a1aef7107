//! Processor Registry
//!
//! Holds the set of registered processors, enforces unique identifiers and
//! exposes them in `(priority desc, registration order asc)` order. Reads are
//! snapshots: iterating a batch never observes a half-updated list, and
//! registering a processor never blocks in-flight dispatch.

use std::sync::{Arc, RwLock};

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::processor::MessageProcessor;

struct RegisteredProcessor {
    processor: Arc<dyn MessageProcessor>,
    registration_order: u64,
}

/// Ordered processor collection with duplicate-identifier rejection
pub struct ProcessorRegistry {
    entries: Vec<RegisteredProcessor>,
    next_order: u64,
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("processors", &self.identifiers())
            .finish()
    }
}

impl ProcessorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_order: 0,
        }
    }

    /// Register a processor
    ///
    /// Fails with [`PipelineError::DuplicateProcessor`] if a processor with
    /// the same identifier is already present.
    pub fn register(&mut self, processor: Arc<dyn MessageProcessor>) -> PipelineResult<()> {
        let identifier = processor.identifier().to_string();

        if self.contains(&identifier) {
            return Err(PipelineError::DuplicateProcessor { identifier });
        }

        let registration_order = self.next_order;
        self.next_order += 1;

        self.entries.push(RegisteredProcessor {
            processor,
            registration_order,
        });

        // Higher priority first; stable tie-break on registration order
        self.entries.sort_by(|a, b| {
            b.processor
                .priority()
                .cmp(&a.processor.priority())
                .then(a.registration_order.cmp(&b.registration_order))
        });

        Ok(())
    }

    /// Remove a processor by identifier; absent identifiers are a no-op
    pub fn unregister(&mut self, identifier: &str) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| entry.processor.identifier() != identifier);
        before != self.entries.len()
    }

    /// Check whether an identifier is registered
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.processor.identifier() == identifier)
    }

    /// Snapshot of the current priority-ordered processor sequence
    pub fn ordered(&self) -> Vec<Arc<dyn MessageProcessor>> {
        self.entries
            .iter()
            .map(|entry| Arc::clone(&entry.processor))
            .collect()
    }

    /// Registered identifiers in priority order
    pub fn identifiers(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.processor.identifier().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe shared processor registry
///
/// Cloning shares the underlying registry. Dispatch takes [`ordered`]
/// snapshots, so mutations never invalidate an in-progress walk.
///
/// [`ordered`]: SharedProcessorRegistry::ordered
#[derive(Clone)]
pub struct SharedProcessorRegistry {
    inner: Arc<RwLock<ProcessorRegistry>>,
}

impl std::fmt::Debug for SharedProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedProcessorRegistry")
            .field("processors", &self.identifiers())
            .finish()
    }
}

impl SharedProcessorRegistry {
    /// Create a new shared registry
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ProcessorRegistry::new())),
        }
    }

    pub fn register(&self, processor: Arc<dyn MessageProcessor>) -> PipelineResult<()> {
        self.inner.write().unwrap().register(processor)
    }

    pub fn unregister(&self, identifier: &str) -> bool {
        self.inner.write().unwrap().unregister(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.inner.read().unwrap().contains(identifier)
    }

    pub fn ordered(&self) -> Vec<Arc<dyn MessageProcessor>> {
        self.inner.read().unwrap().ordered()
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.inner.read().unwrap().identifiers()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }
}

impl Default for SharedProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
