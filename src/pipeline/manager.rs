//! PipelineManager - the externally visible pipeline facade
//!
//! Owns the queue, registry, statistics, history and the dispatch engine
//! task, and enforces the `Stopped -> Running -> Draining -> Stopped`
//! lifecycle. Managers are explicit instances created by the application's
//! composition root; there is no process-wide default.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::pipeline::config::PipelineConfig;
use crate::pipeline::engine::{self, CallbackRegistry, DispatchContext};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::history::{HistoryEntry, HistoryFilter, MessageHistory};
use crate::pipeline::message::Message;
use crate::pipeline::processor::MessageProcessor;
use crate::pipeline::queue::{EnqueueOutcome, MessageQueue};
use crate::pipeline::registry::SharedProcessorRegistry;
use crate::pipeline::stats::{ProcessingStatistics, StatisticsSnapshot};

/// Pipeline lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PipelineState {
    Stopped,
    Running,
    Draining,
}

struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: PipelineState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    fn decode(raw: u8) -> PipelineState {
        match raw {
            1 => PipelineState::Running,
            2 => PipelineState::Draining,
            _ => PipelineState::Stopped,
        }
    }

    fn load(&self) -> PipelineState {
        Self::decode(self.0.load(Ordering::Acquire))
    }

    fn store(&self, state: PipelineState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn swap(&self, state: PipelineState) -> PipelineState {
        Self::decode(self.0.swap(state as u8, Ordering::AcqRel))
    }

    fn transition(&self, from: PipelineState, to: PipelineState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Facade over the message processing pipeline
///
/// Thread-safe: multiple producers may submit concurrently while a single
/// dispatch loop drains the queue. Submission is fire-and-forget - intake
/// validation failures and processor failures are delivered through the
/// error callback, never as a return value from `submit`.
///
/// # Example
///
/// ```rust,no_run
/// use commlink::pipeline::{Message, PipelineManager};
///
/// # async fn example() {
/// let pipeline = PipelineManager::new();
/// pipeline.start();
/// pipeline.submit(Message::text("u1", "hello"));
/// pipeline.graceful_shutdown(std::time::Duration::from_secs(5)).await;
/// # }
/// ```
pub struct PipelineManager {
    ctx: Arc<DispatchContext>,
    state: Arc<StateCell>,
    shutdown_tx: broadcast::Sender<()>,
    engine_task: Mutex<Option<JoinHandle<()>>>,
}

impl PipelineManager {
    /// Create a manager with default configuration and a fresh registry
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Create a manager with the given configuration
    pub fn with_config(config: PipelineConfig) -> Self {
        Self::with_registry(SharedProcessorRegistry::new(), config)
    }

    /// Create a manager around an externally owned registry
    ///
    /// The registry is injected so the composition root can share it with
    /// other components or pre-populate it before the pipeline exists.
    pub fn with_registry(registry: SharedProcessorRegistry, config: PipelineConfig) -> Self {
        let config = config.normalized();
        let (shutdown_tx, _) = broadcast::channel(8);

        let ctx = Arc::new(DispatchContext {
            queue: Arc::new(MessageQueue::new(config.max_queue_size)),
            registry,
            stats: Arc::new(ProcessingStatistics::new(config.enable_statistics)),
            history: Arc::new(MessageHistory::new(config.max_history_entries)),
            callbacks: Arc::new(CallbackRegistry::default()),
            config: Arc::new(RwLock::new(config)),
        });

        Self {
            ctx,
            state: Arc::new(StateCell::new(PipelineState::Stopped)),
            shutdown_tx,
            engine_task: Mutex::new(None),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> PipelineState {
        self.state.load()
    }

    /// Register a processor; fails on duplicate identifiers
    pub fn register_processor(
        &self,
        processor: Arc<dyn MessageProcessor>,
    ) -> PipelineResult<()> {
        let identifier = processor.identifier().to_string();
        self.ctx.registry.register(processor)?;
        log::debug!("processor '{}' registered", identifier);
        Ok(())
    }

    /// Remove a processor; absent identifiers are a no-op
    pub fn unregister_processor(&self, identifier: &str) {
        if self.ctx.registry.unregister(identifier) {
            log::debug!("processor '{}' unregistered", identifier);
        }
    }

    /// Submit one message for processing
    ///
    /// Rejected silently while the pipeline is not running (no counter moves).
    /// Structurally invalid messages are reported through the error callback
    /// and never enter the queue. Queue overflow drops the incoming message
    /// and counts it - expected backpressure, not a fault.
    pub fn submit(&self, message: Message) {
        if self.state() != PipelineState::Running {
            log::trace!(
                "message {} rejected: pipeline is {}",
                message.id,
                self.state()
            );
            return;
        }

        if let Err(validation) = message.validate() {
            let error = PipelineError::InvalidMessage { source: validation };
            log::debug!("message {} failed intake validation: {}", message.id, error);
            self.ctx.callbacks.notify_error(&error, &message);
            return;
        }

        self.ctx.stats.record_received();
        match self.ctx.queue.enqueue(message) {
            EnqueueOutcome::Enqueued(_) => {}
            EnqueueOutcome::Dropped | EnqueueOutcome::Closed => {
                self.ctx.stats.record_dropped();
            }
        }
    }

    /// Submit several messages in intake order
    pub fn submit_batch(&self, messages: Vec<Message>) {
        for message in messages {
            self.submit(message);
        }
    }

    /// Transition Stopped -> Running and spawn the dispatch loop
    ///
    /// Ignored unless the pipeline is currently stopped. Must be called from
    /// within a tokio runtime.
    pub fn start(&self) {
        if !self
            .state
            .transition(PipelineState::Stopped, PipelineState::Running)
        {
            log::debug!("start ignored: pipeline is {}", self.state());
            return;
        }

        // A previous engine may still be winding down after a hard stop;
        // there must never be two consumers on the queue.
        if let Some(previous) = self.engine_task.lock().unwrap().take() {
            if !previous.is_finished() {
                previous.abort();
            }
        }

        self.ctx.queue.reopen();
        let ctx = Arc::clone(&self.ctx);
        let stop_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(engine::run(ctx, stop_rx));
        *self.engine_task.lock().unwrap() = Some(handle);

        log::debug!("pipeline started");
    }

    /// Immediate transition to Stopped
    ///
    /// Queued messages stay in the queue and are picked up by a later
    /// `start()`; submissions while stopped are rejected outright.
    pub fn stop(&self) {
        let previous = self.state.swap(PipelineState::Stopped);
        if previous == PipelineState::Stopped {
            return;
        }

        self.ctx.queue.close_intake();
        let _ = self.shutdown_tx.send(());
        log::debug!("pipeline stopped (was {})", previous);
    }

    /// Close intake and drain the existing queue, bounded by `timeout`
    ///
    /// Returns `true` if the queue fully drained (including in-flight
    /// passes), `false` if the timeout elapsed first or the pipeline was not
    /// running. Either way the pipeline ends up Stopped.
    pub async fn graceful_shutdown(&self, timeout: Duration) -> bool {
        if !self
            .state
            .transition(PipelineState::Running, PipelineState::Draining)
        {
            log::debug!("graceful_shutdown ignored: pipeline is {}", self.state());
            return false;
        }

        log::debug!("pipeline draining (timeout {:?})", timeout);
        self.ctx.queue.close_intake();

        let handle = self.engine_task.lock().unwrap().take();
        let drained = match handle {
            Some(handle) => match tokio::time::timeout(timeout, handle).await {
                Ok(_) => true,
                Err(_) => {
                    // Timed out: tell the (now detached) loop to give up on
                    // whatever is left
                    let _ = self.shutdown_tx.send(());
                    false
                }
            },
            None => true,
        };

        self.state.store(PipelineState::Stopped);
        log::debug!("pipeline stopped after drain (complete: {})", drained);
        drained
    }

    /// Replace the configuration
    ///
    /// Queue capacity, statistics toggling, history bound and retry settings
    /// apply immediately; `max_concurrency` applies at the next `start()`.
    pub fn configure(&self, config: PipelineConfig) {
        let config = config.normalized();
        self.ctx.queue.set_max_size(config.max_queue_size);
        self.ctx.stats.set_enabled(config.enable_statistics);
        self.ctx.history.set_max_entries(config.max_history_entries);
        *self.ctx.config.write().unwrap() = config;
    }

    /// Copy of the current configuration
    pub fn config(&self) -> PipelineConfig {
        self.ctx.config.read().unwrap().clone()
    }

    /// Current counter snapshot
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.ctx.stats.snapshot()
    }

    /// Zero all counters
    pub fn reset_statistics(&self) {
        self.ctx.stats.reset();
    }

    /// Matching history entries, oldest first
    pub fn history(&self, filter: &HistoryFilter) -> Vec<HistoryEntry> {
        self.ctx.history.query(filter)
    }

    pub fn clear_history(&self) {
        self.ctx.history.clear();
    }

    /// Number of accepted-but-not-yet-dispatched messages
    pub fn queue_depth(&self) -> usize {
        self.ctx.queue.len()
    }

    /// Register an observer for successfully processed messages
    pub fn on_message_processed<F>(&self, callback: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.ctx.callbacks.add_processed(callback);
    }

    /// Register an observer for intake validation and processor failures
    pub fn on_processing_error<F>(&self, callback: F)
    where
        F: Fn(&PipelineError, &Message) + Send + Sync + 'static,
    {
        self.ctx.callbacks.add_error(callback);
    }
}

impl Default for PipelineManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PipelineManager {
    fn drop(&mut self) {
        // Best-effort: wake the dispatch loop so the task does not linger
        self.stop();
    }
}
