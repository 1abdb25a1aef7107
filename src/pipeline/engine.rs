//! Dispatch engine: the consumer loop draining the message queue
//!
//! For every dequeued message the engine snapshots the registry, walks the
//! eligible processors in priority order and settles the message into exactly
//! one terminal outcome. Faults are isolated per processor: a failing
//! processor never aborts the chain for the others, and nothing that happens
//! inside a processing pass can terminate the consumer loop.

use chrono::Utc;
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, Semaphore};
use tokio::time::{sleep, timeout};

use crate::pipeline::config::{PipelineConfig, RetryScope};
use crate::pipeline::error::{PipelineError, ProcessorError};
use crate::pipeline::history::{MessageHistory, MessageOutcome};
use crate::pipeline::message::Message;
use crate::pipeline::processor::MessageProcessor;
use crate::pipeline::queue::MessageQueue;
use crate::pipeline::registry::SharedProcessorRegistry;
use crate::pipeline::stats::ProcessingStatistics;

type ProcessedCallback = Box<dyn Fn(&Message) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&PipelineError, &Message) + Send + Sync>;

/// Observer list for completion and error notification
///
/// Completion and processor-failure callbacks run on the dispatch task;
/// intake validation errors are reported at the submit call site. Either
/// way, submission itself never waits on downstream work.
#[derive(Default)]
pub(crate) struct CallbackRegistry {
    processed: RwLock<Vec<ProcessedCallback>>,
    errors: RwLock<Vec<ErrorCallback>>,
}

impl CallbackRegistry {
    pub fn add_processed<F>(&self, callback: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.processed.write().unwrap().push(Box::new(callback));
    }

    pub fn add_error<F>(&self, callback: F)
    where
        F: Fn(&PipelineError, &Message) + Send + Sync + 'static,
    {
        self.errors.write().unwrap().push(Box::new(callback));
    }

    pub fn notify_processed(&self, message: &Message) {
        for callback in self.processed.read().unwrap().iter() {
            callback(message);
        }
    }

    pub fn notify_error(&self, error: &PipelineError, message: &Message) {
        for callback in self.errors.read().unwrap().iter() {
            callback(error, message);
        }
    }
}

/// Shared structures the dispatch loop operates on
///
/// Registry, queue and statistics are independently synchronized so that
/// registering a processor never blocks dispatch and reading statistics never
/// blocks producers.
pub(crate) struct DispatchContext {
    pub queue: Arc<MessageQueue>,
    pub registry: SharedProcessorRegistry,
    pub stats: Arc<ProcessingStatistics>,
    pub history: Arc<MessageHistory>,
    pub callbacks: Arc<CallbackRegistry>,
    pub config: Arc<RwLock<PipelineConfig>>,
}

impl DispatchContext {
    fn config_snapshot(&self) -> PipelineConfig {
        self.config.read().unwrap().clone()
    }
}

/// Consumer loop: drains the queue until intake is closed and empty, or a
/// stop signal arrives
///
/// With `max_concurrency` 1 the loop processes messages inline; above 1 it
/// fans passes out to a bounded worker pool. The per-message processor walk
/// is sequential either way.
pub(crate) async fn run(ctx: Arc<DispatchContext>, mut stop_rx: broadcast::Receiver<()>) {
    let max_concurrency = ctx.config_snapshot().max_concurrency.max(1);
    let workers = Arc::new(Semaphore::new(max_concurrency));

    log::debug!("dispatch loop started (workers: {})", max_concurrency);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                log::debug!("dispatch loop received stop signal");
                break;
            }
            dequeued = ctx.queue.dequeue() => {
                let Some(message) = dequeued else {
                    // Intake closed and the queue is drained
                    break;
                };

                if max_concurrency == 1 {
                    process_message(&ctx, message).await;
                } else {
                    let Ok(permit) = Arc::clone(&workers).acquire_owned().await else {
                        break;
                    };
                    let ctx = Arc::clone(&ctx);
                    tokio::spawn(async move {
                        process_message(&ctx, message).await;
                        drop(permit);
                    });
                }
            }
        }
    }

    // Let fanned-out passes settle before reporting the loop done, so a
    // drain observed through the task handle includes in-flight work.
    let _ = workers.acquire_many(max_concurrency as u32).await;
    log::debug!("dispatch loop exited");
}

/// Run one message through the processor chain (one processing pass)
pub(crate) async fn process_message(ctx: &DispatchContext, message: Message) {
    if message.is_expired(Utc::now()) {
        ctx.stats.record_expired();
        log::trace!("message {} expired before dispatch", message.id);
        return;
    }

    let eligible: Vec<Arc<dyn MessageProcessor>> = ctx
        .registry
        .ordered()
        .into_iter()
        .filter(|processor| processor.can_process(&message))
        .collect();

    if eligible.is_empty() {
        ctx.stats.record_skipped();
        log::trace!("message {} skipped: no eligible processor", message.id);
        return;
    }

    let config = ctx.config_snapshot();
    let mut current = message;
    let mut retry_spent = false;
    let mut any_succeeded = false;
    let mut any_failed = false;

    for processor in eligible {
        let retry_allowed = config.enable_retry
            && (config.retry_scope == RetryScope::AllProcessors || !retry_spent);

        let (result, attempts) =
            invoke_with_retry(ctx, processor.as_ref(), &current, &config, retry_allowed).await;
        if attempts > 1 {
            retry_spent = true;
        }

        match result {
            Ok(Some(next)) => {
                any_succeeded = true;
                current = next;
            }
            Ok(None) => {
                // Intentional veto: stop the walk, later processors never run
                ctx.stats.record_filtered();
                ctx.history.record(current.clone(), MessageOutcome::Filtered);
                log::trace!(
                    "message {} filtered by '{}'",
                    current.id,
                    processor.identifier()
                );
                return;
            }
            Err(error) => {
                // Operational fault: report it, then continue the walk with
                // the last successfully-produced message value
                retry_spent = true;
                any_failed = true;
                ctx.stats.record_failed();
                log::warn!(
                    "processor '{}' failed for message {}: {}",
                    processor.identifier(),
                    current.id,
                    error
                );
                let error = PipelineError::ProcessorFailed {
                    identifier: processor.identifier().to_string(),
                    source: error,
                };
                ctx.callbacks.notify_error(&error, &current);
            }
        }
    }

    // Walk completed without a veto
    ctx.stats.record_processed();
    let outcome = if any_failed && !any_succeeded {
        MessageOutcome::Failed
    } else {
        MessageOutcome::Processed
    };
    ctx.history.record(current.clone(), outcome);
    ctx.callbacks.notify_processed(&current);
}

/// Invoke one processor with the per-attempt timeout and, when allowed, the
/// retry policy. Only the final failure is returned; every extra attempt is
/// counted as a retry.
async fn invoke_with_retry(
    ctx: &DispatchContext,
    processor: &dyn MessageProcessor,
    message: &Message,
    config: &PipelineConfig,
    retry_allowed: bool,
) -> (Result<Option<Message>, ProcessorError>, usize) {
    let max_attempts = if retry_allowed {
        config.max_retry_attempts.max(1)
    } else {
        1
    };

    let mut last_error = None;

    for attempt in 1..=max_attempts {
        let result = match config.processing_timeout {
            Some(limit) => match timeout(limit, processor.process(message.clone())).await {
                Ok(result) => result,
                Err(_) => Err(ProcessorError::Timeout { timeout: limit }),
            },
            None => processor.process(message.clone()).await,
        };

        match result {
            Ok(outcome) => return (Ok(outcome), attempt),
            Err(error) => {
                last_error = Some(error);
                if attempt < max_attempts {
                    ctx.stats.record_retried();
                    log::debug!(
                        "processor '{}' failed on attempt {}/{}, retrying in {:?}: {}",
                        processor.identifier(),
                        attempt,
                        max_attempts,
                        config.retry_delay,
                        last_error.as_ref().unwrap()
                    );
                    sleep(config.retry_delay).await;
                }
            }
        }
    }

    (Err(last_error.unwrap()), max_attempts)
}
