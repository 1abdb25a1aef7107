//! Shared processor doubles and helpers for pipeline scenario tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::pipeline::{Message, MessageContent, MessageProcessor, ProcessorError};

/// Extract a text payload for assertions
pub fn body(message: &Message) -> String {
    match &message.content {
        MessageContent::Text(text) => text.clone(),
        other => panic!("expected text content, got {:?}", other),
    }
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_for<F>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Passes every message through, stamping `<key> = true` into metadata
pub struct EchoProcessor {
    pub identifier: String,
    pub priority: i32,
    pub key: String,
}

impl EchoProcessor {
    pub fn new(identifier: &str, priority: i32) -> Arc<Self> {
        Arc::new(Self {
            identifier: identifier.to_string(),
            priority,
            key: identifier.to_string(),
        })
    }
}

#[async_trait]
impl MessageProcessor for EchoProcessor {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_process(&self, _message: &Message) -> bool {
        true
    }

    async fn process(&self, message: Message) -> Result<Option<Message>, ProcessorError> {
        Ok(Some(message.with_metadata(self.key.clone(), true)))
    }
}

/// Records every message it sees (body text) and passes it through unchanged
pub struct RecordingProcessor {
    pub identifier: String,
    pub priority: i32,
    pub seen: Arc<Mutex<Vec<String>>>,
}

impl RecordingProcessor {
    pub fn new(identifier: &str, priority: i32) -> Arc<Self> {
        Arc::new(Self {
            identifier: identifier.to_string(),
            priority,
            seen: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageProcessor for RecordingProcessor {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_process(&self, _message: &Message) -> bool {
        true
    }

    async fn process(&self, message: Message) -> Result<Option<Message>, ProcessorError> {
        self.seen.lock().unwrap().push(body(&message));
        Ok(Some(message))
    }
}

/// Vetoes messages from one sender, passes everything else through
pub struct VetoProcessor {
    pub identifier: String,
    pub priority: i32,
    pub blocked_sender: String,
}

impl VetoProcessor {
    pub fn new(identifier: &str, priority: i32, blocked_sender: &str) -> Arc<Self> {
        Arc::new(Self {
            identifier: identifier.to_string(),
            priority,
            blocked_sender: blocked_sender.to_string(),
        })
    }
}

#[async_trait]
impl MessageProcessor for VetoProcessor {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_process(&self, _message: &Message) -> bool {
        true
    }

    async fn process(&self, message: Message) -> Result<Option<Message>, ProcessorError> {
        if message.sender_id == self.blocked_sender {
            Ok(None)
        } else {
            Ok(Some(message))
        }
    }
}

/// Fails unconditionally
pub struct FailingProcessor {
    pub identifier: String,
    pub priority: i32,
    pub invocations: Arc<AtomicUsize>,
}

impl FailingProcessor {
    pub fn new(identifier: &str, priority: i32) -> Arc<Self> {
        Arc::new(Self {
            identifier: identifier.to_string(),
            priority,
            invocations: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageProcessor for FailingProcessor {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_process(&self, _message: &Message) -> bool {
        true
    }

    async fn process(&self, _message: Message) -> Result<Option<Message>, ProcessorError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Err(ProcessorError::failed("deliberate failure"))
    }
}

/// Fails the first `failures` invocations, then succeeds
pub struct FlakyProcessor {
    pub identifier: String,
    pub priority: i32,
    failures: usize,
    invocations: AtomicUsize,
}

impl FlakyProcessor {
    pub fn new(identifier: &str, priority: i32, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            identifier: identifier.to_string(),
            priority,
            failures,
            invocations: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl MessageProcessor for FlakyProcessor {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_process(&self, _message: &Message) -> bool {
        true
    }

    async fn process(&self, message: Message) -> Result<Option<Message>, ProcessorError> {
        let attempt = self.invocations.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            Err(ProcessorError::failed("transient failure"))
        } else {
            Ok(Some(message))
        }
    }
}

/// Sleeps for a fixed delay, then passes the message through
pub struct SlowProcessor {
    pub identifier: String,
    pub priority: i32,
    pub delay: Duration,
}

impl SlowProcessor {
    pub fn new(identifier: &str, priority: i32, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            identifier: identifier.to_string(),
            priority,
            delay,
        })
    }
}

#[async_trait]
impl MessageProcessor for SlowProcessor {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_process(&self, _message: &Message) -> bool {
        true
    }

    async fn process(&self, message: Message) -> Result<Option<Message>, ProcessorError> {
        tokio::time::sleep(self.delay).await;
        Ok(Some(message))
    }
}
