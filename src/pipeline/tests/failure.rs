//! Failure isolation, retry policy and processing timeouts

#[cfg(test)]
mod tests {
    use crate::pipeline::tests::support::*;
    use crate::pipeline::{
        Message, PipelineConfig, PipelineError, PipelineManager, ProcessorError, RetryScope,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn retrying_config(max_attempts: usize, scope: RetryScope) -> PipelineConfig {
        PipelineConfig {
            enable_retry: true,
            max_retry_attempts: max_attempts,
            retry_delay: Duration::from_millis(10),
            retry_scope: scope,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_failing_processor_does_not_abort_chain() {
        // The highest-priority processor always fails; the lower-priority
        // echo still runs and the message is still processed.
        let pipeline = PipelineManager::new();

        let failing = FailingProcessor::new("failing", 100);
        pipeline.register_processor(failing.clone()).unwrap();
        pipeline
            .register_processor(EchoProcessor::new("echo", 10))
            .unwrap();

        let reported = Arc::new(Mutex::new(Vec::new()));
        {
            let reported = reported.clone();
            pipeline.on_processing_error(move |error, _message| {
                if let PipelineError::ProcessorFailed { identifier, .. } = error {
                    reported.lock().unwrap().push(identifier.clone());
                }
            });
        }

        pipeline.start();
        pipeline.submit(Message::text("u1", "survives"));

        assert!(
            wait_for(
                || pipeline.statistics().total_processed == 1,
                Duration::from_secs(2)
            )
            .await
        );

        let snapshot = pipeline.statistics();
        assert_eq!(snapshot.total_failed, 1);
        assert_eq!(snapshot.total_processed, 1);
        assert_eq!(*reported.lock().unwrap(), vec!["failing".to_string()]);

        pipeline.stop();
    }

    #[tokio::test]
    async fn test_retry_until_success_counts_retries() {
        let pipeline =
            PipelineManager::with_config(retrying_config(3, RetryScope::AllProcessors));

        // Fails twice, succeeds on the third attempt
        pipeline
            .register_processor(FlakyProcessor::new("flaky", 10, 2))
            .unwrap();

        pipeline.start();
        pipeline.submit(Message::text("u1", "eventually fine"));

        assert!(
            wait_for(
                || pipeline.statistics().total_processed == 1,
                Duration::from_secs(2)
            )
            .await
        );

        let snapshot = pipeline.statistics();
        assert_eq!(snapshot.total_retried, 2);
        // The failure never became final, so nothing is counted as failed
        assert_eq!(snapshot.total_failed, 0);

        pipeline.stop();
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_only_final_failure() {
        let pipeline =
            PipelineManager::with_config(retrying_config(2, RetryScope::AllProcessors));

        let failing = FailingProcessor::new("hopeless", 10);
        pipeline.register_processor(failing.clone()).unwrap();

        let error_reports = Arc::new(AtomicUsize::new(0));
        {
            let error_reports = error_reports.clone();
            pipeline.on_processing_error(move |_error, _message| {
                error_reports.fetch_add(1, Ordering::SeqCst);
            });
        }

        pipeline.start();
        pipeline.submit(Message::text("u1", "doomed"));

        assert!(
            wait_for(
                || pipeline.statistics().total_failed == 1,
                Duration::from_secs(2)
            )
            .await
        );

        assert_eq!(failing.invocations(), 2, "both attempts must run");
        assert_eq!(pipeline.statistics().total_retried, 1);
        // Only the final failure reaches the callback
        assert_eq!(error_reports.load(Ordering::SeqCst), 1);

        pipeline.stop();
    }

    #[tokio::test]
    async fn test_first_failure_only_scope_limits_later_retries() {
        let pipeline =
            PipelineManager::with_config(retrying_config(3, RetryScope::FirstFailureOnly));

        let first = FailingProcessor::new("first-failure", 100);
        let second = FailingProcessor::new("second-failure", 50);
        pipeline.register_processor(first.clone()).unwrap();
        pipeline.register_processor(second.clone()).unwrap();

        pipeline.start();
        pipeline.submit(Message::text("u1", "scoped"));

        assert!(
            wait_for(
                || pipeline.statistics().total_failed == 2,
                Duration::from_secs(2)
            )
            .await
        );

        assert_eq!(first.invocations(), 3, "first failing processor is retried");
        assert_eq!(second.invocations(), 1, "later failures fail fast");
        assert_eq!(pipeline.statistics().total_retried, 2);

        pipeline.stop();
    }

    #[tokio::test]
    async fn test_all_processors_scope_retries_every_failure() {
        let pipeline =
            PipelineManager::with_config(retrying_config(3, RetryScope::AllProcessors));

        let first = FailingProcessor::new("first-failure", 100);
        let second = FailingProcessor::new("second-failure", 50);
        pipeline.register_processor(first.clone()).unwrap();
        pipeline.register_processor(second.clone()).unwrap();

        pipeline.start();
        pipeline.submit(Message::text("u1", "scoped"));

        assert!(
            wait_for(
                || pipeline.statistics().total_failed == 2,
                Duration::from_secs(2)
            )
            .await
        );

        assert_eq!(first.invocations(), 3);
        assert_eq!(second.invocations(), 3);
        assert_eq!(pipeline.statistics().total_retried, 4);

        pipeline.stop();
    }

    #[tokio::test]
    async fn test_processing_timeout_is_a_failure() {
        let pipeline = PipelineManager::with_config(PipelineConfig {
            processing_timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        });

        pipeline
            .register_processor(SlowProcessor::new(
                "glacial",
                10,
                Duration::from_millis(500),
            ))
            .unwrap();

        let timeouts = Arc::new(AtomicUsize::new(0));
        {
            let timeouts = timeouts.clone();
            pipeline.on_processing_error(move |error, _message| {
                if let PipelineError::ProcessorFailed {
                    source: ProcessorError::Timeout { .. },
                    ..
                } = error
                {
                    timeouts.fetch_add(1, Ordering::SeqCst);
                }
            });
        }

        pipeline.start();
        pipeline.submit(Message::text("u1", "too slow"));

        assert!(
            wait_for(
                || pipeline.statistics().total_failed == 1,
                Duration::from_secs(2)
            )
            .await
        );
        assert_eq!(timeouts.load(Ordering::SeqCst), 1);

        pipeline.stop();
    }

    #[tokio::test]
    async fn test_failed_processor_passes_last_good_value_onward() {
        // echo (200) annotates, breaker (100) fails, witness (50) must still
        // see echo's annotation.
        let pipeline = PipelineManager::new();

        pipeline
            .register_processor(EchoProcessor::new("echo", 200))
            .unwrap();
        pipeline
            .register_processor(FailingProcessor::new("breaker", 100))
            .unwrap();
        let witness = RecordingProcessor::new("witness", 50);
        pipeline.register_processor(witness.clone()).unwrap();

        let finals = Arc::new(Mutex::new(Vec::new()));
        {
            let finals = finals.clone();
            pipeline.on_message_processed(move |message| {
                finals.lock().unwrap().push(message.clone());
            });
        }

        pipeline.start();
        pipeline.submit(Message::text("u1", "carries on"));

        assert!(
            wait_for(
                || pipeline.statistics().total_processed == 1,
                Duration::from_secs(2)
            )
            .await
        );

        assert_eq!(witness.seen(), vec!["carries on"]);
        let finals = finals.lock().unwrap();
        assert!(finals[0].metadata.contains_key("echo"));

        pipeline.stop();
    }
}
