//! Processor ordering guarantees within one message walk

#[cfg(test)]
mod tests {
    use crate::pipeline::tests::support::*;
    use crate::pipeline::{
        HistoryFilter, Message, MessageProcessor, MetadataValue, PipelineManager, ProcessorError,
    };
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Records whether a given metadata key was already present when invoked
    struct WitnessProcessor {
        identifier: String,
        priority: i32,
        watch_key: String,
        observations: Arc<Mutex<Vec<bool>>>,
    }

    #[async_trait]
    impl MessageProcessor for WitnessProcessor {
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
            self.observations
                .lock()
                .unwrap()
                .push(message.metadata.contains_key(&self.watch_key));
            Ok(Some(message.with_metadata(self.identifier.clone(), true)))
        }
    }

    #[tokio::test]
    async fn test_higher_priority_transformation_visible_to_lower() {
        // A (priority 100) runs before B (priority 50): A's metadata is
        // visible to B, never the reverse.
        let pipeline = PipelineManager::new();

        let b_saw_a = Arc::new(Mutex::new(Vec::new()));
        pipeline
            .register_processor(Arc::new(WitnessProcessor {
                identifier: "b".to_string(),
                priority: 50,
                watch_key: "a".to_string(),
                observations: b_saw_a.clone(),
            }))
            .unwrap();

        let a_saw_b = Arc::new(Mutex::new(Vec::new()));
        pipeline
            .register_processor(Arc::new(WitnessProcessor {
                identifier: "a".to_string(),
                priority: 100,
                watch_key: "b".to_string(),
                observations: a_saw_b.clone(),
            }))
            .unwrap();

        pipeline.start();
        pipeline.submit(Message::text("u1", "ordered"));

        assert!(
            wait_for(
                || pipeline.statistics().total_processed == 1,
                Duration::from_secs(2)
            )
            .await
        );

        assert_eq!(*b_saw_a.lock().unwrap(), vec![true], "B must see A's edit");
        assert_eq!(
            *a_saw_b.lock().unwrap(),
            vec![false],
            "A must never see B's edit"
        );

        // Final message carries both annotations
        let entries = pipeline.history(&HistoryFilter::all());
        let metadata = &entries[0].message.metadata;
        assert_eq!(metadata.get("a"), Some(&MetadataValue::Bool(true)));
        assert_eq!(metadata.get("b"), Some(&MetadataValue::Bool(true)));

        pipeline.stop();
    }

    #[tokio::test]
    async fn test_equal_priority_runs_in_registration_order() {
        let pipeline = PipelineManager::new();

        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let order = order.clone();
            let name = name.to_string();

            struct OrderProbe {
                name: String,
                order: Arc<Mutex<Vec<String>>>,
            }

            #[async_trait]
            impl MessageProcessor for OrderProbe {
                fn identifier(&self) -> &str {
                    &self.name
                }

                fn priority(&self) -> i32 {
                    42
                }

                fn can_process(&self, _message: &Message) -> bool {
                    true
                }

                async fn process(
                    &self,
                    message: Message,
                ) -> Result<Option<Message>, ProcessorError> {
                    self.order.lock().unwrap().push(self.name.clone());
                    Ok(Some(message))
                }
            }

            pipeline
                .register_processor(Arc::new(OrderProbe { name, order }))
                .unwrap();
        }

        pipeline.start();
        pipeline.submit(Message::text("u1", "tie"));

        assert!(
            wait_for(
                || pipeline.statistics().total_processed == 1,
                Duration::from_secs(2)
            )
            .await
        );

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);

        pipeline.stop();
    }
}
