//! Task creation orchestration.
//!
//! Sequences the store write, the enrichment call, the subtask write, and
//! the event emission. Only the initial store write is mandatory; every
//! other step is caught, logged, and swallowed, so a degraded model API or
//! bus never fails the request and never leaves a partial subtask set
//! behind. The store's lock is taken per operation, never across the
//! enrichment or emission awaits.

use std::sync::Arc;

use crate::enrichment::Enricher;
use crate::events::{EventPublisher, TaskEvent};
use crate::store::{StoreError, Task, TaskPriority, TaskStore, SUBTASKS_PER_TASK};

/// Runs the task creation sequence against injected collaborators.
pub struct TaskOrchestrator {
    store: TaskStore,
    enricher: Option<Arc<dyn Enricher>>,
    events: Arc<dyn EventPublisher>,
}

impl TaskOrchestrator {
    pub fn new(
        store: TaskStore,
        enricher: Option<Arc<dyn Enricher>>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            enricher,
            events,
        }
    }

    /// Create a task, then run the best-effort enrichment and event steps.
    ///
    /// Returns the task exactly as stored in the mandatory first step;
    /// subtask attachment does not alter the returned record.
    pub async fn create_task(
        &self,
        title: &str,
        description: &str,
        priority: TaskPriority,
    ) -> Result<Task, StoreError> {
        let task = self.store.create_task(title, description, priority).await?;

        if let Some(enricher) = &self.enricher {
            match enricher.enrich(&task).await {
                Ok(enrichment) => {
                    tracing::info!(
                        "Task {} enriched: category '{}', {} proposed subtasks",
                        task.id,
                        enrichment.category,
                        enrichment.subtasks.len()
                    );
                    let titles = normalize_subtask_titles(enrichment.subtasks);
                    // The task can vanish between enrichment and this write;
                    // a missing parent is a no-op, not an error.
                    if let Err(e) = self.store.create_subtasks(task.id, &titles).await {
                        tracing::warn!("Skipping subtasks for task {}: {}", task.id, e);
                    }
                }
                Err(e) => {
                    tracing::warn!("Enrichment unavailable for task {}: {}", task.id, e);
                }
            }
        }

        if let Err(e) = self.events.publish(TaskEvent::task_created(&task)).await {
            tracing::warn!("Failed to queue task.created event for {}: {}", task.id, e);
        }

        Ok(task)
    }
}

/// Coerce the model's proposals to exactly [`SUBTASKS_PER_TASK`] titles:
/// blank entries are dropped, extras truncated, missing slots filled with
/// placeholder titles.
fn normalize_subtask_titles(mut titles: Vec<String>) -> Vec<String> {
    titles.retain(|title| !title.trim().is_empty());
    titles.truncate(SUBTASKS_PER_TASK);
    while titles.len() < SUBTASKS_PER_TASK {
        titles.push(format!("Additional subtask {}", titles.len() + 1));
    }
    titles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{EnrichmentError, TaskEnrichment};
    use crate::events::{DisabledEventPublisher, PublishError, TASK_CREATED};
    use crate::store::TaskStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct StaticEnricher {
        subtasks: Vec<&'static str>,
    }

    #[async_trait]
    impl Enricher for StaticEnricher {
        async fn enrich(&self, _task: &Task) -> Result<TaskEnrichment, EnrichmentError> {
            Ok(TaskEnrichment {
                summary: "summary".to_string(),
                subtasks: self.subtasks.iter().map(|s| s.to_string()).collect(),
                category: "Bug Fix".to_string(),
            })
        }
    }

    struct FailingEnricher;

    #[async_trait]
    impl Enricher for FailingEnricher {
        async fn enrich(&self, _task: &Task) -> Result<TaskEnrichment, EnrichmentError> {
            Err(EnrichmentError::Network("connection refused".to_string()))
        }
    }

    /// Deletes the parent mid-flight, reproducing the enrichment/delete race.
    struct DeletingEnricher {
        store: TaskStore,
    }

    #[async_trait]
    impl Enricher for DeletingEnricher {
        async fn enrich(&self, task: &Task) -> Result<TaskEnrichment, EnrichmentError> {
            self.store.delete_task(task.id).await;
            Ok(TaskEnrichment {
                summary: "summary".to_string(),
                subtasks: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                category: "Feature".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<TaskEvent>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, event: TaskEvent) -> Result<(), PublishError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }

        async fn flush(&self, _timeout: Duration) -> Result<(), PublishError> {
            Ok(())
        }

        fn is_enabled(&self) -> bool {
            true
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(&self, _event: TaskEvent) -> Result<(), PublishError> {
            Err(PublishError::QueueClosed)
        }

        async fn flush(&self, _timeout: Duration) -> Result<(), PublishError> {
            Err(PublishError::QueueClosed)
        }

        fn is_enabled(&self) -> bool {
            true
        }
    }

    fn orchestrator(
        store: &TaskStore,
        enricher: Option<Arc<dyn Enricher>>,
        events: Arc<dyn EventPublisher>,
    ) -> TaskOrchestrator {
        TaskOrchestrator::new(store.clone(), enricher, events)
    }

    #[test]
    fn test_normalize_pads_short_lists() {
        let titles = normalize_subtask_titles(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(titles, vec!["A", "B", "Additional subtask 3"]);

        let titles = normalize_subtask_titles(vec![]);
        assert_eq!(
            titles,
            vec![
                "Additional subtask 1",
                "Additional subtask 2",
                "Additional subtask 3"
            ]
        );
    }

    #[test]
    fn test_normalize_truncates_long_lists() {
        let titles = normalize_subtask_titles(
            vec!["A", "B", "C", "D", "E"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_normalize_drops_blank_titles() {
        let titles =
            normalize_subtask_titles(vec!["A".to_string(), "  ".to_string(), "B".to_string()]);
        assert_eq!(titles, vec!["A", "B", "Additional subtask 3"]);
    }

    #[tokio::test]
    async fn test_successful_enrichment_persists_three_subtasks() {
        let store = TaskStore::new();
        let orch = orchestrator(
            &store,
            Some(Arc::new(StaticEnricher {
                subtasks: vec!["A", "B", "C"],
            })),
            Arc::new(DisabledEventPublisher),
        );

        let task = orch
            .create_task("Fix login bug", "desc", TaskPriority::High)
            .await
            .expect("Failed to create task");

        let subtasks = store.list_subtasks(task.id).await;
        assert_eq!(subtasks.len(), SUBTASKS_PER_TASK);
        assert!(subtasks.iter().all(|s| s.status == TaskStatus::Pending));
    }

    #[tokio::test]
    async fn test_short_enrichment_is_padded() {
        let store = TaskStore::new();
        let orch = orchestrator(
            &store,
            Some(Arc::new(StaticEnricher {
                subtasks: vec!["A", "B"],
            })),
            Arc::new(DisabledEventPublisher),
        );

        let task = orch
            .create_task("Task", "", TaskPriority::Medium)
            .await
            .expect("Failed to create task");

        let titles: Vec<String> = store
            .list_subtasks(task.id)
            .await
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "Additional subtask 3"]);
    }

    #[tokio::test]
    async fn test_long_enrichment_is_truncated() {
        let store = TaskStore::new();
        let orch = orchestrator(
            &store,
            Some(Arc::new(StaticEnricher {
                subtasks: vec!["A", "B", "C", "D", "E"],
            })),
            Arc::new(DisabledEventPublisher),
        );

        let task = orch
            .create_task("Task", "", TaskPriority::Medium)
            .await
            .expect("Failed to create task");

        let titles: Vec<String> = store
            .list_subtasks(task.id)
            .await
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_enrichment_failure_leaves_task_without_subtasks() {
        let store = TaskStore::new();
        let orch = orchestrator(
            &store,
            Some(Arc::new(FailingEnricher)),
            Arc::new(DisabledEventPublisher),
        );

        let task = orch
            .create_task("Task", "", TaskPriority::Low)
            .await
            .expect("Enrichment failure must not fail creation");

        assert!(store.get_task(task.id).await.is_some());
        assert!(store.list_subtasks(task.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_no_enricher_means_no_subtasks() {
        let store = TaskStore::new();
        let orch = orchestrator(&store, None, Arc::new(DisabledEventPublisher));

        let task = orch
            .create_task("Task", "", TaskPriority::Low)
            .await
            .expect("Failed to create task");
        assert!(store.list_subtasks(task.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_delete_during_enrichment_is_swallowed() {
        let store = TaskStore::new();
        let orch = orchestrator(
            &store,
            Some(Arc::new(DeletingEnricher {
                store: store.clone(),
            })),
            Arc::new(DisabledEventPublisher),
        );

        let task = orch
            .create_task("Task", "", TaskPriority::Medium)
            .await
            .expect("Vanished parent must not fail creation");

        assert!(store.get_task(task.id).await.is_none());
        assert!(store.list_subtasks(task.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_event_published_with_task_fields() {
        let store = TaskStore::new();
        let publisher = Arc::new(RecordingPublisher::default());
        let orch = orchestrator(&store, None, publisher.clone());

        let task = orch
            .create_task("Fix login bug", "desc", TaskPriority::High)
            .await
            .expect("Failed to create task");

        let events = publisher.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, TASK_CREATED);
        assert_eq!(events[0].task_id, task.id);
        assert_eq!(events[0].data["title"], "Fix login bug");
        assert_eq!(events[0].data["priority"], "high");
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_creation() {
        let store = TaskStore::new();
        let orch = orchestrator(&store, None, Arc::new(FailingPublisher));

        let task = orch
            .create_task("Task", "", TaskPriority::Low)
            .await
            .expect("Publish failure must not fail creation");
        assert!(store.get_task(task.id).await.is_some());
    }
}
