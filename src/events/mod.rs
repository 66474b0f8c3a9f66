//! Task lifecycle event emission.
//!
//! Publishing is fire-and-forget: `publish` enqueues and returns, delivery
//! happens off the request path, and delivery failures surface in logs
//! only. `flush` gives shutdown (or anything else that cares) a bounded
//! wait for the queue to drain.

mod http;

pub use http::HttpEventPublisher;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::store::Task;

/// Event type emitted after a successful task creation.
pub const TASK_CREATED: &str = "task.created";

/// Envelope published to the bus for a task lifecycle change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvent {
    pub event_type: String,
    pub task_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl TaskEvent {
    /// Build the `task.created` event for a freshly stored task.
    pub fn task_created(task: &Task) -> Self {
        Self {
            event_type: TASK_CREATED.to_string(),
            task_id: task.id,
            timestamp: Utc::now(),
            data: serde_json::json!({
                "title": task.title,
                "description": task.description,
                "priority": task.priority,
                "status": task.status,
            }),
        }
    }
}

/// Errors from the publishing side of the pipeline. Delivery failures are
/// not represented here; they are reported asynchronously via logs.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("event queue is closed")]
    QueueClosed,

    #[error("flush timed out after {0:?}")]
    FlushTimeout(Duration),
}

/// Trait for event publishers.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Enqueue an event for delivery. Must not block on the bus.
    async fn publish(&self, event: TaskEvent) -> Result<(), PublishError>;

    /// Wait until previously enqueued events have been handed to the bus,
    /// up to `timeout`.
    async fn flush(&self, timeout: Duration) -> Result<(), PublishError>;

    /// Whether this publisher actually reaches a bus.
    fn is_enabled(&self) -> bool;
}

/// Log-only publisher for deployments without a configured bus.
pub struct DisabledEventPublisher;

#[async_trait]
impl EventPublisher for DisabledEventPublisher {
    async fn publish(&self, event: TaskEvent) -> Result<(), PublishError> {
        tracing::debug!(
            "event bus disabled: {} event for task {} not published",
            event.event_type,
            event.task_id
        );
        Ok(())
    }

    async fn flush(&self, _timeout: Duration) -> Result<(), PublishError> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{TaskPriority, TaskStatus};

    fn sample_task() -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "Fix login bug".to_string(),
            description: "desc".to_string(),
            priority: TaskPriority::High,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_task_created_event_payload() {
        let task = sample_task();
        let event = TaskEvent::task_created(&task);

        assert_eq!(event.event_type, TASK_CREATED);
        assert_eq!(event.task_id, task.id);
        assert_eq!(event.data["title"], "Fix login bug");
        assert_eq!(event.data["priority"], "high");
        assert_eq!(event.data["status"], "pending");
    }

    #[tokio::test]
    async fn test_disabled_publisher_accepts_everything() {
        let publisher = DisabledEventPublisher;
        assert!(!publisher.is_enabled());
        publisher
            .publish(TaskEvent::task_created(&sample_task()))
            .await
            .expect("Disabled publisher should accept events");
        publisher
            .flush(Duration::from_secs(1))
            .await
            .expect("Disabled publisher flush should be a no-op");
    }
}
