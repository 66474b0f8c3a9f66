//! Queue-backed publisher for a Kafka/Redpanda REST proxy.
//!
//! `publish` hands the event to a background delivery worker over an
//! unbounded channel and returns immediately. The worker posts one record
//! per event to the proxy's topic endpoint, keyed by task id so every event
//! for a task lands in the same partition, and logs a delivery report
//! either way. `flush` rides the channel's FIFO ordering: a drain marker is
//! acknowledged only after everything enqueued before it was attempted.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::{mpsc, oneshot};

use super::{EventPublisher, PublishError, TaskEvent};

/// Per-record delivery deadline; a hung proxy must not wedge the worker.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

enum WorkerMessage {
    Deliver(TaskEvent),
    Drain(oneshot::Sender<()>),
}

/// Publishes task events to a REST proxy topic endpoint.
pub struct HttpEventPublisher {
    queue: mpsc::UnboundedSender<WorkerMessage>,
}

impl HttpEventPublisher {
    /// Spawn the delivery worker and return the sending handle.
    pub fn new(proxy_url: String, topic: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(delivery_worker(rx, proxy_url, topic));
        Self { queue: tx }
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish(&self, event: TaskEvent) -> Result<(), PublishError> {
        self.queue
            .send(WorkerMessage::Deliver(event))
            .map_err(|_| PublishError::QueueClosed)
    }

    async fn flush(&self, timeout: Duration) -> Result<(), PublishError> {
        let (tx, rx) = oneshot::channel();
        self.queue
            .send(WorkerMessage::Drain(tx))
            .map_err(|_| PublishError::QueueClosed)?;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(PublishError::QueueClosed),
            Err(_) => Err(PublishError::FlushTimeout(timeout)),
        }
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

async fn delivery_worker(
    mut rx: mpsc::UnboundedReceiver<WorkerMessage>,
    proxy_url: String,
    topic: String,
) {
    let client = Client::new();
    let url = format!("{}/topics/{}", proxy_url.trim_end_matches('/'), topic);

    while let Some(message) = rx.recv().await {
        match message {
            WorkerMessage::Deliver(event) => deliver(&client, &url, &topic, event).await,
            WorkerMessage::Drain(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

/// Attempt delivery of a single event and log the delivery report.
async fn deliver(client: &Client, url: &str, topic: &str, event: TaskEvent) {
    let body = serde_json::json!({
        "records": [{ "key": event.task_id, "value": &event }]
    });

    let result = client
        .post(url)
        .header("Content-Type", "application/vnd.kafka.json.v2+json")
        .json(&body)
        .timeout(DELIVERY_TIMEOUT)
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => {
            tracing::debug!(
                "Published {} event for task {} to {}",
                event.event_type,
                event.task_id,
                topic
            );
        }
        Ok(response) => {
            tracing::warn!(
                "Event delivery failed: {} returned HTTP {}",
                url,
                response.status()
            );
        }
        Err(e) => {
            tracing::warn!("Event delivery failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Task, TaskPriority, TaskStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_event() -> TaskEvent {
        let now = Utc::now();
        TaskEvent::task_created(&Task {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: String::new(),
            priority: TaskPriority::Low,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Delivery failures must stay inside the worker: publish and flush
    /// both succeed even when nothing is listening at the proxy address.
    #[tokio::test]
    async fn test_unreachable_proxy_does_not_surface_errors() {
        let publisher =
            HttpEventPublisher::new("http://127.0.0.1:9".to_string(), "tasks-topic".to_string());

        publisher
            .publish(sample_event())
            .await
            .expect("publish should enqueue regardless of bus health");

        publisher
            .flush(Duration::from_secs(10))
            .await
            .expect("flush should complete after the failed attempt");
    }

    #[tokio::test]
    async fn test_flush_drains_in_order() {
        let publisher =
            HttpEventPublisher::new("http://127.0.0.1:9".to_string(), "tasks-topic".to_string());

        for _ in 0..5 {
            publisher
                .publish(sample_event())
                .await
                .expect("publish should enqueue");
        }

        publisher
            .flush(Duration::from_secs(30))
            .await
            .expect("flush should drain the whole queue");
    }
}
