//! AI enrichment of newly created tasks.
//!
//! Given a task's fields, a configured model proposes a one-line summary, a
//! category label, and a set of subtask titles. The adapter contract is
//! strict about failure: implementations translate every upstream problem -
//! network errors, non-2xx statuses, responses that don't match the expected
//! shape - into an [`EnrichmentError`]. Nothing from this module may panic
//! into the task creation path.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::store::Task;

/// Result of a successful enrichment call.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskEnrichment {
    /// One-sentence restatement of the task
    pub summary: String,

    /// Proposed subtask titles; the orchestrator normalizes the count
    #[serde(alias = "sub_tasks")]
    pub subtasks: Vec<String>,

    /// Free-form category label, e.g. "Bug Fix"
    pub category: String,
}

/// Errors from enrichment calls.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("enrichment request failed: {0}")]
    Network(String),

    #[error("enrichment service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed enrichment response: {0}")]
    Malformed(String),
}

/// Trait for enrichment backends.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Propose enrichment for a freshly created task.
    async fn enrich(&self, task: &Task) -> Result<TaskEnrichment, EnrichmentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrichment_accepts_both_subtask_field_names() {
        let snake: TaskEnrichment = serde_json::from_str(
            r#"{"summary": "s", "sub_tasks": ["a", "b"], "category": "Bug Fix"}"#,
        )
        .expect("Failed to parse sub_tasks form");
        assert_eq!(snake.subtasks, vec!["a", "b"]);

        let plain: TaskEnrichment = serde_json::from_str(
            r#"{"summary": "s", "subtasks": ["a"], "category": "Feature"}"#,
        )
        .expect("Failed to parse subtasks form");
        assert_eq!(plain.subtasks, vec!["a"]);
    }

    #[test]
    fn test_enrichment_rejects_missing_fields() {
        let result: Result<TaskEnrichment, _> =
            serde_json::from_str(r#"{"summary": "s", "category": "Bug Fix"}"#);
        assert!(result.is_err());
    }
}
