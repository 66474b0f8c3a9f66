//! Task storage module.
//!
//! Holds the task/subtask data model and the in-memory store. The store is
//! the only component allowed to mutate persisted records; everything else
//! receives copies.

mod memory;

pub use memory::TaskStore;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Number of subtasks attached to a task when enrichment succeeds.
///
/// A task has either zero subtasks or exactly this many; partial sets are
/// never persisted.
pub const SUBTASKS_PER_TASK: usize = 3;

/// Task priority, fixed at creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::High => write!(f, "high"),
        }
    }
}

impl FromStr for TaskPriority {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(StoreError::InvalidArgument(format!(
                "unknown priority '{}'",
                other
            ))),
        }
    }
}

/// Task and subtask status.
///
/// Any status can be set from any prior state; there is no transition
/// graph at this layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(StoreError::InvalidArgument(format!(
                "unknown status '{}'",
                other
            ))),
        }
    }
}

/// A task record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Immutable after creation
    pub priority: TaskPriority,
    /// Starts at `pending`; mutable via the status-update operation only
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation; never earlier than `created_at`
    pub updated_at: DateTime<Utc>,
}

/// A subtask record.
///
/// Lifecycle is tied to the parent task: deleting the task removes its
/// subtasks in the same operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Uuid,
    pub parent_task_id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Referenced task id does not exist.
    #[error("Task with id '{0}' not found")]
    TaskNotFound(Uuid),

    /// Referenced subtask id does not exist under the given parent.
    #[error("Subtask with id '{0}' not found")]
    SubtaskNotFound(Uuid),

    /// Malformed input, e.g. wrong subtask count.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unexpected store fault.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether this error refers to an absent record.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::TaskNotFound(_) | StoreError::SubtaskNotFound(_)
        )
    }
}
