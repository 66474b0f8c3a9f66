//! In-memory task store (non-persistent).

use super::{StoreError, Subtask, Task, TaskPriority, TaskStatus, SUBTASKS_PER_TASK};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Record set guarded by a single lock. Every operation takes the lock for
/// its full duration, so readers never observe a task without its complete
/// subtask set or a half-applied delete.
#[derive(Default)]
struct StoreInner {
    tasks: HashMap<Uuid, Task>,
    /// Creation order of live task ids, for stable listing
    order: Vec<Uuid>,
    subtasks: HashMap<Uuid, Vec<Subtask>>,
}

/// Cloneable handle to the shared record set.
///
/// Each operation acquires and releases the lock internally; callers never
/// hold it across an `.await` on external I/O.
#[derive(Clone, Default)]
pub struct TaskStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new task with a fresh id and `pending` status.
    pub async fn create_task(
        &self,
        title: &str,
        description: &str,
        priority: TaskPriority,
    ) -> Result<Task, StoreError> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            priority,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let mut inner = self.inner.write().await;
        inner.order.push(task.id);
        inner.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    pub async fn get_task(&self, id: Uuid) -> Option<Task> {
        self.inner.read().await.tasks.get(&id).cloned()
    }

    /// List tasks in insertion order, optionally filtered by priority
    /// and/or status equality.
    pub async fn list_tasks(
        &self,
        priority: Option<TaskPriority>,
        status: Option<TaskStatus>,
    ) -> Vec<Task> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.tasks.get(id))
            .filter(|task| priority.map_or(true, |p| task.priority == p))
            .filter(|task| status.map_or(true, |s| task.status == s))
            .cloned()
            .collect()
    }

    /// Set a task's status and refresh `updated_at`.
    ///
    /// Any status value is accepted from any prior state.
    pub async fn update_task_status(
        &self,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .get_mut(&id)
            .ok_or(StoreError::TaskNotFound(id))?;
        task.status = status;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    /// Remove a task and all of its subtasks. Returns whether a task existed.
    pub async fn delete_task(&self, id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        let removed = inner.tasks.remove(&id).is_some();
        if removed {
            inner.order.retain(|task_id| *task_id != id);
            inner.subtasks.remove(&id);
        }
        removed
    }

    /// Attach exactly [`SUBTASKS_PER_TASK`] subtasks to an existing task,
    /// replacing any prior set for that parent.
    pub async fn create_subtasks(
        &self,
        parent_id: Uuid,
        titles: &[String],
    ) -> Result<Vec<Subtask>, StoreError> {
        if titles.len() != SUBTASKS_PER_TASK {
            return Err(StoreError::InvalidArgument(format!(
                "expected {} subtask titles, got {}",
                SUBTASKS_PER_TASK,
                titles.len()
            )));
        }
        if titles.iter().any(|title| title.trim().is_empty()) {
            return Err(StoreError::InvalidArgument(
                "subtask titles must be non-empty".to_string(),
            ));
        }

        let mut inner = self.inner.write().await;
        if !inner.tasks.contains_key(&parent_id) {
            return Err(StoreError::TaskNotFound(parent_id));
        }

        let now = Utc::now();
        let subtasks: Vec<Subtask> = titles
            .iter()
            .map(|title| Subtask {
                id: Uuid::new_v4(),
                parent_task_id: parent_id,
                title: title.clone(),
                status: TaskStatus::Pending,
                created_at: now,
                updated_at: now,
            })
            .collect();
        inner.subtasks.insert(parent_id, subtasks.clone());
        Ok(subtasks)
    }

    /// List a task's subtasks. Unknown parents yield an empty list, not an
    /// error.
    pub async fn list_subtasks(&self, parent_id: Uuid) -> Vec<Subtask> {
        self.inner
            .read()
            .await
            .subtasks
            .get(&parent_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn get_subtask(&self, parent_id: Uuid, subtask_id: Uuid) -> Option<Subtask> {
        self.inner
            .read()
            .await
            .subtasks
            .get(&parent_id)
            .and_then(|subtasks| subtasks.iter().find(|s| s.id == subtask_id))
            .cloned()
    }

    /// Set a subtask's status and refresh its `updated_at`.
    pub async fn update_subtask_status(
        &self,
        parent_id: Uuid,
        subtask_id: Uuid,
        status: TaskStatus,
    ) -> Result<Subtask, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.tasks.contains_key(&parent_id) {
            return Err(StoreError::TaskNotFound(parent_id));
        }
        let subtask = inner
            .subtasks
            .get_mut(&parent_id)
            .and_then(|subtasks| subtasks.iter_mut().find(|s| s.id == subtask_id))
            .ok_or(StoreError::SubtaskNotFound(subtask_id))?;
        subtask.status = status;
        subtask.updated_at = Utc::now();
        Ok(subtask.clone())
    }
}
