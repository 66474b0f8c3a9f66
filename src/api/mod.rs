//! HTTP API for the task manager.
//!
//! ## Endpoints
//!
//! - `POST /tasks` - Create a task (enriched with subtasks when configured)
//! - `GET /tasks` - List tasks with optional priority/status filters
//! - `GET /tasks/{id}` - Get a task
//! - `PUT /tasks/{id}` - Update a task's status
//! - `DELETE /tasks/{id}` - Delete a task and its subtasks
//! - `GET /tasks/{id}/subtasks` - List a task's subtasks
//! - `GET /tasks/{id}/subtasks/{subtask_id}` - Get a subtask
//! - `PUT /tasks/{id}/subtasks/{subtask_id}` - Update a subtask's status
//! - `GET /health` - Health check with dependency status

mod routes;
pub mod types;

pub use routes::{serve, AppState};
pub use types::*;
