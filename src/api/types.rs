//! API request and response types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::store::{TaskPriority, TaskStatus};

/// Maximum accepted title length, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum accepted description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Request to create a new task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,

    pub description: String,

    pub priority: TaskPriority,
}

impl CreateTaskRequest {
    /// Field bounds, checked before the store sees the input.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(format!("title must be at most {} characters", MAX_TITLE_LEN));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(format!(
                "description must be at most {} characters",
                MAX_DESCRIPTION_LEN
            ));
        }
        Ok(())
    }
}

/// Request to update a task's or subtask's status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

/// Query filters for task listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<TaskStatus>,
}

/// Treats `?priority=` the same as an absent filter.
fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when the event bus is unavailable
    pub status: String,

    /// Service name
    pub service: String,

    /// Service version
    pub version: String,

    /// Per-dependency status
    pub checks: HealthChecks,
}

/// Per-dependency health status.
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub api: String,
    pub events: String,
    pub enrichment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, description: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: description.to_string(),
            priority: TaskPriority::Medium,
        }
    }

    #[test]
    fn test_validate_accepts_bounds() {
        assert!(request("Fix login bug", "desc").validate().is_ok());
        assert!(request(&"x".repeat(MAX_TITLE_LEN), &"y".repeat(MAX_DESCRIPTION_LEN))
            .validate()
            .is_ok());
        assert!(request("t", "").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_title() {
        assert!(request("", "desc").validate().is_err());
        assert!(request("   ", "desc").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_fields() {
        assert!(request(&"x".repeat(MAX_TITLE_LEN + 1), "").validate().is_err());
        assert!(request("t", &"y".repeat(MAX_DESCRIPTION_LEN + 1))
            .validate()
            .is_err());
    }
}
