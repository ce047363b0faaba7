use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;
use crate::models::Category;
use crate::validation::{field_messages, push_message, FieldErrors};

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// High priority.
    High,
    /// Medium priority. Used when a request omits the priority.
    #[default]
    Medium,
    /// Low priority.
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a priority name, ignoring ASCII case.
impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "high" => Ok(TaskPriority::High),
            "medium" => Ok(TaskPriority::Medium),
            "low" => Ok(TaskPriority::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// Represents a task entity as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Task {
    pub id: i64,
    /// Unique per owner.
    pub title: String,
    pub priority: TaskPriority,
    /// `true` once the task is completed.
    pub status: bool,
    pub category_id: i64,
    /// Identifier of the user who owns the task.
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task joined with its category, as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskWithCategory {
    #[serde(flatten)]
    pub task: Task,
    pub category: Category,
}

/// Input structure for creating or updating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TaskRequest {
    /// The title of the task.
    /// Must be between 1 and 255 characters.
    #[validate(
        required(message = "Title is required"),
        length(min = 1, max = 255, message = "Title must be between 1 and 255 characters")
    )]
    pub title: Option<String>,

    /// One of `high`, `medium`, `low`. Defaults to `medium` when omitted.
    #[validate(custom = "crate::validation::validate_priority")]
    pub priority: Option<String>,

    /// Identifier of an existing category.
    #[validate(required(message = "Category is required"))]
    pub category_id: Option<i64>,
}

/// A `TaskRequest` that passed its field rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub priority: TaskPriority,
    pub category_id: i64,
}

impl TaskRequest {
    /// Evaluates the declared rules and normalizes the payload.
    pub fn into_draft(self) -> Result<TaskDraft, FieldErrors> {
        if let Err(errors) = self.validate() {
            return Err(field_messages(&errors));
        }

        let priority = self
            .priority
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or_default();

        let Some(title) = self.title else {
            return Err(missing("title", "Title is required"));
        };
        let Some(category_id) = self.category_id else {
            return Err(missing("category_id", "Category is required"));
        };

        Ok(TaskDraft {
            title,
            priority,
            category_id,
        })
    }
}

fn missing(field: &str, message: &str) -> FieldErrors {
    let mut fields = FieldErrors::new();
    push_message(&mut fields, field, message);
    fields
}

impl TaskDraft {
    /// True when applying the draft would leave the task untouched.
    pub fn matches(&self, task: &Task) -> bool {
        self.title == task.title
            && self.priority == task.priority
            && self.category_id == task.category_id
    }
}

/// Row values for a task about to be inserted.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: i64,
    pub title: String,
    pub priority: TaskPriority,
    pub category_id: i64,
}

impl NewTask {
    pub fn from_draft(owner: i64, draft: TaskDraft) -> Self {
        Self {
            user_id: owner,
            title: draft.title,
            priority: draft.priority,
            category_id: draft.category_id,
        }
    }
}

/// Raw list query parameters, exactly as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    #[serde(rename = "categoryId")]
    pub category_id: Option<String>,
    /// `true` or `false`.
    pub status: Option<String>,
    /// `high`, `medium` or `low`, any case.
    pub priority: Option<String>,
}

/// Parsed list filters. Every present filter must match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilters {
    pub category_id: Option<i64>,
    pub status: Option<bool>,
    pub priority: Option<TaskPriority>,
}

impl TaskQuery {
    /// Parses every supplied filter. An empty value counts as not supplied.
    ///
    /// # Errors
    /// `AppError::InvalidFilter` naming the first filter that does not parse.
    pub fn parse(&self) -> Result<TaskFilters, AppError> {
        let category_id = match supplied(&self.category_id) {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| AppError::InvalidFilter(format!("categoryId '{}'", raw)))?,
            ),
            None => None,
        };

        let status = match supplied(&self.status) {
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(raw) => return Err(AppError::InvalidFilter(format!("status '{}'", raw))),
            None => None,
        };

        let priority = match supplied(&self.priority) {
            Some(raw) => Some(
                raw.parse::<TaskPriority>()
                    .map_err(|_| AppError::InvalidFilter(format!("priority '{}'", raw)))?,
            ),
            None => None,
        };

        Ok(TaskFilters {
            category_id,
            status,
            priority,
        })
    }
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl TaskFilters {
    pub fn matches(&self, task: &Task) -> bool {
        self.category_id.map_or(true, |id| task.category_id == id)
            && self.status.map_or(true, |status| task.status == status)
            && self.priority.map_or(true, |priority| task.priority == priority)
    }
}
