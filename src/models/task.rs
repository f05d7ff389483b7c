//! Project tasks with comments and checklists.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Status of a project task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet started.
    #[default]
    NotStarted,
    /// Being worked on.
    InProgress,
    /// Done.
    Completed,
    /// Dropped.
    Cancelled,
}

/// Priority of a project task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low.
    Low,
    /// Medium.
    #[default]
    Medium,
    /// High.
    High,
    /// Critical.
    Critical,
}

/// A task assigned within a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTask {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Owning project.
    pub project_id: i64,
    /// Task title.
    pub title: String,
    /// Details.
    #[serde(default)]
    pub description: Option<String>,
    /// Responsible user.
    #[serde(default)]
    pub assignee_id: Option<i64>,
    /// Planned start.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Deadline.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Priority.
    #[serde(default)]
    pub priority: TaskPriority,
    /// Completion in percent.
    #[serde(default)]
    pub progress_percent: Decimal,
}

impl ProjectTask {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("task", "title", "must not be empty"));
        }
        if self.progress_percent < Decimal::ZERO || self.progress_percent > Decimal::ONE_HUNDRED {
            return Err(AppError::validation(
                "task",
                "progress_percent",
                "must be between 0 and 100",
            ));
        }
        if let (Some(start), Some(due)) = (self.start_date, self.due_date) {
            if due < start {
                return Err(AppError::validation(
                    "task",
                    "due_date",
                    "must not be before start_date",
                ));
            }
        }
        Ok(())
    }

    /// Whether the task is past its deadline and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.status, TaskStatus::NotStarted | TaskStatus::InProgress)
            && self.due_date.is_some_and(|due| due < today)
    }
}

/// A comment on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskComment {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Commented task.
    pub task_id: i64,
    /// Author (stamped by the server).
    #[serde(default)]
    pub author_id: Option<i64>,
    /// Comment text.
    pub body: String,
    /// Creation time (stamped by the server).
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// One step of a task checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskChecklistItem {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Owning task.
    pub task_id: i64,
    /// Step title.
    pub title: String,
    /// Whether the step is done.
    #[serde(default)]
    pub is_done: bool,
    /// Display order.
    #[serde(default)]
    pub position: i64,
}
