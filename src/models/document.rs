//! Attached documents and user notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// The kind of record a document or notification points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A project.
    Project,
    /// A contract.
    Contract,
    /// A work progress report.
    WorkProgress,
    /// A payment.
    Payment,
    /// A procurement plan line.
    ProcurementPlan,
    /// A project task.
    ProjectTask,
}

/// Metadata of a file attached to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Kind of record the file is attached to.
    pub entity_type: EntityKind,
    /// Identifier of that record.
    pub entity_id: i64,
    /// Display title.
    pub title: String,
    /// Original file name.
    pub file_name: String,
    /// Storage location of the file.
    pub file_path: String,
    /// MIME type.
    #[serde(default)]
    pub content_type: Option<String>,
    /// File size.
    #[serde(default)]
    pub size_bytes: i64,
    /// Uploading user (stamped by the server).
    #[serde(default)]
    pub uploaded_by: Option<i64>,
    /// Upload time (stamped by the server).
    #[serde(default = "Utc::now")]
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.file_name.trim().is_empty() {
            return Err(AppError::validation("document", "file_name", "must not be empty"));
        }
        if self.file_path.trim().is_empty() {
            return Err(AppError::validation("document", "file_path", "must not be empty"));
        }
        if self.size_bytes < 0 {
            return Err(AppError::validation("document", "size_bytes", "must not be negative"));
        }
        Ok(())
    }
}

/// A message addressed to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Row identifier.
    #[serde(default)]
    pub id: i64,
    /// Recipient.
    pub user_id: i64,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Kind of record the message is about.
    #[serde(default)]
    pub entity_type: Option<EntityKind>,
    /// Identifier of that record.
    #[serde(default)]
    pub entity_id: Option<i64>,
    /// Whether the recipient has read it.
    #[serde(default)]
    pub is_read: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Earliest time the notification is shown.
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl Notification {
    /// Builds an unread notification about a record, visible immediately.
    pub fn about(
        user_id: i64,
        title: impl Into<String>,
        message: impl Into<String>,
        entity_type: EntityKind,
        entity_id: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            user_id,
            title: title.into(),
            message: message.into(),
            entity_type: Some(entity_type),
            entity_id: Some(entity_id),
            is_read: false,
            created_at: now,
            scheduled_for: None,
        }
    }

    /// Whether the notification may be shown at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_for.is_none_or(|at| at <= now)
    }
}
