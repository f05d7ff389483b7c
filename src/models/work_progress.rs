//! Work progress reports (AVR, acts of completed works) and their approval status.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::check_magnitude;

/// Approval status of a work progress report.
///
/// The discriminants are the persisted values.
///
/// # Example
///
/// ```
/// use pmmis::models::ApprovalStatus;
///
/// assert_eq!(ApprovalStatus::ManagerApproved.as_i64(), 2);
/// assert_eq!(ApprovalStatus::from_i64(4), Some(ApprovalStatus::Rejected));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Being prepared by the curator.
    #[default]
    Draft = 0,
    /// Waiting for the manager's review.
    SubmittedForReview = 1,
    /// Approved by the manager, waiting for the director.
    ManagerApproved = 2,
    /// Finally approved; counts toward indicators and payments.
    DirectorApproved = 3,
    /// Returned to the curator.
    Rejected = 4,
}

impl ApprovalStatus {
    /// Every status, in persisted order.
    pub const ALL: [ApprovalStatus; 5] = [
        ApprovalStatus::Draft,
        ApprovalStatus::SubmittedForReview,
        ApprovalStatus::ManagerApproved,
        ApprovalStatus::DirectorApproved,
        ApprovalStatus::Rejected,
    ];

    /// The persisted integer value.
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    /// Parses a persisted integer value.
    pub fn from_i64(value: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_i64() == value)
    }

    /// Snake-case label used in messages and reports.
    pub fn label(self) -> &'static str {
        match self {
            ApprovalStatus::Draft => "draft",
            ApprovalStatus::SubmittedForReview => "submitted_for_review",
            ApprovalStatus::ManagerApproved => "manager_approved",
            ApprovalStatus::DirectorApproved => "director_approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    /// Whether report fields may still be changed.
    pub fn is_editable(self) -> bool {
        matches!(self, ApprovalStatus::Draft | ApprovalStatus::Rejected)
    }

    /// Whether the report has left the review pipeline.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ApprovalStatus::DirectorApproved | ApprovalStatus::Rejected
        )
    }
}

/// A workflow action that moves a report between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    /// Curator sends the draft for review.
    Submit,
    /// Manager accepts the submitted report.
    ManagerApprove,
    /// Director gives final approval.
    DirectorApprove,
    /// A reviewer returns the report.
    Reject,
    /// Curator reopens a rejected report as a draft.
    Revise,
}

impl ApprovalAction {
    /// Snake-case label used in messages and routes.
    pub fn label(self) -> &'static str {
        match self {
            ApprovalAction::Submit => "submit",
            ApprovalAction::ManagerApprove => "manager_approve",
            ApprovalAction::DirectorApprove => "director_approve",
            ApprovalAction::Reject => "reject",
            ApprovalAction::Revise => "revise",
        }
    }
}

/// A work progress report submitted under a contract.
///
/// The approval fields are stamped by the workflow and ignored when a client
/// creates or edits a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkProgress {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Contract the works belong to.
    pub contract_id: i64,
    /// Report number as issued by the contractor.
    pub report_number: String,
    /// Date of the report.
    pub report_date: NaiveDate,
    /// First day of the reporting period.
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    /// Last day of the reporting period.
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    /// Cumulative physical progress in percent.
    pub progress_percent: Decimal,
    /// Value of the works completed in the period.
    #[serde(default)]
    pub completed_amount: Decimal,
    /// Narrative of the works.
    #[serde(default)]
    pub description: Option<String>,
    /// Current approval status.
    #[serde(default)]
    pub approval_status: ApprovalStatus,
    /// User who created the report.
    #[serde(default)]
    pub created_by: Option<i64>,
    /// Creation time.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Curator who submitted the report.
    #[serde(default)]
    pub submitted_by: Option<i64>,
    /// Submission time.
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Curator's note on submission.
    #[serde(default)]
    pub submission_comment: Option<String>,
    /// Manager who approved the report.
    #[serde(default)]
    pub manager_id: Option<i64>,
    /// Manager approval time.
    #[serde(default)]
    pub manager_approved_at: Option<DateTime<Utc>>,
    /// Manager's note.
    #[serde(default)]
    pub manager_comment: Option<String>,
    /// Director who approved the report.
    #[serde(default)]
    pub director_id: Option<i64>,
    /// Director approval time.
    #[serde(default)]
    pub director_approved_at: Option<DateTime<Utc>>,
    /// Director's note.
    #[serde(default)]
    pub director_comment: Option<String>,
    /// Reviewer who rejected the report.
    #[serde(default)]
    pub rejected_by: Option<i64>,
    /// Rejection time.
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
    /// Why the report was rejected.
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl WorkProgress {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.report_number.trim().is_empty() {
            return Err(AppError::validation(
                "work progress",
                "report_number",
                "must not be empty",
            ));
        }
        if self.progress_percent < Decimal::ZERO || self.progress_percent > Decimal::ONE_HUNDRED {
            return Err(AppError::validation(
                "work progress",
                "progress_percent",
                "must be between 0 and 100",
            ));
        }
        if self.completed_amount < Decimal::ZERO {
            return Err(AppError::validation(
                "work progress",
                "completed_amount",
                "must not be negative",
            ));
        }
        check_magnitude("work progress", "completed_amount", self.completed_amount)?;
        if let (Some(start), Some(end)) = (self.period_start, self.period_end) {
            if end < start {
                return Err(AppError::validation(
                    "work progress",
                    "period_end",
                    "must not be before period_start",
                ));
            }
        }
        Ok(())
    }

    /// Resets every workflow field to a fresh draft.
    pub fn reset_workflow(&mut self) {
        self.approval_status = ApprovalStatus::Draft;
        self.clear_review_stamps();
        self.rejected_by = None;
        self.rejected_at = None;
        self.rejection_reason = None;
    }

    /// Clears submission and approval stamps, keeping the rejection note.
    pub fn clear_review_stamps(&mut self) {
        self.submitted_by = None;
        self.submitted_at = None;
        self.submission_comment = None;
        self.manager_id = None;
        self.manager_approved_at = None;
        self.manager_comment = None;
        self.director_id = None;
        self.director_approved_at = None;
        self.director_comment = None;
    }

    /// Copies every workflow field from `other`.
    pub fn copy_workflow_from(&mut self, other: &WorkProgress) {
        self.approval_status = other.approval_status;
        self.created_by = other.created_by;
        self.created_at = other.created_at;
        self.submitted_by = other.submitted_by;
        self.submitted_at = other.submitted_at;
        self.submission_comment = other.submission_comment.clone();
        self.manager_id = other.manager_id;
        self.manager_approved_at = other.manager_approved_at;
        self.manager_comment = other.manager_comment.clone();
        self.director_id = other.director_id;
        self.director_approved_at = other.director_approved_at;
        self.director_comment = other.director_comment.clone();
        self.rejected_by = other.rejected_by;
        self.rejected_at = other.rejected_at;
        self.rejection_reason = other.rejection_reason.clone();
    }
}

/// One recorded workflow transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalHistoryEntry {
    /// Row identifier.
    #[serde(default)]
    pub id: i64,
    /// Report that moved.
    pub work_progress_id: i64,
    /// Action performed.
    pub action: ApprovalAction,
    /// Status before the action.
    pub from_status: ApprovalStatus,
    /// Status after the action.
    pub to_status: ApprovalStatus,
    /// User who performed the action.
    pub actor_id: Option<i64>,
    /// Comment given with the action.
    pub comment: Option<String>,
    /// When the action happened.
    pub occurred_at: DateTime<Utc>,
}
