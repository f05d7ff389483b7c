//! Who hears about a transition, and what they are told.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::error::AppResult;
use crate::models::{
    ApprovalAction, Contract, EntityKind, Notification, RoleKind, WorkProgress,
};

/// Users to notify about `action`, without the actor.
///
/// Called before the transition stamps `report`.
pub fn recipients(
    conn: &Connection,
    action: ApprovalAction,
    report: &WorkProgress,
    contract: &Contract,
    actor_id: i64,
) -> AppResult<Vec<i64>> {
    let mut ids: Vec<i64> = match action {
        ApprovalAction::Submit => queries::active_users_with_role_kind(conn, RoleKind::Manager)?
            .into_iter()
            .map(|u| u.id)
            .collect(),
        ApprovalAction::ManagerApprove => {
            queries::active_users_with_role_kind(conn, RoleKind::Director)?
                .into_iter()
                .map(|u| u.id)
                .collect()
        }
        ApprovalAction::DirectorApprove | ApprovalAction::Reject => {
            [report.created_by, contract.curator_id]
                .into_iter()
                .flatten()
                .collect()
        }
        ApprovalAction::Revise => report.rejected_by.into_iter().collect(),
    };
    ids.retain(|id| *id != actor_id);
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// The notification sent to `user_id` about `action`.
pub fn message(
    user_id: i64,
    action: ApprovalAction,
    report: &WorkProgress,
    contract: &Contract,
    now: DateTime<Utc>,
) -> Notification {
    let (title, text) = match action {
        ApprovalAction::Submit => (
            "Work progress awaiting review",
            format!(
                "Report {} on contract {} was submitted for review.",
                report.report_number, contract.number
            ),
        ),
        ApprovalAction::ManagerApprove => (
            "Work progress awaiting final approval",
            format!(
                "Report {} on contract {} was approved by the manager.",
                report.report_number, contract.number
            ),
        ),
        ApprovalAction::DirectorApprove => (
            "Work progress approved",
            format!(
                "Report {} on contract {} received final approval.",
                report.report_number, contract.number
            ),
        ),
        ApprovalAction::Reject => (
            "Work progress rejected",
            format!(
                "Report {} on contract {} was rejected: {}",
                report.report_number,
                contract.number,
                report.rejection_reason.as_deref().unwrap_or("")
            ),
        ),
        ApprovalAction::Revise => (
            "Work progress reopened",
            format!(
                "Report {} on contract {} you rejected is being reworked.",
                report.report_number, contract.number
            ),
        ),
    };
    Notification::about(user_id, title, text, EntityKind::WorkProgress, report.id, now)
}
