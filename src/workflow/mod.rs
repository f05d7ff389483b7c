//! Approval workflow for work progress reports.
//!
//! A report moves Draft → SubmittedForReview → ManagerApproved →
//! DirectorApproved, or is rejected on the way and revised back to a draft.
//! Each transition is checked against the state machine and the actor's
//! authority, stamped on the report, appended to the history and, when
//! enabled, announced to the next people in line.

mod notify;
mod transitions;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::access::CurrentUser;
use crate::db::{Record, queries, repo};
use crate::error::{AppError, AppResult};
use crate::models::{
    ApprovalAction, ApprovalHistoryEntry, ApprovalStatus, Contract, MenuKey, PermissionAction,
    RoleKind, WorkProgress,
};

pub use transitions::{next_status, stage_role};

/// Result of a workflow action.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    /// The report after the transition.
    pub work_progress: WorkProgress,
    /// The history entry written for it.
    pub history: ApprovalHistoryEntry,
    /// Users that were notified.
    pub notified: Vec<i64>,
}

/// Stamps `report` for `action` performed by `actor_id` at `now`.
fn stamp(
    report: &mut WorkProgress,
    action: ApprovalAction,
    actor_id: i64,
    comment: Option<String>,
    now: DateTime<Utc>,
) {
    match action {
        ApprovalAction::Submit => {
            report.submitted_by = Some(actor_id);
            report.submitted_at = Some(now);
            report.submission_comment = comment;
            report.rejected_by = None;
            report.rejected_at = None;
            report.rejection_reason = None;
        }
        ApprovalAction::ManagerApprove => {
            report.manager_id = Some(actor_id);
            report.manager_approved_at = Some(now);
            report.manager_comment = comment;
        }
        ApprovalAction::DirectorApprove => {
            report.director_id = Some(actor_id);
            report.director_approved_at = Some(now);
            report.director_comment = comment;
        }
        ApprovalAction::Reject => {
            report.rejected_by = Some(actor_id);
            report.rejected_at = Some(now);
            report.rejection_reason = comment;
        }
        ApprovalAction::Revise => report.clear_review_stamps(),
    }
}

/// Performs `action` on the report `work_progress_id` as `actor`.
///
/// Runs in one transaction: the status change, the stamps, the history
/// entry, the indicator refresh and the notifications are stored together
/// or not at all.
pub fn apply(
    conn: &mut Connection,
    actor: &CurrentUser,
    work_progress_id: i64,
    action: ApprovalAction,
    comment: Option<String>,
    notify_on_transition: bool,
    now: DateTime<Utc>,
) -> AppResult<TransitionOutcome> {
    actor.authorize(MenuKey::WorkProgress, PermissionAction::Edit)?;

    let tx = conn.transaction()?;
    let mut report: WorkProgress = repo::get(&tx, work_progress_id)?;
    let contract: Contract = repo::get(&tx, report.contract_id)?;
    let from = report.approval_status;
    let to = next_status(action, from)?;

    let required = stage_role(action, from);
    let assigned = match required {
        RoleKind::Curator => contract.curator_id,
        _ => None,
    };
    actor.authorize_stage(required, assigned, action.label())?;

    let comment = comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    if action == ApprovalAction::Reject && comment.is_none() {
        return Err(AppError::validation(
            WorkProgress::ENTITY,
            "comment",
            "a rejection reason is required",
        ));
    }

    // Before stamping: revise clears the rejecting reviewer.
    let recipients = if notify_on_transition {
        notify::recipients(&tx, action, &report, &contract, actor.id())?
    } else {
        Vec::new()
    };

    report.approval_status = to;
    stamp(&mut report, action, actor.id(), comment.clone(), now);
    queries::save_workflow_state(&tx, &report)?;

    let mut history = ApprovalHistoryEntry {
        id: 0,
        work_progress_id,
        action,
        from_status: from,
        to_status: to,
        actor_id: Some(actor.id()),
        comment,
        occurred_at: now,
    };
    history.id = queries::insert_history(&tx, &history)?;

    if from == ApprovalStatus::DirectorApproved || to == ApprovalStatus::DirectorApproved {
        queries::refresh_contract_indicators(&tx, report.contract_id)?;
    }

    for user_id in &recipients {
        queries::insert_notification(&tx, &notify::message(*user_id, action, &report, &contract, now))?;
    }
    let notified = recipients;

    tx.commit()?;
    info!(
        work_progress_id,
        action = action.label(),
        from = from.label(),
        to = to.label(),
        actor = %actor.user.username,
        notified = notified.len(),
        "Work progress transition"
    );

    Ok(TransitionOutcome {
        work_progress: report,
        history,
        notified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_contract, seed_indicator, seed_report, seed_user};
    use crate::db::{Database, WriteContext};
    use crate::models::{ContractIndicator, ContractIndicatorProgress, MenuPermission, User};
    use rust_decimal::Decimal;

    struct Team {
        db: Database,
        curator: CurrentUser,
        manager: CurrentUser,
        director: CurrentUser,
        report: WorkProgress,
        contract_indicator: ContractIndicator,
    }

    fn grant_edit(conn: &mut Connection, user: &User) -> AppResult<()> {
        let ctx = WriteContext::now(0);
        let existing = queries::permissions_for_role(conn, user.role_id)?;
        if existing.is_empty() {
            repo::insert(
                conn,
                MenuPermission {
                    id: 0,
                    role_id: user.role_id,
                    menu: MenuKey::WorkProgress,
                    can_view: true,
                    can_create: true,
                    can_edit: true,
                    can_delete: false,
                },
                &ctx,
            )?;
        }
        Ok(())
    }

    fn team() -> Team {
        let db = Database::open_in_memory().unwrap();
        let (curator, manager, director, report, contract_indicator) = db
            .with_conn_mut(|conn| {
                let curator = seed_user(conn, "curator", RoleKind::Curator)?;
                let manager = seed_user(conn, "manager", RoleKind::Manager)?;
                let director = seed_user(conn, "director", RoleKind::Director)?;
                for user in [&curator, &manager, &director] {
                    grant_edit(conn, user)?;
                }
                let contract = seed_contract(conn, Some(curator.id))?;
                let indicator = seed_indicator(conn, "PDO-1")?;
                let ctx = WriteContext::now(curator.id);
                let contract_indicator = repo::insert(
                    conn,
                    ContractIndicator {
                        id: 0,
                        contract_id: contract.id,
                        indicator_id: indicator.id,
                        target_value: Decimal::new(10, 0),
                        achieved_value: Decimal::ZERO,
                    },
                    &ctx,
                )?;
                let report = seed_report(conn, &ctx, contract.id, "AVR-1")?;
                repo::insert(
                    conn,
                    ContractIndicatorProgress {
                        id: 0,
                        contract_indicator_id: contract_indicator.id,
                        work_progress_id: report.id,
                        value: Decimal::new(4, 0),
                        notes: None,
                    },
                    &ctx,
                )?;
                Ok((
                    CurrentUser::load(conn, curator.id)?,
                    CurrentUser::load(conn, manager.id)?,
                    CurrentUser::load(conn, director.id)?,
                    report,
                    contract_indicator,
                ))
            })
            .unwrap();
        Team {
            db,
            curator,
            manager,
            director,
            report,
            contract_indicator,
        }
    }

    fn act(
        team: &Team,
        actor: &CurrentUser,
        action: ApprovalAction,
        comment: Option<&str>,
    ) -> AppResult<TransitionOutcome> {
        team.db.with_conn_mut(|conn| {
            apply(
                conn,
                actor,
                team.report.id,
                action,
                comment.map(str::to_string),
                true,
                Utc::now(),
            )
        })
    }

    fn achieved(team: &Team) -> Decimal {
        let ci: ContractIndicator = team
            .db
            .with_conn(|conn| repo::get(conn, team.contract_indicator.id))
            .unwrap();
        ci.achieved_value
    }

    #[test]
    fn test_full_approval_cycle_stamps_and_rolls_up() {
        let t = team();
        let submitted = act(&t, &t.curator, ApprovalAction::Submit, Some("ready")).unwrap();
        assert_eq!(submitted.work_progress.approval_status, ApprovalStatus::SubmittedForReview);
        assert_eq!(submitted.work_progress.submitted_by, Some(t.curator.id()));
        assert_eq!(submitted.notified, vec![t.manager.id()]);
        assert_eq!(achieved(&t), Decimal::ZERO);

        let approved = act(&t, &t.manager, ApprovalAction::ManagerApprove, None).unwrap();
        assert_eq!(approved.notified, vec![t.director.id()]);

        let done = act(&t, &t.director, ApprovalAction::DirectorApprove, Some("ok")).unwrap();
        assert_eq!(done.work_progress.approval_status, ApprovalStatus::DirectorApproved);
        assert_eq!(done.work_progress.director_comment.as_deref(), Some("ok"));
        assert_eq!(done.notified, vec![t.curator.id()]);
        assert_eq!(achieved(&t), Decimal::new(4, 0));

        let history = t
            .db
            .with_conn(|conn| queries::history_for(conn, t.report.id))
            .unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].from_status, ApprovalStatus::Draft);
        assert_eq!(history[2].to_status, ApprovalStatus::DirectorApproved);
    }

    #[test]
    fn test_wrong_stage_authority_is_forbidden() {
        let t = team();
        act(&t, &t.curator, ApprovalAction::Submit, None).unwrap();
        let result = act(&t, &t.director, ApprovalAction::ManagerApprove, None);
        assert!(matches!(result, Err(AppError::Forbidden { .. })));
    }

    #[test]
    fn test_unassigned_curator_cannot_submit() {
        let t = team();
        let other = t
            .db
            .with_conn_mut(|conn| {
                let user = seed_user(conn, "curator2", RoleKind::Curator)?;
                CurrentUser::load(conn, user.id)
            })
            .unwrap();
        let result = act(&t, &other, ApprovalAction::Submit, None);
        assert!(matches!(result, Err(AppError::Forbidden { .. })));
    }

    #[test]
    fn test_reject_requires_reason_and_revise_reopens() {
        let t = team();
        act(&t, &t.curator, ApprovalAction::Submit, None).unwrap();

        let result = act(&t, &t.manager, ApprovalAction::Reject, Some("   "));
        assert!(matches!(result, Err(AppError::Validation { field, .. }) if field == "comment"));

        let rejected = act(&t, &t.manager, ApprovalAction::Reject, Some("photos missing")).unwrap();
        assert_eq!(rejected.work_progress.approval_status, ApprovalStatus::Rejected);
        assert_eq!(rejected.work_progress.rejection_reason.as_deref(), Some("photos missing"));
        assert_eq!(rejected.notified, vec![t.curator.id()]);

        let revised = act(&t, &t.curator, ApprovalAction::Revise, None).unwrap();
        assert_eq!(revised.work_progress.approval_status, ApprovalStatus::Draft);
        assert_eq!(revised.work_progress.submitted_by, None);
        assert_eq!(revised.work_progress.rejected_by, None);
        assert_eq!(revised.notified, vec![t.manager.id()]);
        let inbox = t
            .db
            .with_conn(|conn| queries::visible_notifications(conn, t.manager.id(), Utc::now()))
            .unwrap();
        assert!(inbox.iter().any(|n| n.title == "Work progress reopened"));

        let resubmitted = act(&t, &t.curator, ApprovalAction::Submit, None).unwrap();
        assert_eq!(resubmitted.work_progress.rejection_reason, None);
    }

    #[test]
    fn test_invalid_transition_leaves_report_unchanged() {
        let t = team();
        let result = act(&t, &t.director, ApprovalAction::DirectorApprove, None);
        assert!(matches!(result, Err(AppError::InvalidTransition { .. })));
        let stored: WorkProgress = t.db.with_conn(|conn| repo::get(conn, t.report.id)).unwrap();
        assert_eq!(stored.approval_status, ApprovalStatus::Draft);
        let history = t.db.with_conn(|conn| queries::history_for(conn, t.report.id)).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_missing_edit_permission_is_forbidden() {
        let t = team();
        let observer = t
            .db
            .with_conn_mut(|conn| {
                let user = seed_user(conn, "observer", RoleKind::Observer)?;
                CurrentUser::load(conn, user.id)
            })
            .unwrap();
        let result = act(&t, &observer, ApprovalAction::Submit, None);
        assert!(matches!(result, Err(AppError::Forbidden { resource, .. }) if resource == "work_progress"));
    }

    #[test]
    fn test_notifications_can_be_disabled() {
        let t = team();
        let outcome = t
            .db
            .with_conn_mut(|conn| {
                apply(conn, &t.curator, t.report.id, ApprovalAction::Submit, None, false, Utc::now())
            })
            .unwrap();
        assert!(outcome.notified.is_empty());
        let inbox = t
            .db
            .with_conn(|conn| queries::visible_notifications(conn, t.manager.id(), Utc::now()))
            .unwrap();
        assert!(inbox.is_empty());
    }
}
