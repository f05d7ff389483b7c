//! Queries outside the generic repository.
//!
//! Workflow state, approval history, notifications, access lookups and the
//! refresh of derived indicator values.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use crate::calculation::{ProgressContribution, achieved_value, progress_value_from_items};
use crate::error::{AppError, AppResult};
use crate::models::{
    ApprovalHistoryEntry, ApprovalStatus, IndicatorProgressItem, MenuPermission, Notification,
    Payment, RoleKind, User, WorkProgress,
};

use super::record::{
    Record, decimal, decimal_text, enum_column, enum_text, optional_enum_column,
};
use super::repo;

fn status_column(row: &Row, column: &str) -> rusqlite::Result<ApprovalStatus> {
    let value: i64 = row.get(column)?;
    ApprovalStatus::from_i64(value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Integer,
            Box::new(AppError::Database {
                message: format!("column '{}': unknown approval status {}", column, value),
            }),
        )
    })
}

/// Reads the stored approval status column.
pub(crate) fn approval_status(row: &Row) -> rusqlite::Result<ApprovalStatus> {
    status_column(row, "approval_status")
}

// --- work progress -------------------------------------------------------

/// Contract and approval status of a work progress report.
pub fn work_progress_state(conn: &Connection, id: i64) -> AppResult<(i64, ApprovalStatus)> {
    conn.query_row(
        "SELECT contract_id, approval_status FROM work_progress WHERE id = ?1",
        [id],
        |row| Ok((row.get::<_, i64>(0)?, status_column(row, "approval_status")?)),
    )
    .optional()?
    .ok_or_else(|| AppError::not_found(WorkProgress::ENTITY, id))
}

/// Fails unless the report may still be changed.
///
/// `action` names what was attempted, for the error message.
pub fn ensure_work_progress_editable(conn: &Connection, id: i64, action: &str) -> AppResult<()> {
    let (_, status) = work_progress_state(conn, id)?;
    if !status.is_editable() {
        return Err(AppError::InvalidTransition {
            action: action.to_string(),
            status: status.label().to_string(),
        });
    }
    Ok(())
}

/// Persists the approval status and every workflow stamp of a report.
pub fn save_workflow_state(conn: &Connection, wp: &WorkProgress) -> AppResult<()> {
    let changed = conn.execute(
        "UPDATE work_progress SET
            approval_status = ?1,
            submitted_by = ?2, submitted_at = ?3, submission_comment = ?4,
            manager_id = ?5, manager_approved_at = ?6, manager_comment = ?7,
            director_id = ?8, director_approved_at = ?9, director_comment = ?10,
            rejected_by = ?11, rejected_at = ?12, rejection_reason = ?13
         WHERE id = ?14",
        params![
            wp.approval_status.as_i64(),
            wp.submitted_by,
            wp.submitted_at,
            wp.submission_comment,
            wp.manager_id,
            wp.manager_approved_at,
            wp.manager_comment,
            wp.director_id,
            wp.director_approved_at,
            wp.director_comment,
            wp.rejected_by,
            wp.rejected_at,
            wp.rejection_reason,
            wp.id,
        ],
    )?;
    if changed == 0 {
        return Err(AppError::not_found(WorkProgress::ENTITY, wp.id));
    }
    Ok(())
}

/// Status counts of the reports of the given contracts, in status order.
pub fn status_counts(conn: &Connection, contract_ids: &[i64]) -> AppResult<Vec<(ApprovalStatus, i64)>> {
    let mut counts: Vec<(ApprovalStatus, i64)> =
        ApprovalStatus::ALL.iter().map(|s| (*s, 0)).collect();
    let mut stmt = conn.prepare(
        "SELECT approval_status, COUNT(*) FROM work_progress WHERE contract_id = ?1 GROUP BY approval_status",
    )?;
    for contract_id in contract_ids {
        let rows = stmt.query_map([contract_id], |row| {
            Ok((status_column(row, "approval_status")?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (status, count) = row?;
            if let Some(entry) = counts.iter_mut().find(|(s, _)| *s == status) {
                entry.1 += count;
            }
        }
    }
    Ok(counts)
}

/// The most recent finally approved report of a contract.
pub fn latest_approved_progress(conn: &Connection, contract_id: i64) -> AppResult<Option<WorkProgress>> {
    let report = conn
        .query_row(
            "SELECT * FROM work_progress
             WHERE contract_id = ?1 AND approval_status = ?2
             ORDER BY report_date DESC, id DESC LIMIT 1",
            params![contract_id, ApprovalStatus::DirectorApproved.as_i64()],
            |row| WorkProgress::from_row(row),
        )
        .optional()?;
    Ok(report)
}

// --- approval history ----------------------------------------------------

fn history_from_row(row: &Row) -> rusqlite::Result<ApprovalHistoryEntry> {
    Ok(ApprovalHistoryEntry {
        id: row.get("id")?,
        work_progress_id: row.get("work_progress_id")?,
        action: enum_column(row, "action")?,
        from_status: status_column(row, "from_status")?,
        to_status: status_column(row, "to_status")?,
        actor_id: row.get("actor_id")?,
        comment: row.get("comment")?,
        occurred_at: row.get("occurred_at")?,
    })
}

/// Appends a workflow transition to the history.
pub fn insert_history(conn: &Connection, entry: &ApprovalHistoryEntry) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO approval_history
            (work_progress_id, action, from_status, to_status, actor_id, comment, occurred_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.work_progress_id,
            enum_text(&entry.action),
            entry.from_status.as_i64(),
            entry.to_status.as_i64(),
            entry.actor_id,
            entry.comment,
            entry.occurred_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// History of a report, oldest first.
pub fn history_for(conn: &Connection, work_progress_id: i64) -> AppResult<Vec<ApprovalHistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM approval_history WHERE work_progress_id = ?1 ORDER BY occurred_at, id",
    )?;
    let rows = stmt.query_map([work_progress_id], history_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// --- notifications -------------------------------------------------------

fn notification_from_row(row: &Row) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        message: row.get("message")?,
        entity_type: optional_enum_column(row, "entity_type")?,
        entity_id: row.get("entity_id")?,
        is_read: row.get("is_read")?,
        created_at: row.get("created_at")?,
        scheduled_for: row.get("scheduled_for")?,
    })
}

/// Stores a notification.
pub fn insert_notification(conn: &Connection, notification: &Notification) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO notifications
            (user_id, title, message, entity_type, entity_id, is_read, created_at, scheduled_for)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            notification.user_id,
            notification.title,
            notification.message,
            notification.entity_type.as_ref().map(enum_text),
            notification.entity_id,
            notification.is_read,
            notification.created_at,
            notification.scheduled_for,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Notifications of a user that are visible at `now`, newest first.
pub fn visible_notifications(
    conn: &Connection,
    user_id: i64,
    now: DateTime<Utc>,
) -> AppResult<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt.query_map([user_id], notification_from_row)?;
    let all = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(all.into_iter().filter(|n| n.is_due(now)).collect())
}

/// Marks one of the user's notifications as read.
///
/// A notification scheduled after `now` is not visible yet and is reported as
/// not found.
pub fn mark_notification_read(
    conn: &Connection,
    user_id: i64,
    id: i64,
    now: DateTime<Utc>,
) -> AppResult<Notification> {
    let notification = conn
        .query_row(
            "SELECT * FROM notifications WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            notification_from_row,
        )
        .optional()?
        .filter(|n| n.is_due(now))
        .ok_or_else(|| AppError::not_found("notification", id))?;
    conn.execute("UPDATE notifications SET is_read = 1 WHERE id = ?1", [id])?;
    Ok(Notification {
        is_read: true,
        ..notification
    })
}

/// Marks every visible notification of the user as read; returns how many changed.
pub fn mark_all_notifications_read(
    conn: &Connection,
    user_id: i64,
    now: DateTime<Utc>,
) -> AppResult<usize> {
    let pending: Vec<i64> = visible_notifications(conn, user_id, now)?
        .into_iter()
        .filter(|n| !n.is_read)
        .map(|n| n.id)
        .collect();
    for id in &pending {
        conn.execute("UPDATE notifications SET is_read = 1 WHERE id = ?1", [id])?;
    }
    Ok(pending.len())
}

// --- access --------------------------------------------------------------

/// Active users whose role is of `kind`.
pub fn active_users_with_role_kind(conn: &Connection, kind: RoleKind) -> AppResult<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT u.* FROM users u JOIN roles r ON r.id = u.role_id
         WHERE r.kind = ?1 AND u.is_active = 1 ORDER BY u.id",
    )?;
    let rows = stmt.query_map([enum_text(&kind)], |row| User::from_row(row))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Permission matrix rows of a role.
pub fn permissions_for_role(conn: &Connection, role_id: i64) -> AppResult<Vec<MenuPermission>> {
    repo::list(conn, &[("role_id".to_string(), role_id.to_string())])
}

/// Every user below `user_id` in the supervision tree.
pub fn subordinates(conn: &Connection, user_id: i64) -> AppResult<Vec<User>> {
    let mut stmt = conn.prepare(
        "WITH RECURSIVE below(id) AS (
             SELECT id FROM users WHERE supervisor_id = ?1
             UNION
             SELECT u.id FROM users u JOIN below ON u.supervisor_id = below.id
         )
         SELECT u.* FROM users u JOIN below ON below.id = u.id
         WHERE u.id != ?1 ORDER BY u.id",
    )?;
    let rows = stmt.query_map([user_id], |row| User::from_row(row))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Whether `candidate` is `user_id` or one of its supervisors.
pub fn is_in_supervisor_chain(conn: &Connection, user_id: i64, candidate: i64) -> AppResult<bool> {
    let found: i64 = conn.query_row(
        "WITH RECURSIVE above(id) AS (
             SELECT ?1
             UNION
             SELECT u.supervisor_id FROM users u JOIN above ON u.id = above.id
             WHERE u.supervisor_id IS NOT NULL
         )
         SELECT COUNT(*) FROM above WHERE id = ?2",
        params![user_id, candidate],
        |row| row.get(0),
    )?;
    Ok(found > 0)
}

// --- payments ------------------------------------------------------------

/// Payments of a contract.
pub fn payments_for_contract(conn: &Connection, contract_id: i64) -> AppResult<Vec<Payment>> {
    repo::list(conn, &[("contract_id".to_string(), contract_id.to_string())])
}

// --- indicator rollup ----------------------------------------------------

/// Contract indicator and report of a progress row.
pub fn progress_parents(conn: &Connection, progress_id: i64) -> AppResult<(i64, i64)> {
    conn.query_row(
        "SELECT contract_indicator_id, work_progress_id FROM contract_indicator_progress WHERE id = ?1",
        [progress_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("indicator progress", progress_id))
}

/// Recomputes a progress row's value from its checklist items.
///
/// A row without items keeps its value, unless `reset_when_empty` is set
/// (its last item was just removed), in which case it drops to zero.
/// The owning contract indicator is refreshed afterwards.
pub fn refresh_progress_value(
    conn: &Connection,
    progress_id: i64,
    reset_when_empty: bool,
) -> AppResult<()> {
    let (contract_indicator_id, _) = progress_parents(conn, progress_id)?;
    let items: Vec<IndicatorProgressItem> =
        repo::list(conn, &[("progress_id".to_string(), progress_id.to_string())])?;
    if !items.is_empty() || reset_when_empty {
        let value = progress_value_from_items(&items)?;
        conn.execute(
            "UPDATE contract_indicator_progress SET value = ?1 WHERE id = ?2",
            params![decimal_text(value), progress_id],
        )?;
    }
    refresh_contract_indicator(conn, contract_indicator_id)
}

/// Recomputes a contract indicator's achieved value.
pub fn refresh_contract_indicator(conn: &Connection, contract_indicator_id: i64) -> AppResult<()> {
    let mut stmt = conn.prepare(
        "SELECT p.value, w.approval_status
         FROM contract_indicator_progress p
         JOIN work_progress w ON w.id = p.work_progress_id
         WHERE p.contract_indicator_id = ?1",
    )?;
    let rows = stmt.query_map([contract_indicator_id], |row| {
        Ok(ProgressContribution {
            value: decimal(row, "value")?,
            status: approval_status(row)?,
        })
    })?;
    let contributions = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    let achieved = achieved_value(&contributions)?;
    conn.execute(
        "UPDATE contract_indicators SET achieved_value = ?1 WHERE id = ?2",
        params![decimal_text(achieved), contract_indicator_id],
    )?;
    debug!(contract_indicator_id, %achieved, "Refreshed contract indicator");
    Ok(())
}

/// Recomputes every contract indicator of a contract.
pub fn refresh_contract_indicators(conn: &Connection, contract_id: i64) -> AppResult<()> {
    let ids: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT id FROM contract_indicators WHERE contract_id = ?1")?;
        let rows = stmt.query_map([contract_id], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };
    for id in ids {
        refresh_contract_indicator(conn, id)?;
    }
    Ok(())
}

/// Removes the checklist items matching `condition` and refreshes the
/// progress rows they belonged to.
///
/// Used before deleting geography or facilities, whose cascades would
/// otherwise drop items without updating derived values. `condition` is a
/// fixed SQL predicate over `indicator_progress_items` with `?1` bound to `id`.
pub(crate) fn release_progress_items(conn: &Connection, condition: &str, id: i64) -> AppResult<()> {
    let progress_ids: Vec<i64> = {
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT progress_id FROM indicator_progress_items WHERE {}",
            condition
        ))?;
        let rows = stmt.query_map([id], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };
    if progress_ids.is_empty() {
        return Ok(());
    }
    conn.execute(
        &format!("DELETE FROM indicator_progress_items WHERE {}", condition),
        [id],
    )?;
    for progress_id in progress_ids {
        refresh_progress_value(conn, progress_id, true)?;
    }
    Ok(())
}
