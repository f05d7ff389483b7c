//! The approval state machine.

use crate::error::{AppError, AppResult};
use crate::models::{ApprovalAction, ApprovalStatus, RoleKind};

/// Status reached by `action` from `current`, or `InvalidTransition`.
///
/// # Examples
///
/// ```
/// use pmmis::models::{ApprovalAction, ApprovalStatus};
/// use pmmis::workflow::next_status;
///
/// assert_eq!(
///     next_status(ApprovalAction::Submit, ApprovalStatus::Draft).unwrap(),
///     ApprovalStatus::SubmittedForReview
/// );
/// assert!(next_status(ApprovalAction::DirectorApprove, ApprovalStatus::Draft).is_err());
/// ```
pub fn next_status(action: ApprovalAction, current: ApprovalStatus) -> AppResult<ApprovalStatus> {
    use ApprovalAction as A;
    use ApprovalStatus as S;

    let next = match (action, current) {
        (A::Submit, S::Draft) => S::SubmittedForReview,
        (A::ManagerApprove, S::SubmittedForReview) => S::ManagerApproved,
        (A::DirectorApprove, S::ManagerApproved) => S::DirectorApproved,
        (A::Reject, S::Draft | S::SubmittedForReview | S::ManagerApproved) => S::Rejected,
        (A::Revise, S::Rejected) => S::Draft,
        _ => {
            return Err(AppError::InvalidTransition {
                action: action.label().to_string(),
                status: current.label().to_string(),
            });
        }
    };
    Ok(next)
}

/// Role kind that may perform `action` on a report in `current`.
///
/// A rejection belongs to whoever reviews the current stage.
pub fn stage_role(action: ApprovalAction, current: ApprovalStatus) -> RoleKind {
    match action {
        ApprovalAction::Submit | ApprovalAction::Revise => RoleKind::Curator,
        ApprovalAction::ManagerApprove => RoleKind::Manager,
        ApprovalAction::DirectorApprove => RoleKind::Director,
        ApprovalAction::Reject => match current {
            ApprovalStatus::SubmittedForReview => RoleKind::Manager,
            ApprovalStatus::ManagerApproved => RoleKind::Director,
            _ => RoleKind::Curator,
        },
    }
}
