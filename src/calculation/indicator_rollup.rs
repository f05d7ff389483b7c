//! Indicator rollup.
//!
//! Progress on a contract indicator is reported per work progress report.
//! A progress row either carries a value typed in directly or takes it from
//! its checklist items; the contract indicator's achieved value is the sum of
//! the progress rows whose report has been finally approved.

use rust_decimal::Decimal;

use crate::error::AppResult;
use crate::models::{ApprovalStatus, IndicatorProgressItem};

use super::{checked_sum, out_of_range};

/// One progress row as seen by the rollup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressContribution {
    /// Value of the progress row.
    pub value: Decimal,
    /// Approval status of the report the row belongs to.
    pub status: ApprovalStatus,
}

/// Computes the value of a progress row from its checklist items.
///
/// Only completed items count. An item with a `numeric_value` contributes
/// that value; an item without one counts as one unit (one village, one
/// school, one facility).
///
/// # Examples
///
/// ```
/// use pmmis::calculation::progress_value_from_items;
/// use pmmis::models::{IndicatorProgressItem, ProgressItemTarget};
/// use rust_decimal::Decimal;
///
/// let item = |id, done, value| IndicatorProgressItem {
///     id,
///     progress_id: 1,
///     target: ProgressItemTarget::Village(id),
///     is_completed: done,
///     numeric_value: value,
///     notes: None,
/// };
/// let items = vec![
///     item(1, true, None),
///     item(2, true, Some(Decimal::new(250, 0))),
///     item(3, false, Some(Decimal::new(900, 0))),
/// ];
/// assert_eq!(progress_value_from_items(&items).unwrap(), Decimal::new(251, 0));
/// ```
pub fn progress_value_from_items(items: &[IndicatorProgressItem]) -> AppResult<Decimal> {
    checked_sum(
        items
            .iter()
            .filter(|item| item.is_completed)
            .map(|item| item.numeric_value.unwrap_or(Decimal::ONE)),
        "value",
    )
}

/// Sums the progress rows that count toward the achieved value.
///
/// Only rows whose report is `DirectorApproved` count.
pub fn achieved_value(progress: &[ProgressContribution]) -> AppResult<Decimal> {
    let total = checked_sum(
        progress
            .iter()
            .filter(|p| p.status == ApprovalStatus::DirectorApproved)
            .map(|p| p.value),
        "achieved_value",
    )?;
    Ok(total.round_dp(2))
}

/// Achievement in percent of the target, rounded to 2 decimal places.
///
/// A zero target yields zero. A ratio too large for `Decimal` (a huge
/// value over a tiny target) is an error.
///
/// # Examples
///
/// ```
/// use pmmis::calculation::progress_percent;
/// use rust_decimal::Decimal;
///
/// assert_eq!(
///     progress_percent(Decimal::new(3, 0), Decimal::new(8, 0)).unwrap(),
///     Decimal::new(3750, 2)
/// );
/// assert_eq!(progress_percent(Decimal::new(3, 0), Decimal::ZERO).unwrap(), Decimal::ZERO);
/// assert!(progress_percent(Decimal::MAX, Decimal::new(1, 28)).is_err());
/// ```
pub fn progress_percent(achieved: Decimal, target: Decimal) -> AppResult<Decimal> {
    if target.is_zero() {
        return Ok(Decimal::ZERO);
    }
    achieved
        .checked_div(target)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|percent| percent.round_dp(2))
        .ok_or_else(|| out_of_range("percent"))
}
