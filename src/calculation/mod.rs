//! Derived values.
//!
//! Pure functions over the models: contract financial figures and the
//! rollup of indicator progress into contract indicator achievement.
//!
//! All arithmetic is checked; a result outside the range of `Decimal` is a
//! validation error naming the derived field.

mod contract_finance;
mod indicator_rollup;

pub use contract_finance::ContractFinancials;
pub use indicator_rollup::{
    ProgressContribution, achieved_value, progress_percent, progress_value_from_items,
};

use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

fn out_of_range(field: &str) -> AppError {
    AppError::validation("calculation", field, "result is out of range")
}

/// Adds `a` and `b`, failing instead of overflowing.
pub(crate) fn checked_add(a: Decimal, b: Decimal, field: &str) -> AppResult<Decimal> {
    a.checked_add(b).ok_or_else(|| out_of_range(field))
}

/// Sums `values`, failing instead of overflowing.
pub(crate) fn checked_sum(
    values: impl IntoIterator<Item = Decimal>,
    field: &str,
) -> AppResult<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| checked_add(total, value, field))
}
