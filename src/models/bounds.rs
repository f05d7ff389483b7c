//! Upper bound on stored money and indicator figures.
//!
//! Sums and percentages over bounded figures stay far inside the range of
//! `Decimal`.

use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

/// Largest magnitude accepted for an amount or indicator value (10^15).
pub const MAX_MAGNITUDE: i64 = 1_000_000_000_000_000;

/// Rejects `value` when its magnitude exceeds [`MAX_MAGNITUDE`].
pub fn check_magnitude(entity: &str, field: &str, value: Decimal) -> AppResult<()> {
    if value.abs() > Decimal::from(MAX_MAGNITUDE) {
        return Err(AppError::validation(
            entity,
            field,
            format!("must not exceed {}", MAX_MAGNITUDE),
        ));
    }
    Ok(())
}
