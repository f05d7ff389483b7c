//! Derived financial figures of a contract.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::AppResult;
use crate::models::{Contract, Payment};

use super::{checked_sum, out_of_range, progress_percent};

/// Amounts and dates derived from a contract and its payments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractFinancials {
    /// Contract amount plus additional amount minus saved amount.
    pub final_amount: Decimal,
    /// Sum of paid payments.
    pub paid_amount: Decimal,
    /// Paid amount in percent of the final amount.
    pub paid_percent: Decimal,
    /// Final amount minus paid amount.
    pub remaining_amount: Decimal,
    /// Extended end date, or the contractual one.
    pub effective_end_date: NaiveDate,
    /// Days left until the effective end date; negative when overdue.
    pub remaining_days: i64,
}

impl ContractFinancials {
    /// Computes the figures as of `today`.
    ///
    /// Pending and cancelled payments are ignored. Fails with a validation
    /// error when a figure does not fit in a `Decimal`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use pmmis::calculation::ContractFinancials;
    /// use pmmis::models::{Contract, ContractStatus};
    /// use rust_decimal::Decimal;
    ///
    /// let contract = Contract {
    ///     id: 1,
    ///     number: "W-01".to_string(),
    ///     title: "Water supply".to_string(),
    ///     project_id: 1,
    ///     sub_component_id: None,
    ///     contractor_id: 1,
    ///     curator_id: None,
    ///     signing_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    ///     contract_end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
    ///     extended_to_date: None,
    ///     contract_amount: Decimal::new(1_000, 0),
    ///     additional_amount: Decimal::new(200, 0),
    ///     saved_amount: Decimal::new(100, 0),
    ///     currency: "TJS".to_string(),
    ///     status: ContractStatus::Active,
    /// };
    /// let today = NaiveDate::from_ymd_opt(2025, 12, 21).unwrap();
    /// let figures = ContractFinancials::compute(&contract, &[], today).unwrap();
    /// assert_eq!(figures.final_amount, Decimal::new(1_100, 0));
    /// assert_eq!(figures.remaining_days, 10);
    /// ```
    pub fn compute(contract: &Contract, payments: &[Payment], today: NaiveDate) -> AppResult<Self> {
        let final_amount = contract
            .contract_amount
            .checked_add(contract.additional_amount)
            .and_then(|amount| amount.checked_sub(contract.saved_amount))
            .ok_or_else(|| out_of_range("final_amount"))?;
        let paid_amount = checked_sum(
            payments.iter().filter(|p| p.is_paid()).map(|p| p.amount),
            "paid_amount",
        )?;
        let remaining_amount = final_amount
            .checked_sub(paid_amount)
            .ok_or_else(|| out_of_range("remaining_amount"))?;
        let effective_end_date = contract.effective_end_date();

        Ok(Self {
            final_amount,
            paid_amount,
            paid_percent: progress_percent(paid_amount, final_amount)?,
            remaining_amount,
            effective_end_date,
            remaining_days: (effective_end_date - today).num_days(),
        })
    }
}
