//! Contracting models: contractors, contracts, payments and procurement plans.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::check_magnitude;

/// A company that executes contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contractor {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Registered company name.
    pub name: String,
    /// Taxpayer identification number (unique).
    pub tax_id: String,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Main contact.
    #[serde(default)]
    pub contact_person: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// E-mail address.
    #[serde(default)]
    pub email: Option<String>,
}

impl Contractor {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("contractor", "name", "must not be empty"));
        }
        if self.tax_id.trim().is_empty() {
            return Err(AppError::validation("contractor", "tax_id", "must not be empty"));
        }
        Ok(())
    }
}

/// Lifecycle status of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// Signed and under execution.
    #[default]
    Active,
    /// All works accepted.
    Completed,
    /// Terminated before completion.
    Terminated,
}

/// A works, goods or services contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Contract number (unique).
    pub number: String,
    /// Subject of the contract.
    pub title: String,
    /// Financing project.
    pub project_id: i64,
    /// Financing sub-component.
    #[serde(default)]
    pub sub_component_id: Option<i64>,
    /// Executing contractor.
    pub contractor_id: i64,
    /// PMU staff member supervising the contract.
    #[serde(default)]
    pub curator_id: Option<i64>,
    /// Date of signature.
    pub signing_date: NaiveDate,
    /// Originally agreed completion date.
    pub contract_end_date: NaiveDate,
    /// Completion date after amendments, if extended.
    #[serde(default)]
    pub extended_to_date: Option<NaiveDate>,
    /// Originally agreed amount.
    pub contract_amount: Decimal,
    /// Amount added by amendments.
    #[serde(default)]
    pub additional_amount: Decimal,
    /// Amount saved (de-scoped) by amendments.
    #[serde(default)]
    pub saved_amount: Decimal,
    /// ISO currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: ContractStatus,
}

fn default_currency() -> String {
    "TJS".to_string()
}

impl Contract {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.number.trim().is_empty() {
            return Err(AppError::validation("contract", "number", "must not be empty"));
        }
        if self.title.trim().is_empty() {
            return Err(AppError::validation("contract", "title", "must not be empty"));
        }
        if self.contract_end_date < self.signing_date {
            return Err(AppError::validation(
                "contract",
                "contract_end_date",
                "must not be before signing_date",
            ));
        }
        if let Some(extended) = self.extended_to_date {
            if extended < self.contract_end_date {
                return Err(AppError::validation(
                    "contract",
                    "extended_to_date",
                    "must not be before contract_end_date",
                ));
            }
        }
        for (field, value) in [
            ("contract_amount", self.contract_amount),
            ("additional_amount", self.additional_amount),
            ("saved_amount", self.saved_amount),
        ] {
            if value < Decimal::ZERO {
                return Err(AppError::validation("contract", field, "must not be negative"));
            }
            check_magnitude("contract", field, value)?;
        }
        if self.currency.trim().len() != 3 {
            return Err(AppError::validation(
                "contract",
                "currency",
                "must be a three-letter code",
            ));
        }
        Ok(())
    }

    /// The completion date currently in force.
    pub fn effective_end_date(&self) -> NaiveDate {
        self.extended_to_date.unwrap_or(self.contract_end_date)
    }
}

/// Kind of payment made under a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Advance payment before works start.
    Advance,
    /// Interim payment against an accepted work progress report.
    Interim,
    /// Final settlement.
    Final,
}

/// Processing status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Requested, not yet disbursed.
    #[default]
    Pending,
    /// Disbursed; counts toward the paid amount.
    Paid,
    /// Withdrawn.
    Cancelled,
}

/// A payment under a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Contract being paid.
    pub contract_id: i64,
    /// Approved work progress report this payment settles.
    #[serde(default)]
    pub work_progress_id: Option<i64>,
    /// Amount paid.
    pub amount: Decimal,
    /// Value date.
    pub payment_date: NaiveDate,
    /// Kind of payment.
    pub payment_type: PaymentType,
    /// Processing status.
    #[serde(default)]
    pub status: PaymentStatus,
    /// Free-form note.
    #[serde(default)]
    pub description: Option<String>,
}

impl Payment {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(AppError::validation("payment", "amount", "must be positive"));
        }
        check_magnitude("payment", "amount", self.amount)
    }

    /// True when this payment counts toward the paid amount.
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

/// Procurement method under the donor's procurement regulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcurementMethod {
    /// International competitive bidding.
    Icb,
    /// National competitive bidding.
    Ncb,
    /// Request for quotations.
    Rfq,
    /// Direct contracting.
    DirectContracting,
    /// Quality and cost based selection.
    Qcbs,
    /// Selection based on consultant qualifications.
    Cqs,
    /// Individual consultant selection.
    IndividualConsultant,
}

/// Progress of a procurement package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcurementStatus {
    /// Not yet launched.
    #[default]
    Planned,
    /// Bidding or evaluation under way.
    InProgress,
    /// Contract awarded.
    Completed,
    /// Dropped from the plan.
    Cancelled,
}

/// A line of the project procurement plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementPlan {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Project the package belongs to.
    pub project_id: i64,
    /// Package reference number (unique).
    pub reference_no: String,
    /// Package description.
    pub description: String,
    /// Selection method.
    pub method: ProcurementMethod,
    /// Cost estimate.
    pub estimated_amount: Decimal,
    /// Planned contract signature date.
    pub planned_date: NaiveDate,
    /// Actual contract signature date.
    #[serde(default)]
    pub actual_date: Option<NaiveDate>,
    /// Package status.
    #[serde(default)]
    pub status: ProcurementStatus,
    /// Contract awarded for the package.
    #[serde(default)]
    pub contract_id: Option<i64>,
}

impl ProcurementPlan {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.reference_no.trim().is_empty() {
            return Err(AppError::validation(
                "procurement plan",
                "reference_no",
                "must not be empty",
            ));
        }
        if self.estimated_amount < Decimal::ZERO {
            return Err(AppError::validation(
                "procurement plan",
                "estimated_amount",
                "must not be negative",
            ));
        }
        check_magnitude("procurement plan", "estimated_amount", self.estimated_amount)?;
        if self.status == ProcurementStatus::Completed && self.contract_id.is_none() {
            return Err(AppError::validation(
                "procurement plan",
                "contract_id",
                "a completed package must reference its contract",
            ));
        }
        Ok(())
    }
}
