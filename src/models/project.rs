//! Project, component and sub-component models.
//!
//! A donor project is split into numbered components, each of which is split
//! into sub-components. Contracts are financed under a sub-component.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::{LocalizedText, check_magnitude};

/// A donor-funded project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Short unique code (e.g., "P-178819").
    pub code: String,
    /// Project name.
    pub name: LocalizedText,
    /// Financing institution.
    #[serde(default)]
    pub donor: String,
    /// Effectiveness date.
    pub start_date: NaiveDate,
    /// Closing date, when known.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Total budget.
    #[serde(default)]
    pub budget: Decimal,
}

impl Project {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.code.trim().is_empty() {
            return Err(AppError::validation("project", "code", "must not be empty"));
        }
        if self.name.is_blank() {
            return Err(AppError::validation("project", "name", "russian name is required"));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(AppError::validation(
                    "project",
                    "end_date",
                    "must not be before start_date",
                ));
            }
        }
        if self.budget < Decimal::ZERO {
            return Err(AppError::validation("project", "budget", "must not be negative"));
        }
        check_magnitude("project", "budget", self.budget)
    }
}

/// A numbered component of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Owning project.
    pub project_id: i64,
    /// Component number as printed in the project documents (e.g., "2").
    pub number: String,
    /// Component name.
    pub name: LocalizedText,
}

/// A numbered sub-component of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubComponent {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Owning component.
    pub component_id: i64,
    /// Sub-component number (e.g., "2.1").
    pub number: String,
    /// Sub-component name.
    pub name: LocalizedText,
}
