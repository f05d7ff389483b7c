//! KPI indicators, their village values and per-contract targets and progress.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::{LocalizedText, check_magnitude};

/// Results-framework level of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorCategory {
    /// Project development objective indicator.
    Pdo,
    /// Intermediate result indicator.
    Intermediate,
}

/// A KPI of the project results framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Unique code (e.g., "PDO-1", "IR-2.3").
    pub code: String,
    /// Indicator name.
    pub name: LocalizedText,
    /// Results-framework level.
    pub category: IndicatorCategory,
    /// Unit of measure (e.g., "people", "km", "%").
    pub unit: String,
    /// Value at project start.
    #[serde(default)]
    pub baseline_value: Decimal,
    /// End-of-project target.
    pub target_value: Decimal,
}

impl Indicator {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.code.trim().is_empty() {
            return Err(AppError::validation("indicator", "code", "must not be empty"));
        }
        if self.target_value < Decimal::ZERO {
            return Err(AppError::validation(
                "indicator",
                "target_value",
                "must not be negative",
            ));
        }
        check_magnitude("indicator", "baseline_value", self.baseline_value)?;
        check_magnitude("indicator", "target_value", self.target_value)
    }
}

/// A measured indicator value for one village on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValue {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Measured indicator.
    pub indicator_id: i64,
    /// Village measured.
    pub village_id: i64,
    /// Measured value.
    pub value: Decimal,
    /// Measurement date.
    pub recorded_on: NaiveDate,
}

/// The share of an indicator a contract is expected to deliver.
///
/// `achieved_value` is maintained by the indicator rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractIndicator {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Contract delivering the indicator.
    pub contract_id: i64,
    /// Indicator delivered.
    pub indicator_id: i64,
    /// Value the contract must deliver.
    pub target_value: Decimal,
    /// Value delivered by approved work progress.
    #[serde(default)]
    pub achieved_value: Decimal,
}

impl ContractIndicator {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.target_value < Decimal::ZERO {
            return Err(AppError::validation(
                "contract indicator",
                "target_value",
                "must not be negative",
            ));
        }
        check_magnitude("contract indicator", "target_value", self.target_value)
    }
}

/// A village covered by a contract indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractIndicatorVillage {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Contract indicator.
    pub contract_indicator_id: i64,
    /// Covered village.
    pub village_id: i64,
}

/// Progress reported against a contract indicator by one work progress report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractIndicatorProgress {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Contract indicator progressed.
    pub contract_indicator_id: i64,
    /// Report the progress was claimed in.
    pub work_progress_id: i64,
    /// Claimed value; derived from checklist items when any exist.
    #[serde(default)]
    pub value: Decimal,
    /// Free-form note.
    #[serde(default)]
    pub notes: Option<String>,
}

impl ContractIndicatorProgress {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.value < Decimal::ZERO {
            return Err(AppError::validation(
                "indicator progress",
                "value",
                "must not be negative",
            ));
        }
        check_magnitude("indicator progress", "value", self.value)
    }
}

/// The place a checklist item refers to.
///
/// Serialized as `{"kind": "school", "id": 7}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ProgressItemTarget {
    /// A village.
    Village(i64),
    /// A school.
    School(i64),
    /// A health facility.
    HealthFacility(i64),
}

impl ProgressItemTarget {
    /// Stored `item_type` column value.
    pub fn item_type(&self) -> &'static str {
        match self {
            ProgressItemTarget::Village(_) => "village",
            ProgressItemTarget::School(_) => "school",
            ProgressItemTarget::HealthFacility(_) => "health_facility",
        }
    }

    /// Splits the target into its three nullable foreign key columns.
    pub fn columns(&self) -> (Option<i64>, Option<i64>, Option<i64>) {
        match *self {
            ProgressItemTarget::Village(id) => (Some(id), None, None),
            ProgressItemTarget::School(id) => (None, Some(id), None),
            ProgressItemTarget::HealthFacility(id) => (None, None, Some(id)),
        }
    }

    /// Rebuilds a target from `item_type` and the three foreign key columns.
    ///
    /// Returns `None` unless exactly the column named by `item_type` is set.
    pub fn from_columns(
        item_type: &str,
        village_id: Option<i64>,
        school_id: Option<i64>,
        health_facility_id: Option<i64>,
    ) -> Option<Self> {
        match (item_type, village_id, school_id, health_facility_id) {
            ("village", Some(id), None, None) => Some(ProgressItemTarget::Village(id)),
            ("school", None, Some(id), None) => Some(ProgressItemTarget::School(id)),
            ("health_facility", None, None, Some(id)) => {
                Some(ProgressItemTarget::HealthFacility(id))
            }
            _ => None,
        }
    }
}

/// One checklist row of a progress claim: a place marked done or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorProgressItem {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Progress claim the item belongs to.
    pub progress_id: i64,
    /// Place the item refers to.
    pub target: ProgressItemTarget,
    /// Whether the works at this place are complete.
    #[serde(default)]
    pub is_completed: bool,
    /// Quantity delivered at this place; a completed item counts 1 without it.
    #[serde(default)]
    pub numeric_value: Option<Decimal>,
    /// Free-form note.
    #[serde(default)]
    pub notes: Option<String>,
}

impl IndicatorProgressItem {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.numeric_value.is_some_and(|v| v < Decimal::ZERO) {
            return Err(AppError::validation(
                "progress item",
                "numeric_value",
                "must not be negative",
            ));
        }
        match self.numeric_value {
            Some(value) => check_magnitude("progress item", "numeric_value", value),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_columns_round_trip() {
        for target in [
            ProgressItemTarget::Village(1),
            ProgressItemTarget::School(2),
            ProgressItemTarget::HealthFacility(3),
        ] {
            let (v, s, h) = target.columns();
            assert_eq!(
                ProgressItemTarget::from_columns(target.item_type(), v, s, h),
                Some(target)
            );
        }
    }

    #[test]
    fn test_mismatched_columns_are_rejected() {
        assert_eq!(
            ProgressItemTarget::from_columns("school", Some(1), None, None),
            None
        );
        assert_eq!(
            ProgressItemTarget::from_columns("village", Some(1), Some(2), None),
            None
        );
    }

    #[test]
    fn test_target_json_shape() {
        let json = serde_json::to_value(ProgressItemTarget::HealthFacility(7)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "health_facility", "id": 7}));
    }

    #[test]
    fn test_item_deserializes_with_defaults() {
        let json = r#"{"progress_id": 4, "target": {"kind": "village", "id": 12}}"#;
        let item: IndicatorProgressItem = serde_json::from_str(json).unwrap();
        assert!(!item.is_completed);
        assert_eq!(item.target, ProgressItemTarget::Village(12));
    }

    #[test]
    fn test_negative_contract_target_is_rejected() {
        let ci = ContractIndicator {
            id: 0,
            contract_id: 1,
            indicator_id: 1,
            target_value: Decimal::new(-1, 0),
            achieved_value: Decimal::ZERO,
        };
        assert!(ci.validate().is_err());
    }
}
