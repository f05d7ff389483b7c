//! Geography (district → jamoat → village) and village facilities.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::LocalizedText;

/// A district, the top of the geography tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// District name.
    pub name: LocalizedText,
}

/// A jamoat (rural municipality) within a district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jamoat {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Parent district.
    pub district_id: i64,
    /// Jamoat name.
    pub name: LocalizedText,
}

/// A village within a jamoat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Village {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Parent jamoat.
    pub jamoat_id: i64,
    /// Village name.
    pub name: LocalizedText,
    /// Resident population.
    #[serde(default)]
    pub population: Option<i64>,
    /// Number of households.
    #[serde(default)]
    pub households: Option<i64>,
}

impl Village {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.is_blank() {
            return Err(AppError::validation("village", "name", "russian name is required"));
        }
        if self.population.is_some_and(|p| p < 0) {
            return Err(AppError::validation("village", "population", "must not be negative"));
        }
        if self.households.is_some_and(|h| h < 0) {
            return Err(AppError::validation("village", "households", "must not be negative"));
        }
        Ok(())
    }
}

/// A school located in a village.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Village the school is in.
    pub village_id: i64,
    /// School name or number.
    pub name: String,
    /// Enrolled students.
    #[serde(default)]
    pub student_count: Option<i64>,
}

/// Kind of health facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityType {
    /// District or central hospital.
    Hospital,
    /// Rural health centre.
    HealthCenter,
    /// Health house / feldsher post.
    HealthHouse,
}

/// A health facility located in a village.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthFacility {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Village the facility is in.
    pub village_id: i64,
    /// Facility name.
    pub name: String,
    /// Kind of facility.
    pub facility_type: FacilityType,
}
