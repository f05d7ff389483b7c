use rusqlite::{Connection, Row, ToSql};

use crate::db::queries::release_progress_items;
use crate::db::record::{Record, enum_column, enum_text, ensure_exists, localized, push_localized};
use crate::error::{AppError, AppResult};
use crate::models::{District, HealthFacility, Jamoat, MenuKey, School, Village};

// Predicates over indicator_progress_items selecting the items that a
// deletion would cascade away.
const ITEMS_OF_VILLAGES_IN: &str = "village_id IN ({v})
    OR school_id IN (SELECT id FROM schools WHERE village_id IN ({v}))
    OR health_facility_id IN (SELECT id FROM health_facilities WHERE village_id IN ({v}))";
const VILLAGE_IDS_OF_DISTRICT: &str =
    "SELECT v.id FROM villages v JOIN jamoats j ON j.id = v.jamoat_id WHERE j.district_id = ?1";
const VILLAGE_IDS_OF_JAMOAT: &str = "SELECT id FROM villages WHERE jamoat_id = ?1";
const VILLAGE_ID: &str = "SELECT ?1";

fn release_items_of_villages(conn: &Connection, village_ids: &str, id: i64) -> AppResult<()> {
    let condition = ITEMS_OF_VILLAGES_IN.replace("{v}", village_ids);
    release_progress_items(conn, &condition, id)
}

fn require_name(entity: &str, blank: bool) -> AppResult<()> {
    if blank {
        return Err(AppError::validation(entity, "name", "russian name is required"));
    }
    Ok(())
}

impl Record for District {
    const TABLE: &'static str = "districts";
    const ENTITY: &'static str = "district";
    const MENU: MenuKey = MenuKey::Geography;
    const COLUMNS: &'static [&'static str] = &["name_ru", "name_tj", "name_en"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: localized(row, "name")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        let mut values = Vec::new();
        push_localized(&mut values, &self.name);
        values
    }

    fn check(&self, _conn: &Connection) -> AppResult<()> {
        require_name(Self::ENTITY, self.name.is_blank())
    }

    fn before_delete(&self, conn: &Connection) -> AppResult<()> {
        release_items_of_villages(conn, VILLAGE_IDS_OF_DISTRICT, self.id)
    }
}

impl Record for Jamoat {
    const TABLE: &'static str = "jamoats";
    const ENTITY: &'static str = "jamoat";
    const MENU: MenuKey = MenuKey::Geography;
    const COLUMNS: &'static [&'static str] = &["district_id", "name_ru", "name_tj", "name_en"];
    const FILTERS: &'static [&'static str] = &["district_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            district_id: row.get("district_id")?,
            name: localized(row, "name")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(self.district_id)];
        push_localized(&mut values, &self.name);
        values
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        require_name(Self::ENTITY, self.name.is_blank())?;
        ensure_exists(conn, District::TABLE, District::ENTITY, self.district_id)
    }

    fn before_delete(&self, conn: &Connection) -> AppResult<()> {
        release_items_of_villages(conn, VILLAGE_IDS_OF_JAMOAT, self.id)
    }
}

impl Record for Village {
    const TABLE: &'static str = "villages";
    const ENTITY: &'static str = "village";
    const MENU: MenuKey = MenuKey::Geography;
    const COLUMNS: &'static [&'static str] = &[
        "jamoat_id",
        "name_ru",
        "name_tj",
        "name_en",
        "population",
        "households",
    ];
    const FILTERS: &'static [&'static str] = &["jamoat_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            jamoat_id: row.get("jamoat_id")?,
            name: localized(row, "name")?,
            population: row.get("population")?,
            households: row.get("households")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(self.jamoat_id)];
        push_localized(&mut values, &self.name);
        values.push(Box::new(self.population));
        values.push(Box::new(self.households));
        values
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        self.validate()?;
        ensure_exists(conn, Jamoat::TABLE, Jamoat::ENTITY, self.jamoat_id)
    }

    fn before_delete(&self, conn: &Connection) -> AppResult<()> {
        release_items_of_villages(conn, VILLAGE_ID, self.id)
    }
}

impl Record for School {
    const TABLE: &'static str = "schools";
    const ENTITY: &'static str = "school";
    const MENU: MenuKey = MenuKey::Facilities;
    const COLUMNS: &'static [&'static str] = &["village_id", "name", "student_count"];
    const FILTERS: &'static [&'static str] = &["village_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            village_id: row.get("village_id")?,
            name: row.get("name")?,
            student_count: row.get("student_count")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.village_id),
            Box::new(self.name.clone()),
            Box::new(self.student_count),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation(Self::ENTITY, "name", "must not be empty"));
        }
        if self.student_count.is_some_and(|n| n < 0) {
            return Err(AppError::validation(
                Self::ENTITY,
                "student_count",
                "must not be negative",
            ));
        }
        ensure_exists(conn, Village::TABLE, Village::ENTITY, self.village_id)
    }

    fn before_delete(&self, conn: &Connection) -> AppResult<()> {
        release_progress_items(conn, "school_id = ?1", self.id)
    }
}

impl Record for HealthFacility {
    const TABLE: &'static str = "health_facilities";
    const ENTITY: &'static str = "health facility";
    const MENU: MenuKey = MenuKey::Facilities;
    const COLUMNS: &'static [&'static str] = &["village_id", "name", "facility_type"];
    const FILTERS: &'static [&'static str] = &["village_id", "facility_type"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            village_id: row.get("village_id")?,
            name: row.get("name")?,
            facility_type: enum_column(row, "facility_type")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.village_id),
            Box::new(self.name.clone()),
            Box::new(enum_text(&self.facility_type)),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation(Self::ENTITY, "name", "must not be empty"));
        }
        ensure_exists(conn, Village::TABLE, Village::ENTITY, self.village_id)
    }

    fn before_delete(&self, conn: &Connection) -> AppResult<()> {
        release_progress_items(conn, "health_facility_id = ?1", self.id)
    }
}
