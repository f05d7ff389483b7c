use rusqlite::{Connection, Row, ToSql};

use crate::db::queries;
use crate::db::record::{
    Record, WriteContext, decimal, decimal_text, enum_column, enum_text, ensure_exists, localized,
    optional_decimal, optional_decimal_text, push_localized,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    Contract, ContractIndicator, ContractIndicatorProgress, ContractIndicatorVillage,
    HealthFacility, Indicator, IndicatorProgressItem, IndicatorValue, MenuKey, ProgressItemTarget,
    School, Village, check_magnitude,
};

impl Record for Indicator {
    const TABLE: &'static str = "indicators";
    const ENTITY: &'static str = "indicator";
    const MENU: MenuKey = MenuKey::Indicators;
    const COLUMNS: &'static [&'static str] = &[
        "code",
        "name_ru",
        "name_tj",
        "name_en",
        "category",
        "unit",
        "baseline_value",
        "target_value",
    ];
    const FILTERS: &'static [&'static str] = &["code", "category"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            code: row.get("code")?,
            name: localized(row, "name")?,
            category: enum_column(row, "category")?,
            unit: row.get("unit")?,
            baseline_value: decimal(row, "baseline_value")?,
            target_value: decimal(row, "target_value")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(self.code.clone())];
        push_localized(&mut values, &self.name);
        values.push(Box::new(enum_text(&self.category)));
        values.push(Box::new(self.unit.clone()));
        values.push(Box::new(decimal_text(self.baseline_value)));
        values.push(Box::new(decimal_text(self.target_value)));
        values
    }

    fn check(&self, _conn: &Connection) -> AppResult<()> {
        self.validate()?;
        if self.name.is_blank() {
            return Err(AppError::validation(Self::ENTITY, "name", "russian name is required"));
        }
        Ok(())
    }
}

impl Record for IndicatorValue {
    const TABLE: &'static str = "indicator_values";
    const ENTITY: &'static str = "indicator value";
    const MENU: MenuKey = MenuKey::Indicators;
    const COLUMNS: &'static [&'static str] = &["indicator_id", "village_id", "value", "recorded_on"];
    const FILTERS: &'static [&'static str] = &["indicator_id", "village_id", "recorded_on"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            indicator_id: row.get("indicator_id")?,
            village_id: row.get("village_id")?,
            value: decimal(row, "value")?,
            recorded_on: row.get("recorded_on")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.indicator_id),
            Box::new(self.village_id),
            Box::new(decimal_text(self.value)),
            Box::new(self.recorded_on),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        check_magnitude(Self::ENTITY, "value", self.value)?;
        ensure_exists(conn, Indicator::TABLE, Indicator::ENTITY, self.indicator_id)?;
        ensure_exists(conn, Village::TABLE, Village::ENTITY, self.village_id)
    }
}

impl Record for ContractIndicator {
    const TABLE: &'static str = "contract_indicators";
    const ENTITY: &'static str = "contract indicator";
    const MENU: MenuKey = MenuKey::Indicators;
    const COLUMNS: &'static [&'static str] =
        &["contract_id", "indicator_id", "target_value", "achieved_value"];
    const FILTERS: &'static [&'static str] = &["contract_id", "indicator_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            contract_id: row.get("contract_id")?,
            indicator_id: row.get("indicator_id")?,
            target_value: decimal(row, "target_value")?,
            achieved_value: decimal(row, "achieved_value")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.contract_id),
            Box::new(self.indicator_id),
            Box::new(decimal_text(self.target_value)),
            Box::new(decimal_text(self.achieved_value)),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        self.validate()?;
        ensure_exists(conn, Contract::TABLE, Contract::ENTITY, self.contract_id)?;
        ensure_exists(conn, Indicator::TABLE, Indicator::ENTITY, self.indicator_id)
    }

    fn before_insert(&mut self, _ctx: &WriteContext) {
        self.achieved_value = rust_decimal::Decimal::ZERO;
    }

    fn before_update(&mut self, existing: &Self, _ctx: &WriteContext) -> AppResult<()> {
        if self.contract_id != existing.contract_id {
            return Err(AppError::validation(
                Self::ENTITY,
                "contract_id",
                "cannot be moved to another contract",
            ));
        }
        self.achieved_value = existing.achieved_value;
        Ok(())
    }
}

impl Record for ContractIndicatorVillage {
    const TABLE: &'static str = "contract_indicator_villages";
    const ENTITY: &'static str = "contract indicator village";
    const MENU: MenuKey = MenuKey::Indicators;
    const COLUMNS: &'static [&'static str] = &["contract_indicator_id", "village_id"];
    const FILTERS: &'static [&'static str] = &["contract_indicator_id", "village_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            contract_indicator_id: row.get("contract_indicator_id")?,
            village_id: row.get("village_id")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![Box::new(self.contract_indicator_id), Box::new(self.village_id)]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        ensure_exists(
            conn,
            ContractIndicator::TABLE,
            ContractIndicator::ENTITY,
            self.contract_indicator_id,
        )?;
        ensure_exists(conn, Village::TABLE, Village::ENTITY, self.village_id)
    }
}

fn contract_of_indicator(conn: &Connection, contract_indicator_id: i64) -> AppResult<i64> {
    let ci: ContractIndicator = crate::db::repo::find(conn, contract_indicator_id)?.ok_or_else(|| {
        AppError::validation(
            ContractIndicatorProgress::ENTITY,
            "contract_indicator_id",
            format!("contract indicator {} does not exist", contract_indicator_id),
        )
    })?;
    Ok(ci.contract_id)
}

impl Record for ContractIndicatorProgress {
    const TABLE: &'static str = "contract_indicator_progress";
    const ENTITY: &'static str = "indicator progress";
    const MENU: MenuKey = MenuKey::Indicators;
    const COLUMNS: &'static [&'static str] =
        &["contract_indicator_id", "work_progress_id", "value", "notes"];
    const FILTERS: &'static [&'static str] = &["contract_indicator_id", "work_progress_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            contract_indicator_id: row.get("contract_indicator_id")?,
            work_progress_id: row.get("work_progress_id")?,
            value: decimal(row, "value")?,
            notes: row.get("notes")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.contract_indicator_id),
            Box::new(self.work_progress_id),
            Box::new(decimal_text(self.value)),
            Box::new(self.notes.clone()),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        self.validate()?;
        let contract_id = contract_of_indicator(conn, self.contract_indicator_id)?;
        let (report_contract, _) = queries::work_progress_state(conn, self.work_progress_id)
            .map_err(|_| {
                AppError::validation(
                    Self::ENTITY,
                    "work_progress_id",
                    format!("work progress {} does not exist", self.work_progress_id),
                )
            })?;
        if report_contract != contract_id {
            return Err(AppError::validation(
                Self::ENTITY,
                "work_progress_id",
                "belongs to another contract",
            ));
        }
        queries::ensure_work_progress_editable(conn, self.work_progress_id, "record progress on")
    }

    fn after_write(&self, previous: Option<&Self>, conn: &Connection) -> AppResult<()> {
        if let Some(previous) = previous {
            if previous.work_progress_id != self.work_progress_id {
                queries::ensure_work_progress_editable(
                    conn,
                    previous.work_progress_id,
                    "move progress away from",
                )?;
            }
            if previous.contract_indicator_id != self.contract_indicator_id {
                queries::refresh_contract_indicator(conn, previous.contract_indicator_id)?;
            }
        }
        queries::refresh_progress_value(conn, self.id, false)
    }

    fn before_delete(&self, conn: &Connection) -> AppResult<()> {
        queries::ensure_work_progress_editable(conn, self.work_progress_id, "remove progress from")
    }

    fn after_delete(&self, conn: &Connection) -> AppResult<()> {
        queries::refresh_contract_indicator(conn, self.contract_indicator_id)
    }
}

fn ensure_progress_open(conn: &Connection, progress_id: i64) -> AppResult<()> {
    let (_, work_progress_id) = queries::progress_parents(conn, progress_id).map_err(|_| {
        AppError::validation(
            IndicatorProgressItem::ENTITY,
            "progress_id",
            format!("indicator progress {} does not exist", progress_id),
        )
    })?;
    queries::ensure_work_progress_editable(conn, work_progress_id, "change checklist of")
}

impl Record for IndicatorProgressItem {
    const TABLE: &'static str = "indicator_progress_items";
    const ENTITY: &'static str = "progress item";
    const MENU: MenuKey = MenuKey::Indicators;
    const COLUMNS: &'static [&'static str] = &[
        "progress_id",
        "item_type",
        "village_id",
        "school_id",
        "health_facility_id",
        "is_completed",
        "numeric_value",
        "notes",
    ];
    const FILTERS: &'static [&'static str] = &["progress_id", "item_type", "is_completed"];
    const BOOL_FILTERS: &'static [&'static str] = &["is_completed"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let item_type: String = row.get("item_type")?;
        let target = ProgressItemTarget::from_columns(
            &item_type,
            row.get("village_id")?,
            row.get("school_id")?,
            row.get("health_facility_id")?,
        )
        .ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(AppError::Database {
                    message: format!("progress item has inconsistent target '{}'", item_type),
                }),
            )
        })?;
        Ok(Self {
            id: row.get("id")?,
            progress_id: row.get("progress_id")?,
            target,
            is_completed: row.get("is_completed")?,
            numeric_value: optional_decimal(row, "numeric_value")?,
            notes: row.get("notes")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        let (village_id, school_id, health_facility_id) = self.target.columns();
        vec![
            Box::new(self.progress_id),
            Box::new(self.target.item_type()),
            Box::new(village_id),
            Box::new(school_id),
            Box::new(health_facility_id),
            Box::new(self.is_completed),
            Box::new(optional_decimal_text(self.numeric_value)),
            Box::new(self.notes.clone()),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        self.validate()?;
        ensure_progress_open(conn, self.progress_id)?;
        match self.target {
            ProgressItemTarget::Village(id) => {
                ensure_exists(conn, Village::TABLE, Village::ENTITY, id)
            }
            ProgressItemTarget::School(id) => ensure_exists(conn, School::TABLE, School::ENTITY, id),
            ProgressItemTarget::HealthFacility(id) => {
                ensure_exists(conn, HealthFacility::TABLE, HealthFacility::ENTITY, id)
            }
        }
    }

    fn after_write(&self, previous: Option<&Self>, conn: &Connection) -> AppResult<()> {
        if let Some(previous) = previous {
            if previous.progress_id != self.progress_id {
                ensure_progress_open(conn, previous.progress_id)?;
                queries::refresh_progress_value(conn, previous.progress_id, true)?;
            }
        }
        queries::refresh_progress_value(conn, self.progress_id, false)
    }

    fn before_delete(&self, conn: &Connection) -> AppResult<()> {
        ensure_progress_open(conn, self.progress_id)
    }

    fn after_delete(&self, conn: &Connection) -> AppResult<()> {
        queries::refresh_progress_value(conn, self.progress_id, true)
    }
}
