//! The mapping between model structs and table rows.
//!
//! Every persisted model implements [`Record`]: its table, its column list
//! and how a row converts to and from the struct. The generic repository in
//! [`super::repo`] turns that into list/get/insert/update/delete, running the
//! record's hooks inside the write transaction.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, ToSql};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};
use crate::models::{LocalizedText, MenuKey};

/// Who is writing and when.
#[derive(Debug, Clone, Copy)]
pub struct WriteContext {
    /// Acting user.
    pub actor_id: i64,
    /// Time of the write.
    pub now: DateTime<Utc>,
}

impl WriteContext {
    /// A context for `actor_id` at the current time.
    pub fn now(actor_id: i64) -> Self {
        Self {
            actor_id,
            now: Utc::now(),
        }
    }
}

/// A model stored as one row of one table.
pub trait Record: Sized + Send + 'static {
    /// Table name.
    const TABLE: &'static str;
    /// Human-readable entity name for messages.
    const ENTITY: &'static str;
    /// Menu section whose permissions gate the record.
    const MENU: MenuKey;
    /// Every column except `id`, in the order of [`Record::to_values`].
    const COLUMNS: &'static [&'static str];
    /// Columns a list may be filtered on.
    const FILTERS: &'static [&'static str] = &[];
    /// Filter columns holding booleans, matched by `true` / `false`.
    const BOOL_FILTERS: &'static [&'static str] = &[];

    /// Row identifier.
    fn id(&self) -> i64;

    /// Sets the row identifier.
    fn set_id(&mut self, id: i64);

    /// Builds the record from a `SELECT *` row.
    fn from_row(row: &Row) -> rusqlite::Result<Self>;

    /// Column values, in the order of [`Record::COLUMNS`].
    fn to_values(&self) -> Vec<Box<dyn ToSql>>;

    /// Validation run before every insert and update.
    fn check(&self, _conn: &Connection) -> AppResult<()> {
        Ok(())
    }

    /// Adjusts a new record before it is validated and stored.
    fn before_insert(&mut self, _ctx: &WriteContext) {}

    /// Adjusts an edited record against the stored one.
    fn before_update(&mut self, _existing: &Self, _ctx: &WriteContext) -> AppResult<()> {
        Ok(())
    }

    /// Refuses a deletion.
    fn before_delete(&self, _conn: &Connection) -> AppResult<()> {
        Ok(())
    }

    /// Runs after an insert (`previous` is `None`) or an update.
    fn after_write(&self, _previous: Option<&Self>, _conn: &Connection) -> AppResult<()> {
        Ok(())
    }

    /// Runs after the row (and its cascades) was deleted.
    fn after_delete(&self, _conn: &Connection) -> AppResult<()> {
        Ok(())
    }
}

fn conversion_error(column: &str, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        Type::Text,
        Box::new(AppError::Database {
            message: format!("column '{}': {}", column, message),
        }),
    )
}

/// Rounds a money or indicator value to the stored precision.
pub fn round_value(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// Stored text of a decimal (two decimal places).
pub fn decimal_text(value: Decimal) -> String {
    round_value(value).to_string()
}

/// Stored text of an optional decimal.
pub fn optional_decimal_text(value: Option<Decimal>) -> Option<String> {
    value.map(decimal_text)
}

/// Reads an exact decimal stored as text.
pub fn decimal(row: &Row, column: &str) -> rusqlite::Result<Decimal> {
    let text: String = row.get(column)?;
    Decimal::from_str(&text).map_err(|e| conversion_error(column, e.to_string()))
}

/// Reads an optional exact decimal stored as text.
pub fn optional_decimal(row: &Row, column: &str) -> rusqlite::Result<Option<Decimal>> {
    let text: Option<String> = row.get(column)?;
    text.map(|t| Decimal::from_str(&t).map_err(|e| conversion_error(column, e.to_string())))
        .transpose()
}

/// Stored text of a snake-case enum (its serde name).
pub fn enum_text<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(text)) => text,
        _ => String::new(),
    }
}

/// Parses stored enum text back into the enum.
pub fn parse_enum<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(text.to_string())).ok()
}

/// Reads a snake-case enum column.
pub fn enum_column<T: DeserializeOwned>(row: &Row, column: &str) -> rusqlite::Result<T> {
    let text: String = row.get(column)?;
    parse_enum(&text).ok_or_else(|| conversion_error(column, format!("unknown value '{}'", text)))
}

/// Reads an optional snake-case enum column.
pub fn optional_enum_column<T: DeserializeOwned>(
    row: &Row,
    column: &str,
) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(column)?;
    text.map(|t| {
        parse_enum(&t).ok_or_else(|| conversion_error(column, format!("unknown value '{}'", t)))
    })
    .transpose()
}

/// Reads the `<prefix>_ru`, `<prefix>_tj` and `<prefix>_en` columns.
pub fn localized(row: &Row, prefix: &str) -> rusqlite::Result<LocalizedText> {
    Ok(LocalizedText {
        ru: row.get(format!("{}_ru", prefix).as_str())?,
        tj: row.get(format!("{}_tj", prefix).as_str())?,
        en: row.get(format!("{}_en", prefix).as_str())?,
    })
}

/// Appends the three localized column values.
pub fn push_localized(values: &mut Vec<Box<dyn ToSql>>, text: &LocalizedText) {
    values.push(Box::new(text.ru.clone()));
    values.push(Box::new(text.tj.clone()));
    values.push(Box::new(text.en.clone()));
}

/// Fails with `Validation` unless a row with `id` exists in `table`.
pub fn ensure_exists(conn: &Connection, table: &str, entity: &str, id: i64) -> AppResult<()> {
    let found: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE id = ?1", table),
        [id],
        |row| row.get(0),
    )?;
    if found == 0 {
        return Err(AppError::validation(
            entity,
            format!("{}_id", entity.replace(' ', "_")),
            format!("{} {} does not exist", entity, id),
        ));
    }
    Ok(())
}
