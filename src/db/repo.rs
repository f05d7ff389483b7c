//! Generic, transactional CRUD over any [`Record`].
//!
//! Writes run the record's hooks inside one transaction, so a hook that
//! fails (or a derived value that cannot be refreshed) rolls the whole
//! write back. Every write returns the row as stored.

use rusqlite::{Connection, OptionalExtension, params_from_iter};
use tracing::debug;

use crate::error::{AppError, AppResult};

use super::record::{Record, WriteContext};

/// Lists records, optionally filtered by equality on [`Record::FILTERS`].
///
/// Filter values are bound as text; SQLite applies the column affinity, so
/// `("contract_id", "4")` matches the integer column. On
/// [`Record::BOOL_FILTERS`] columns `true` and `false` match the stored flags.
pub fn list<T: Record>(conn: &Connection, filters: &[(String, String)]) -> AppResult<Vec<T>> {
    let mut sql = format!("SELECT * FROM {}", T::TABLE);
    let mut values = Vec::with_capacity(filters.len());
    for (index, (column, value)) in filters.iter().enumerate() {
        if !T::FILTERS.contains(&column.as_str()) {
            return Err(AppError::validation(
                T::ENTITY,
                column.clone(),
                format!("cannot filter {} by this field", T::ENTITY),
            ));
        }
        sql.push_str(if index == 0 { " WHERE " } else { " AND " });
        sql.push_str(&format!("{} = ?{}", column, index + 1));
        let is_flag = T::BOOL_FILTERS.contains(&column.as_str());
        values.push(match value.as_str() {
            "true" if is_flag => "1",
            "false" if is_flag => "0",
            other => other,
        });
    }
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), |row| T::from_row(row))?;
    let records = rows.collect::<rusqlite::Result<Vec<T>>>()?;
    Ok(records)
}

/// Finds a record by id.
pub fn find<T: Record>(conn: &Connection, id: i64) -> AppResult<Option<T>> {
    let sql = format!("SELECT * FROM {} WHERE id = ?1", T::TABLE);
    let record = conn.query_row(&sql, [id], |row| T::from_row(row)).optional()?;
    Ok(record)
}

/// Gets a record by id, or `NotFound`.
pub fn get<T: Record>(conn: &Connection, id: i64) -> AppResult<T> {
    find(conn, id)?.ok_or_else(|| AppError::not_found(T::ENTITY, id))
}

/// Inserts a new record and returns it as stored.
pub fn insert<T: Record>(conn: &mut Connection, mut record: T, ctx: &WriteContext) -> AppResult<T> {
    let tx = conn.transaction()?;
    record.before_insert(ctx);
    record.check(&tx)?;

    let placeholders = (1..=T::COLUMNS.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        T::COLUMNS.join(", "),
        placeholders
    );
    let values = record.to_values();
    tx.execute(&sql, params_from_iter(values.iter()))?;
    record.set_id(tx.last_insert_rowid());

    record.after_write(None, &tx)?;
    let stored = get::<T>(&tx, record.id())?;
    tx.commit()?;
    debug!(table = T::TABLE, id = stored.id(), "Inserted record");
    Ok(stored)
}

/// Replaces the record with `id` and returns it as stored.
pub fn update<T: Record>(
    conn: &mut Connection,
    id: i64,
    mut record: T,
    ctx: &WriteContext,
) -> AppResult<T> {
    let tx = conn.transaction()?;
    let existing = get::<T>(&tx, id)?;
    record.set_id(id);
    record.before_update(&existing, ctx)?;
    record.check(&tx)?;

    let assignments = T::COLUMNS
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ?{}", column, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        T::TABLE,
        assignments,
        T::COLUMNS.len() + 1
    );
    let mut values = record.to_values();
    values.push(Box::new(id));
    tx.execute(&sql, params_from_iter(values.iter()))?;

    record.after_write(Some(&existing), &tx)?;
    let stored = get::<T>(&tx, id)?;
    tx.commit()?;
    debug!(table = T::TABLE, id, "Updated record");
    Ok(stored)
}

/// Deletes the record with `id` (and whatever the schema cascades to).
///
/// Returns the deleted record.
pub fn delete<T: Record>(conn: &mut Connection, id: i64) -> AppResult<T> {
    let tx = conn.transaction()?;
    let existing = get::<T>(&tx, id)?;
    existing.before_delete(&tx)?;
    tx.execute(&format!("DELETE FROM {} WHERE id = ?1", T::TABLE), [id])?;
    existing.after_delete(&tx)?;
    tx.commit()?;
    debug!(table = T::TABLE, id, "Deleted record");
    Ok(existing)
}
