//! Migration history tracking.
//!
//! The tracking table holds one row per applied migration. Every operation
//! here runs inside a transaction owned by the caller; nothing commits.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex_lite::Regex;

use crate::error::{MigrateResult, MigrationError};
use crate::executor::{SqlRow, SqlValue, Transaction};
use crate::migration::MigrationRecord;

/// Default tracking table name.
pub const DEFAULT_TABLE_NAME: &str = "__migration";

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern is valid")
});

/// A validated tracking table name.
///
/// Table names cannot be bound as parameters, so this is the only identifier
/// interpolated into SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Validate a table name.
    pub fn new(name: impl Into<String>) -> MigrateResult<Self> {
        let name = name.into();
        if IDENTIFIER.is_match(&name) {
            Ok(Self(name))
        } else {
            Err(MigrationError::InvalidTableName(name))
        }
    }

    /// The raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name quoted for interpolation.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_TABLE_NAME.to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The applied-state store.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    table: TableName,
}

impl HistoryStore {
    /// Create a store over the given table.
    pub fn new(table: TableName) -> Self {
        Self { table }
    }

    /// The tracking table name.
    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Create the tracking table if it does not exist.
    pub fn ensure_table<T: Transaction>(&self, tx: &mut T) -> MigrateResult<()> {
        tx.execute_batch(&self.create_table_sql())
            .map_err(|e| MigrationError::database("creating the tracking table", e))
    }

    /// All applied migrations, ascending by id.
    pub fn list<T: Transaction>(&self, tx: &mut T) -> MigrateResult<Vec<MigrationRecord>> {
        let sql = format!("{} ORDER BY id ASC", self.select_sql());
        let rows = tx
            .query(&sql, &[])
            .map_err(|e| MigrationError::database("reading the tracking table", e))?;

        rows.into_iter().map(row_to_record).collect()
    }

    /// A single applied migration.
    pub fn get<T: Transaction>(&self, tx: &mut T, id: u64) -> MigrateResult<Option<MigrationRecord>> {
        let Ok(key) = i64::try_from(id) else {
            return Ok(None);
        };
        let sql = format!("{} WHERE id = ?", self.select_sql());
        let rows = tx
            .query(&sql, &[SqlValue::Integer(key)])
            .map_err(|e| MigrationError::database("reading the tracking table", e))?;

        rows.into_iter().next().map(row_to_record).transpose()
    }

    /// Check that an id fits the tracking table's integer column.
    pub fn check_id(&self, record: &MigrationRecord) -> MigrateResult<i64> {
        i64::try_from(record.id).map_err(|_| {
            MigrationError::constraint(record, "id exceeds the signed 64-bit range of the tracking table")
        })
    }

    /// Record a migration as applied.
    pub fn insert<T: Transaction>(&self, tx: &mut T, record: &MigrationRecord) -> MigrateResult<()> {
        let key = self.check_id(record)?;

        let sql = format!(
            "INSERT INTO {} (id, name, filename, up, down) VALUES (?, ?, ?, ?, ?)",
            self.table.quoted()
        );
        let params = [
            SqlValue::Integer(key),
            SqlValue::from(record.name.as_str()),
            SqlValue::from(record.filename.as_str()),
            SqlValue::from(record.up.as_str()),
            SqlValue::from(record.down.as_str()),
        ];

        match tx.execute(&sql, &params) {
            Ok(_) => Ok(()),
            Err(e) if e.is_constraint() => Err(MigrationError::constraint(record, e.to_string())),
            Err(e) => Err(MigrationError::tracking("recording", record, e)),
        }
    }

    /// Remove the row for an applied migration.
    ///
    /// A missing row means the table changed under us and is an error.
    pub fn delete<T: Transaction>(&self, tx: &mut T, record: &MigrationRecord) -> MigrateResult<()> {
        let key = i64::try_from(record.id).map_err(|_| {
            MigrationError::consistency(format!(
                "migration {} cannot be in the tracking table\nmigration: {}",
                record.id,
                record.snapshot()
            ))
        })?;

        let sql = format!("DELETE FROM {} WHERE id = ?", self.table.quoted());
        let affected = tx
            .execute(&sql, &[SqlValue::Integer(key)])
            .map_err(|e| MigrationError::tracking("removing", record, e))?;

        if affected == 0 {
            return Err(MigrationError::consistency(format!(
                "tracking row for migration {} ({}) disappeared from '{}' during reconciliation\nmigration: {}",
                record.id,
                record.filename,
                self.table,
                record.snapshot()
            )));
        }
        Ok(())
    }

    fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    filename TEXT NOT NULL,
    up TEXT NOT NULL,
    down TEXT NOT NULL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);",
            self.table.quoted()
        )
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT id, name, filename, up, down, created_at FROM {}",
            self.table.quoted()
        )
    }
}

fn row_to_record(row: SqlRow) -> MigrateResult<MigrationRecord> {
    let [id, name, filename, up, down, created_at]: [SqlValue; 6] = row
        .try_into()
        .map_err(|row: SqlRow| {
            MigrationError::consistency(format!("tracking row has {} columns, expected 6", row.len()))
        })?;

    let id = id
        .as_i64()
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| MigrationError::consistency(format!("tracking row has invalid id {:?}", id)))?;

    let text = |value: SqlValue, column: &str| match value {
        SqlValue::Text(s) => Ok(s),
        other => Err(MigrationError::consistency(format!(
            "tracking row {} has non-text {}: {:?}",
            id, column, other
        ))),
    };

    let mut record = MigrationRecord::new(
        id,
        text(name, "name")?,
        text(filename, "filename")?,
        text(up, "up")?,
        text(down, "down")?,
    );
    record.applied_at = parse_timestamp(&created_at);
    Ok(record)
}

/// Read a `created_at` column.
///
/// SQLite's `CURRENT_TIMESTAMP` produces `YYYY-MM-DD HH:MM:SS` in UTC.
fn parse_timestamp(value: &SqlValue) -> Option<DateTime<Utc>> {
    match value {
        SqlValue::Text(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .map(|naive| naive.and_utc())
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))),
        SqlValue::Integer(secs) => DateTime::from_timestamp(*secs, 0),
        _ => None,
    }
}
