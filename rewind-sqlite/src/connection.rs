//! SQLite implementation of the engine's database seam.

use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use tracing::{debug, trace};

use rewind_migrate::{Database, DatabaseError, SqlRow, SqlValue, Transaction};

use crate::config::{DatabasePath, SqliteConfig, TransactionMode};
use crate::error::{SqliteResult, to_database_error};

/// Open a blocking connection and apply the configured pragmas.
pub fn open_blocking(config: &SqliteConfig) -> SqliteResult<Connection> {
    let conn = match &config.path {
        DatabasePath::Memory => Connection::open_in_memory()?,
        DatabasePath::File(path) => Connection::open(path)?,
    };

    conn.execute_batch(&config.init_sql())?;
    debug!(path = %config.path.display(), "Opened SQLite database");
    Ok(conn)
}

/// A borrowed connection the engine can open transactions on.
pub struct SqliteDatabase<'c> {
    conn: &'c mut Connection,
    mode: TransactionMode,
}

impl<'c> SqliteDatabase<'c> {
    /// Wrap a connection using the default transaction mode.
    pub fn new(conn: &'c mut Connection) -> Self {
        Self::with_mode(conn, TransactionMode::default())
    }

    /// Wrap a connection with an explicit transaction mode.
    pub fn with_mode(conn: &'c mut Connection, mode: TransactionMode) -> Self {
        Self { conn, mode }
    }
}

impl Database for SqliteDatabase<'_> {
    type Transaction<'a>
        = SqliteTransaction<'a>
    where
        Self: 'a;

    fn begin(&mut self) -> Result<SqliteTransaction<'_>, DatabaseError> {
        trace!(mode = ?self.mode, "BEGIN");
        self.conn
            .transaction_with_behavior(self.mode.behavior())
            .map(SqliteTransaction)
            .map_err(to_database_error)
    }
}

/// An open SQLite transaction. Rolls back on drop.
pub struct SqliteTransaction<'c>(rusqlite::Transaction<'c>);

impl Transaction for SqliteTransaction<'_> {
    fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
        debug!(sql = %sql, "Executing batch");
        self.0.execute_batch(sql).map_err(to_database_error)
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, DatabaseError> {
        trace!(sql = %sql, params = params.len(), "Executing statement");
        self.0
            .execute(sql, params_from_iter(params.iter().map(to_sqlite_value)))
            .map_err(to_database_error)
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, DatabaseError> {
        trace!(sql = %sql, params = params.len(), "Executing query");
        let mut stmt = self.0.prepare(sql).map_err(to_database_error)?;
        let width = stmt.column_count();

        let mut rows = stmt
            .query(params_from_iter(params.iter().map(to_sqlite_value)))
            .map_err(to_database_error)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().map_err(to_database_error)? {
            let values = (0..width)
                .map(|i| row.get::<_, Value>(i).map(from_sqlite_value))
                .collect::<Result<SqlRow, _>>()
                .map_err(to_database_error)?;
            results.push(values);
        }
        Ok(results)
    }

    fn commit(self) -> Result<(), DatabaseError> {
        trace!("COMMIT");
        self.0.commit().map_err(to_database_error)
    }

    fn rollback(self) -> Result<(), DatabaseError> {
        trace!("ROLLBACK");
        self.0.rollback().map_err(to_database_error)
    }
}

fn to_sqlite_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(v) => Value::Integer(*v),
        SqlValue::Real(v) => Value::Real(*v),
        SqlValue::Text(v) => Value::Text(v.clone()),
        SqlValue::Blob(v) => Value::Blob(v.clone()),
    }
}

fn from_sqlite_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(v),
        Value::Real(v) => SqlValue::Real(v),
        Value::Text(v) => SqlValue::Text(v),
        Value::Blob(v) => SqlValue::Blob(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        open_blocking(&SqliteConfig::memory()).unwrap()
    }

    #[test]
    fn test_open_applies_pragmas() {
        let conn = memory();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_commit_persists() {
        let mut conn = memory();
        let mut db = SqliteDatabase::new(&mut conn);

        let mut tx = db.begin().unwrap();
        tx.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);")
            .unwrap();
        let n = tx
            .execute("INSERT INTO t (id, name) VALUES (?, ?)", &[SqlValue::Integer(1), "a".into()])
            .unwrap();
        assert_eq!(n, 1);
        tx.commit().unwrap();

        let mut tx = db.begin().unwrap();
        let rows = tx.query("SELECT id, name FROM t", &[]).unwrap();
        assert_eq!(rows, vec![vec![SqlValue::Integer(1), SqlValue::from("a")]]);
        tx.rollback().unwrap();
    }

    #[test]
    fn test_rollback_and_drop_discard() {
        let mut conn = memory();
        let mut db = SqliteDatabase::new(&mut conn);

        let mut tx = db.begin().unwrap();
        tx.execute_batch("CREATE TABLE a (id INTEGER);").unwrap();
        tx.rollback().unwrap();

        {
            let mut tx = db.begin().unwrap();
            tx.execute_batch("CREATE TABLE b (id INTEGER);").unwrap();
        }

        let mut tx = db.begin().unwrap();
        let rows = tx
            .query("SELECT name FROM sqlite_master WHERE type = 'table'", &[])
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_query_with_params_and_nulls() {
        let mut conn = memory();
        let mut db = SqliteDatabase::with_mode(&mut conn, TransactionMode::Deferred);
        let mut tx = db.begin().unwrap();
        tx.execute_batch(
            "CREATE TABLE t (id INTEGER, note TEXT, score REAL, raw BLOB);
             INSERT INTO t VALUES (1, NULL, 1.5, x'00ff'), (2, 'b', NULL, NULL);",
        )
        .unwrap();

        let rows = tx
            .query("SELECT id, note, score, raw FROM t WHERE id = ?", &[SqlValue::Integer(1)])
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![
                SqlValue::Integer(1),
                SqlValue::Null,
                SqlValue::Real(1.5),
                SqlValue::Blob(vec![0, 255]),
            ]]
        );
    }

    #[test]
    fn test_constraint_errors_are_classified() {
        let mut conn = memory();
        let mut db = SqliteDatabase::new(&mut conn);
        let mut tx = db.begin().unwrap();
        tx.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY);").unwrap();
        tx.execute("INSERT INTO t (id) VALUES (?)", &[SqlValue::Integer(1)]).unwrap();

        let err = tx
            .execute("INSERT INTO t (id) VALUES (?)", &[SqlValue::Integer(1)])
            .unwrap_err();
        assert!(err.is_constraint());

        let err = tx.execute_batch("NOT SQL").unwrap_err();
        assert!(!err.is_constraint());
    }
}
