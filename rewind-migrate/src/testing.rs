//! In-memory executor for unit tests.
//!
//! Understands exactly the statements [`HistoryStore`](crate::history::HistoryStore)
//! issues; every other batch is appended to a log, or fails if it contains
//! `FAIL`.

use std::collections::BTreeMap;

use crate::error::DatabaseError;
use crate::executor::{Database, SqlRow, SqlValue, Transaction};

#[derive(Debug, Clone, Default)]
pub(crate) struct State {
    pub history: Option<BTreeMap<i64, SqlRow>>,
    pub log: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryDatabase {
    pub state: State,
    pub commits: usize,
    pub rollbacks: usize,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> &[String] {
        &self.state.log
    }

    pub fn applied_ids(&self) -> Vec<i64> {
        self.state
            .history
            .as_ref()
            .map(|rows| rows.keys().copied().collect())
            .unwrap_or_default()
    }
}

pub(crate) struct MemoryTransaction<'a> {
    db: &'a mut MemoryDatabase,
    working: State,
}

impl Database for MemoryDatabase {
    type Transaction<'a> = MemoryTransaction<'a>;

    fn begin(&mut self) -> Result<MemoryTransaction<'_>, DatabaseError> {
        let working = self.state.clone();
        Ok(MemoryTransaction { db: self, working })
    }
}

impl MemoryTransaction<'_> {
    fn history(&mut self) -> Result<&mut BTreeMap<i64, SqlRow>, DatabaseError> {
        self.working
            .history
            .as_mut()
            .ok_or_else(|| DatabaseError::other("no such table: __migration"))
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
        if sql.contains("created_at DATETIME DEFAULT CURRENT_TIMESTAMP") {
            self.working.history.get_or_insert_with(BTreeMap::new);
            return Ok(());
        }
        if sql.contains("FAIL") {
            return Err(DatabaseError::other(format!("simulated failure in: {}", sql)));
        }
        self.working.log.push(sql.to_string());
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, DatabaseError> {
        let key = params.first().and_then(SqlValue::as_i64).unwrap_or_default();
        let history = self.history()?;

        if sql.starts_with("INSERT INTO") {
            if history.contains_key(&key) {
                return Err(DatabaseError::constraint("UNIQUE constraint failed: id"));
            }
            let mut row = params.to_vec();
            row.push(SqlValue::from("2024-01-01 00:00:00"));
            history.insert(key, row);
            Ok(1)
        } else if sql.starts_with("DELETE FROM") {
            Ok(usize::from(history.remove(&key).is_some()))
        } else {
            Err(DatabaseError::other(format!("unsupported statement: {}", sql)))
        }
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, DatabaseError> {
        let history = self.history()?;
        if sql.contains("WHERE id = ?") {
            let key = params.first().and_then(SqlValue::as_i64).unwrap_or_default();
            return Ok(history.get(&key).cloned().into_iter().collect());
        }
        Ok(history.values().cloned().collect())
    }

    fn commit(self) -> Result<(), DatabaseError> {
        self.db.state = self.working;
        self.db.commits += 1;
        Ok(())
    }

    fn rollback(self) -> Result<(), DatabaseError> {
        self.db.rollbacks += 1;
        Ok(())
    }
}
