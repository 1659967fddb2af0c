//! The database seam.
//!
//! The engine never talks to a driver directly. A driver crate implements
//! [`Database`] and [`Transaction`] for its connection type and hands the
//! engine a `&mut impl Database`.

use crate::error::DatabaseError;

/// A dialect-neutral SQL value used for parameters and result rows.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// Floating point number.
    Real(f64),
    /// Text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Get the value as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Check for NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One result row, columns in select order.
pub type SqlRow = Vec<SqlValue>;

/// An open transaction.
///
/// Dropping a transaction without calling [`Transaction::commit`] must roll
/// it back.
pub trait Transaction {
    /// Execute a batch of `;`-separated statements without parameters.
    fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError>;

    /// Execute a single statement with positional parameters, returning the
    /// number of affected rows.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, DatabaseError>;

    /// Run a query with positional parameters and collect every row.
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, DatabaseError>;

    /// Commit the transaction.
    fn commit(self) -> Result<(), DatabaseError>;

    /// Roll the transaction back.
    fn rollback(self) -> Result<(), DatabaseError>;
}

/// A database capable of opening transactions.
pub trait Database {
    /// Transaction type borrowed from this database.
    type Transaction<'a>: Transaction
    where
        Self: 'a;

    /// Begin a new transaction.
    fn begin(&mut self) -> Result<Self::Transaction<'_>, DatabaseError>;
}
