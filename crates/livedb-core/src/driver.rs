//! Driver contract.
//!
//! The builders only need a handful of operations from a database driver:
//! prepare a statement with named `:placeholders`, bind values by name,
//! execute or fetch, and manage transactions. `livedb-sqlx` provides the
//! SQLite and MySQL implementations.

use std::future::Future;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::dialect::Dialect;
use crate::error::DriverError;
use crate::types::ParamType;
use crate::value::SqlValue;

/// A prepared statement accepting named parameters.
pub trait Statement: Send {
    /// Returns the SQL text the statement was prepared from.
    fn sql(&self) -> &str;

    /// Binds `value` to `:placeholder`, interpreted as `param_type`.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement has no such placeholder or the
    /// value cannot be represented.
    fn bind_value(
        &mut self,
        placeholder: &str,
        value: &SqlValue,
        param_type: ParamType,
    ) -> Result<(), DriverError>;
}

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: i64,
}

/// A database connection.
///
/// One connection serves one statement at a time; implementations
/// serialize concurrent callers internally.
pub trait Connection: Send + Sync {
    type Statement: Statement;

    /// Returns the SQL dialect spoken by this connection.
    fn dialect(&self) -> &dyn Dialect;

    /// Prepares `sql` for binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared.
    fn prepare(&self, sql: &str) -> Result<Self::Statement, DriverError>;

    /// Executes a statement that returns no rows.
    fn execute(
        &self,
        statement: Self::Statement,
    ) -> impl Future<Output = Result<ExecResult, DriverError>> + Send;

    /// Executes a statement and collects every row.
    fn fetch_all(
        &self,
        statement: Self::Statement,
    ) -> impl Future<Output = Result<Vec<Row>, DriverError>> + Send;

    /// Runs a non-parameterized statement, returning the affected rows.
    fn exec(&self, sql: &str) -> impl Future<Output = Result<u64, DriverError>> + Send;

    /// Returns the id generated by the last successful insert.
    fn last_insert_id(&self) -> i64;

    fn begin(&self) -> impl Future<Output = Result<(), DriverError>> + Send;

    fn commit(&self) -> impl Future<Output = Result<(), DriverError>> + Send;

    fn rollback(&self) -> impl Future<Output = Result<(), DriverError>> + Send;
}

/// A fetched row: ordered column names with their values.
///
/// Columns are reachable by name or by position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column.
    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    /// Returns the value of the first column named `column`.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Returns the value at `index`.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, SqlValue)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
