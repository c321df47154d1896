//! SQLite driver.

use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use livedb_core::{
    Connection, Database, Dialect, DriverError, DriverErrorKind, ExecResult, Row, SqlValue,
    SqliteDialect,
};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteRow};
use sqlx::{Column, ConnectOptions, Row as _, Sqlite, SqliteConnection, TypeInfo, ValueRef};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::DbConfig;
use crate::error::{connect_error, driver_error, with_deadline};
use crate::statement::NamedStatement;

/// A single SQLite connection.
///
/// Statements run one at a time; concurrent callers wait on an internal
/// lock.
#[derive(Debug)]
pub struct SqliteDriver {
    conn: Mutex<SqliteConnection>,
    dialect: SqliteDialect,
    last_id: AtomicI64,
    statement_timeout: Option<Duration>,
}

impl SqliteDriver {
    /// Opens the database named by `config.url`, creating the file if
    /// needed. Foreign keys are enforced.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverErrorKind::Connection`] error if the URL is
    /// invalid or the database cannot be opened, and
    /// [`DriverErrorKind::Timeout`] if opening takes longer than the
    /// connect timeout.
    pub async fn connect(config: &DbConfig) -> Result<Self, DriverError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DriverError::new(DriverErrorKind::Connection, e))?
            .create_if_missing(true)
            .foreign_keys(true);
        let conn = with_deadline(Some(config.connect_timeout()), options.connect())
            .await
            .map_err(connect_error)?;
        info!(backend = "sqlite", "database connection established");
        Ok(Self {
            conn: Mutex::new(conn),
            dialect: SqliteDialect::new(),
            last_id: AtomicI64::new(0),
            statement_timeout: config.statement_timeout(),
        })
    }

    /// Connects and wraps the driver in a [`Database`] configured from
    /// `config`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::connect`].
    pub async fn open(config: &DbConfig) -> Result<Database<Self>, DriverError> {
        Ok(config.database(Self::connect(config).await?))
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: &[&SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(n) => query.bind(*n),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.clone()),
        };
    }
    query
}

fn decode_row(row: &SqliteRow) -> Result<Row, DriverError> {
    let mut out = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let storage = {
            let raw = row.try_get_raw(index).map_err(driver_error)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_owned())
            }
        };
        let value = match storage.as_deref() {
            None => SqlValue::Null,
            Some("INTEGER" | "BOOLEAN") => SqlValue::Int(row.try_get(index).map_err(driver_error)?),
            Some("REAL") => SqlValue::Float(row.try_get(index).map_err(driver_error)?),
            Some("BLOB") => {
                let bytes: Vec<u8> = row.try_get(index).map_err(driver_error)?;
                SqlValue::Text(String::from_utf8_lossy(&bytes).into_owned())
            }
            Some(_) => SqlValue::Text(row.try_get_unchecked(index).map_err(driver_error)?),
        };
        out.push(column.name(), value);
    }
    Ok(out)
}

impl Connection for SqliteDriver {
    type Statement = NamedStatement;

    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn prepare(&self, sql: &str) -> Result<NamedStatement, DriverError> {
        Ok(NamedStatement::new(sql))
    }

    async fn execute(&self, statement: NamedStatement) -> Result<ExecResult, DriverError> {
        let arguments = statement.arguments()?;
        let mut conn = self.conn.lock().await;
        let query = bind_all(sqlx::query(statement.compiled()), &arguments);
        let result = with_deadline(self.statement_timeout, query.execute(&mut *conn)).await?;
        let last_insert_id = result.last_insert_rowid();
        self.last_id.store(last_insert_id, Ordering::Relaxed);
        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id,
        })
    }

    async fn fetch_all(&self, statement: NamedStatement) -> Result<Vec<Row>, DriverError> {
        let arguments = statement.arguments()?;
        let mut conn = self.conn.lock().await;
        let query = bind_all(sqlx::query(statement.compiled()), &arguments);
        let rows = with_deadline(self.statement_timeout, query.fetch_all(&mut *conn)).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn exec(&self, sql: &str) -> Result<u64, DriverError> {
        let mut conn = self.conn.lock().await;
        let result = with_deadline(
            self.statement_timeout,
            sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(sql)),
        )
        .await?;
        Ok(result.rows_affected())
    }

    fn last_insert_id(&self) -> i64 {
        self.last_id.load(Ordering::Relaxed)
    }

    async fn begin(&self) -> Result<(), DriverError> {
        self.exec(self.dialect.begin_transaction())
            .await
            .map(|_| ())
    }

    async fn commit(&self) -> Result<(), DriverError> {
        self.exec("commit").await.map(|_| ())
    }

    async fn rollback(&self) -> Result<(), DriverError> {
        self.exec("rollback").await.map(|_| ())
    }
}
