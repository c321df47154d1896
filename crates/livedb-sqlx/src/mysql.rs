//! MySQL / MariaDB driver.

use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use livedb_core::{
    Connection, Database, Dialect, DriverError, DriverErrorKind, ExecResult, MySqlDialect, Row,
    SqlValue,
};
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, MySql, MySqlConnection, Row as _, TypeInfo, ValueRef};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::DbConfig;
use crate::error::{connect_error, driver_error, with_deadline};
use crate::statement::NamedStatement;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single MySQL connection.
#[derive(Debug)]
pub struct MySqlDriver {
    conn: Mutex<MySqlConnection>,
    dialect: MySqlDialect,
    last_id: AtomicI64,
    statement_timeout: Option<Duration>,
}

impl MySqlDriver {
    /// Connects to the server named by `config.url` using
    /// `config.charset`.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverErrorKind::Connection`] error if the URL is
    /// invalid or the server refuses the connection, and
    /// [`DriverErrorKind::Timeout`] if it does not answer within the
    /// connect timeout.
    pub async fn connect(config: &DbConfig) -> Result<Self, DriverError> {
        let options = MySqlConnectOptions::from_str(&config.url)
            .map_err(|e| DriverError::new(DriverErrorKind::Connection, e))?
            .charset(&config.charset);
        let conn = with_deadline(Some(config.connect_timeout()), options.connect())
            .await
            .map_err(connect_error)?;
        info!(backend = "mysql", charset = %config.charset, "database connection established");
        Ok(Self {
            conn: Mutex::new(conn),
            dialect: MySqlDialect::new(),
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
    mut query: Query<'q, MySql, MySqlArguments>,
    values: &[&SqlValue],
) -> Query<'q, MySql, MySqlArguments> {
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

fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> Result<SqlValue, sqlx::Error> {
    let value = match type_name {
        "BOOLEAN" => SqlValue::Bool(row.try_get(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            SqlValue::Int(row.try_get(index)?)
        }
        name if name.ends_with("UNSIGNED") => {
            let n: u64 = row.try_get_unchecked(index)?;
            i64::try_from(n).map_or_else(|_| SqlValue::Text(n.to_string()), SqlValue::Int)
        }
        "FLOAT" => SqlValue::Float(f64::from(row.try_get::<f32, _>(index)?)),
        "DOUBLE" => SqlValue::Float(row.try_get(index)?),
        "DATE" => SqlValue::Text(row.try_get::<NaiveDate, _>(index)?.to_string()),
        "DATETIME" => SqlValue::Text(
            row.try_get::<NaiveDateTime, _>(index)?
                .format(DATETIME_FORMAT)
                .to_string(),
        ),
        "TIMESTAMP" => SqlValue::Text(
            row.try_get::<DateTime<Utc>, _>(index)?
                .format(DATETIME_FORMAT)
                .to_string(),
        ),
        "TIME" => SqlValue::Text(row.try_get::<NaiveTime, _>(index)?.to_string()),
        "YEAR" => SqlValue::Int(i64::from(row.try_get_unchecked::<u16, _>(index)?)),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT" => {
            let bytes: Vec<u8> = row.try_get_unchecked(index)?;
            SqlValue::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => SqlValue::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}

fn decode_row(row: &MySqlRow) -> Result<Row, DriverError> {
    let mut out = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index).map_err(driver_error)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            decode_column(row, index, column.type_info().name()).map_err(driver_error)?
        };
        out.push(column.name(), value);
    }
    Ok(out)
}

impl Connection for MySqlDriver {
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
        let last_insert_id = i64::try_from(result.last_insert_id()).unwrap_or(i64::MAX);
        if last_insert_id != 0 {
            self.last_id.store(last_insert_id, Ordering::Relaxed);
        }
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
