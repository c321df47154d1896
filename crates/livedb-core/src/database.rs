//! The database handle.
//!
//! [`Database`] owns a driver connection together with the settings every
//! statement shares: the table prefix, the schema name used for column
//! lookups, the default error policy and the run hook. Builders borrow it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::builder::{
    apply_prefix, Create, Delete, ErrorPolicy, Insert, InsertUpdate, PreparedQuery, RunOptions,
    Select, Update,
};
use crate::driver::{Connection, ExecResult, Row, Statement};
use crate::error::Result;
use crate::hook::{AuditEntry, RunHook, RunOutcome, RunReport, AUDIT_INSERT};
use crate::types::ParamType;
use crate::value::SqlValue;

/// How a statement is executed and what its run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecMode {
    Rows,
    Count,
    InsertId,
    Done,
}

/// Result of [`Database::run_prepared`].
#[derive(Debug)]
pub(crate) enum Executed {
    Rows(Vec<Row>),
    Exec(ExecResult),
}

/// A database connection with its shared statement settings.
///
/// ```rust,ignore
/// let db = Database::new(driver).with_prefix("app");
/// let rows = db
///     .select("##users")
///     .where_add(Condition::new("id").value(7))?
///     .run(&RunOptions::default())
///     .await?;
/// ```
pub struct Database<C: Connection> {
    conn: C,
    prefix: Option<String>,
    database: Option<String>,
    policy: ErrorPolicy,
    on_run: Option<RunHook>,
}

impl<C: Connection> fmt::Debug for Database<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.conn.dialect().name())
            .field("prefix", &self.prefix)
            .field("database", &self.database)
            .field("policy", &self.policy)
            .field("on_run", &self.on_run.is_some())
            .finish()
    }
}

impl<C: Connection> Database<C> {
    /// Wraps an open connection.
    #[must_use]
    pub const fn new(conn: C) -> Self {
        Self {
            conn,
            prefix: None,
            database: None,
            policy: ErrorPolicy::Fail,
            on_run: None,
        }
    }

    /// Sets the value substituted for the `##` token in table names.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the schema consulted by [`Self::fields_get`].
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the error policy handed to new builders.
    #[must_use]
    pub const fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Installs a hook called after every successful run.
    #[must_use]
    pub fn on_run(mut self, hook: impl Fn(&RunReport<'_>) + Send + Sync + 'static) -> Self {
        self.on_run = Some(Arc::new(hook));
        self
    }

    /// Returns the underlying connection.
    pub const fn connection(&self) -> &C {
        &self.conn
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub const fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    #[must_use]
    pub fn select(&self, table: impl Into<String>) -> Select<'_, C> {
        Select::new(self, table.into())
    }

    #[must_use]
    pub fn insert(&self, table: impl Into<String>) -> Insert<'_, C> {
        Insert::new(self, table.into())
    }

    #[must_use]
    pub fn insert_update(&self, table: impl Into<String>) -> InsertUpdate<'_, C> {
        InsertUpdate::new(self, table.into())
    }

    #[must_use]
    pub fn update(&self, table: impl Into<String>) -> Update<'_, C> {
        Update::new(self, table.into())
    }

    #[must_use]
    pub fn delete(&self, table: impl Into<String>) -> Delete<'_, C> {
        Delete::new(self, table.into())
    }

    #[must_use]
    pub fn create(&self, table: impl Into<String>) -> Create<'_, C> {
        Create::new(self, table.into())
    }

    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the transaction cannot be started.
    pub async fn begin(&self) -> Result<()> {
        debug!("begin transaction");
        self.conn.begin().await?;
        Ok(())
    }

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the commit fails.
    pub async fn commit(&self) -> Result<()> {
        debug!("commit transaction");
        self.conn.commit().await?;
        Ok(())
    }

    /// Rolls back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the rollback fails.
    pub async fn rollback(&self) -> Result<()> {
        debug!("rollback transaction");
        self.conn.rollback().await?;
        Ok(())
    }

    /// Runs `f` inside a transaction: commits on `Ok`, rolls back and
    /// returns the error on `Err`.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f`, or a driver error from begin or
    /// commit.
    pub async fn transaction<'a, F, Fut, T>(&'a self, f: F) -> Result<T>
    where
        F: FnOnce(&'a Self) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.begin().await?;
        match f(self).await {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback) = self.rollback().await {
                    warn!(%rollback, "rollback failed");
                }
                Err(error)
            }
        }
    }

    /// Like [`Self::transaction`], but a failure inside `f` is rolled back
    /// and passed to `handler`, whose return value becomes the result.
    ///
    /// # Errors
    ///
    /// Returns a driver error from begin, commit or rollback.
    pub async fn transaction_with_handler<'a, F, Fut, T, H>(&'a self, f: F, handler: H) -> Result<T>
    where
        F: FnOnce(&'a Self) -> Fut,
        Fut: Future<Output = Result<T>>,
        H: FnOnce(crate::Error) -> T,
    {
        self.begin().await?;
        match f(self).await {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(error) => {
                self.rollback().await?;
                Ok(handler(error))
            }
        }
    }

    /// Empties `table`: `truncate` on MySQL, `delete from` on SQLite.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the statement fails.
    pub async fn truncate(&self, table: &str) -> Result<u64> {
        let sql = apply_prefix(&self.conn.dialect().truncate(table), self.prefix());
        let started = Instant::now();
        let affected = self.conn.exec(&sql).await?;
        let elapsed = started.elapsed();
        debug!(%sql, affected, "table truncated");
        self.notify(&RunReport {
            query: &sql,
            bindings: &[],
            outcome: RunOutcome::Count(affected),
            elapsed,
        });
        Ok(affected)
    }

    /// Returns the query listing the columns of `table`.
    ///
    /// Anything after the first space in `table` (an alias) is ignored.
    #[must_use]
    pub fn fields_get_sql(&self, table: &str, alias: Option<&str>) -> String {
        let table = table.split(' ').next().unwrap_or(table);
        let table = apply_prefix(table, self.prefix());
        self.conn
            .dialect()
            .columns_query(self.database.as_deref(), &table, alias)
    }

    /// Lists the columns of `table`, each prefixed with `alias.` if given.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the catalogue query fails.
    pub async fn fields_get(&self, table: &str, alias: Option<&str>) -> Result<Vec<String>> {
        let sql = self.fields_get_sql(table, alias);
        let statement = self.conn.prepare(&sql)?;
        let rows = self.conn.fetch_all(statement).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("COLUMN_NAME").and_then(SqlValue::as_str))
            .map(str::to_owned)
            .collect())
    }

    /// Prepares, binds and executes a rendered statement, then handles the
    /// debug dump, the audit entry and the run hook.
    pub(crate) async fn run_prepared(
        &self,
        query: &PreparedQuery,
        mode: ExecMode,
        options: &RunOptions,
    ) -> Result<Executed> {
        let mut statement = self.conn.prepare(&query.sql)?;
        for binding in &query.bindings {
            statement.bind_value(&binding.placeholder, &binding.value, binding.param_type)?;
        }

        let started = Instant::now();
        let executed = match mode {
            ExecMode::Rows => Executed::Rows(self.conn.fetch_all(statement).await?),
            ExecMode::Count | ExecMode::InsertId | ExecMode::Done => {
                Executed::Exec(self.conn.execute(statement).await?)
            }
        };
        let elapsed = started.elapsed();

        debug!(
            sql = %query.sql,
            binds = query.bindings.len(),
            elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            "statement executed"
        );
        if options.debug {
            info!(dump = %query, "statement dump");
        }
        if let Some(entry) = &options.log {
            self.write_audit(entry, &query.interpolated()).await?;
        }

        let outcome = match (&executed, mode) {
            (Executed::Rows(rows), _) => RunOutcome::Rows(rows),
            (Executed::Exec(result), ExecMode::Count) => RunOutcome::Count(result.rows_affected),
            (Executed::Exec(result), ExecMode::InsertId) => RunOutcome::Id(result.last_insert_id),
            (Executed::Exec(_), _) => RunOutcome::Done,
        };
        self.notify(&RunReport {
            query: &query.sql,
            bindings: &query.bindings,
            outcome,
            elapsed,
        });
        Ok(executed)
    }

    /// Runs a DDL or other non-parameterized statement.
    pub(crate) async fn run_plain(&self, sql: &str) -> Result<u64> {
        let started = Instant::now();
        let affected = self.conn.exec(sql).await?;
        let elapsed = started.elapsed();
        debug!(%sql, "statement executed");
        self.notify(&RunReport {
            query: sql,
            bindings: &[],
            outcome: RunOutcome::Done,
            elapsed,
        });
        Ok(affected)
    }

    async fn write_audit(&self, entry: &AuditEntry, query: &str) -> Result<()> {
        let text =
            |value: Option<&String>| value.map_or(SqlValue::Null, |v| SqlValue::from(v.as_str()));
        let mut statement = self.conn.prepare(AUDIT_INSERT)?;
        statement.bind_value(
            "time",
            &SqlValue::Int(Utc::now().timestamp()),
            ParamType::Int,
        )?;
        statement.bind_value("log", &SqlValue::Int(entry.event), ParamType::Int)?;
        statement.bind_value(
            "user",
            &entry.user.map_or(SqlValue::Null, SqlValue::Int),
            ParamType::Int,
        )?;
        statement.bind_value("agent", &text(entry.agent.as_ref()), ParamType::Str)?;
        statement.bind_value("ip", &text(entry.ip.as_ref()), ParamType::Str)?;
        statement.bind_value("query", &SqlValue::from(query), ParamType::Str)?;
        self.conn.execute(statement).await?;
        debug!(event = entry.event, "audit entry written");
        Ok(())
    }

    fn notify(&self, report: &RunReport<'_>) {
        if let Some(hook) = &self.on_run {
            hook(report);
        }
    }
}
