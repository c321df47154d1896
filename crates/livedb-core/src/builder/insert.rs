//! INSERT statement builder.

use super::select::Select;
use super::{apply_prefix, ErrorPolicy, PreparedQuery, Registry, RunOptions};
use crate::bind::{BindOptions, Binding, ParamBinder};
use crate::database::{Database, ExecMode, Executed};
use crate::driver::Connection;
use crate::error::{BuildError, Result};
use crate::field::FieldAssignment;
use crate::types::ParamType;
use crate::value::ToSqlValue;

/// An INSERT statement builder.
///
/// Adding a field that is already present replaces it in place. Every
/// bindable value must use its own placeholder.
#[derive(Debug)]
pub struct Insert<'db, C: Connection> {
    db: &'db Database<C>,
    table: String,
    fields: Vec<FieldAssignment>,
    registry: Registry,
}

impl<'db, C: Connection> Insert<'db, C> {
    pub(crate) fn new(db: &'db Database<C>, table: String) -> Self {
        Self {
            db,
            table,
            fields: Vec::new(),
            registry: Registry::new(db.policy()),
        }
    }

    #[must_use]
    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.registry.set_policy(policy);
        self
    }

    /// Adds a column value. Empty strings and nulls are written as `null`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicatePlaceholder`] under
    /// [`ErrorPolicy::Fail`] if another column already binds under the
    /// same placeholder.
    pub fn field_add(
        self,
        name: impl Into<String>,
        value: impl ToSqlValue,
        param_type: ParamType,
    ) -> Result<Self> {
        self.field(FieldAssignment::new(name, value, param_type))
    }

    /// Adds a prepared field assignment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::field_add`].
    pub fn field(mut self, field: FieldAssignment) -> Result<Self> {
        self.registry.add_field(&mut self.fields, field)?;
        Ok(self)
    }

    pub const fn error(&self) -> Option<&BuildError> {
        self.registry.rejected()
    }

    pub fn fields(&self) -> &[FieldAssignment] {
        &self.fields
    }

    /// Returns the SQL text after prefix substitution.
    #[must_use]
    pub fn query_get(&self) -> String {
        apply_prefix(
            &insert_sql(self.db, &self.table, &self.fields),
            self.db.prefix(),
        )
    }

    #[must_use]
    pub fn debug_binds(&self) -> Vec<Binding> {
        field_bindings(&self.fields, BindOptions::default())
    }

    /// Renders the statement and its bindings without executing.
    #[must_use]
    pub fn prepared(&self, options: &RunOptions) -> PreparedQuery {
        PreparedQuery::new(
            self.query_get(),
            field_bindings(&self.fields, options.bind_options()),
        )
    }

    /// Inserts the row and returns the generated id.
    ///
    /// Returns `0` without touching the database when no field was added.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Rejected`] after a deferred registration
    /// error, or the driver error if execution fails.
    pub async fn run(&self, options: &RunOptions) -> Result<i64> {
        self.registry.ensure_runnable()?;
        if self.fields.is_empty() {
            return Ok(0);
        }
        let query = self.prepared(options);
        match self
            .db
            .run_prepared(&query, ExecMode::InsertId, options)
            .await?
        {
            Executed::Exec(result) => Ok(result.last_insert_id),
            Executed::Rows(_) => Ok(0),
        }
    }

    /// Inserts the rows produced by `select` into `fields`, binding the
    /// select's own parameters. Returns the number of rows inserted.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Rejected`] if `select` recorded a
    /// registration error, or the driver error if execution fails.
    pub async fn run_from_select(
        &self,
        fields: &[&str],
        select: &Select<'_, C>,
        options: &RunOptions,
    ) -> Result<u64> {
        if let Some(error) = select.error() {
            return Err(BuildError::Rejected(Box::new(error.clone())).into());
        }
        let sql = format!(
            "insert into {}({}) {}",
            self.table,
            fields.join(","),
            select.query_get()
        );
        let query = PreparedQuery::new(
            apply_prefix(&sql, self.db.prefix()),
            select.bindings(options.bind_options()),
        );
        match self
            .db
            .run_prepared(&query, ExecMode::Count, options)
            .await?
        {
            Executed::Exec(result) => Ok(result.rows_affected),
            Executed::Rows(_) => Ok(0),
        }
    }
}

/// `insert into <table>(<columns>) values(<values>)`, before prefixing.
pub(super) fn insert_sql<C: Connection>(
    db: &Database<C>,
    table: &str,
    fields: &[FieldAssignment],
) -> String {
    let dialect = db.connection().dialect();
    let columns: Vec<String> = fields
        .iter()
        .map(|f| dialect.reserved(f.name()).into_owned())
        .collect();
    let values: Vec<String> = fields.iter().map(FieldAssignment::value_sql).collect();
    format!(
        "insert into {table}({}) values({})",
        columns.join(","),
        values.join(",")
    )
}

pub(super) fn field_bindings(fields: &[FieldAssignment], options: BindOptions) -> Vec<Binding> {
    let mut binder = ParamBinder::new(options);
    binder.push_fields(fields);
    binder.into_bindings()
}
