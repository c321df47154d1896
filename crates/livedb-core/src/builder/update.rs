//! UPDATE statement builder.

use super::{apply_prefix, ErrorPolicy, PreparedQuery, Registry, RunOptions, WhereState};
use crate::bind::{BindOptions, Binding, ParamBinder};
use crate::condition::Condition;
use crate::database::{Database, ExecMode, Executed};
use crate::driver::Connection;
use crate::error::{BuildError, Result};
use crate::field::FieldAssignment;
use crate::render::render_where;
use crate::types::ParamType;
use crate::value::ToSqlValue;

/// An UPDATE statement builder.
///
/// The SET placeholders and the WHERE placeholders live in one registry,
/// so a condition on a column that is also being set needs a custom
/// placeholder.
#[derive(Debug)]
pub struct Update<'db, C: Connection> {
    db: &'db Database<C>,
    table: String,
    fields: Vec<FieldAssignment>,
    registry: Registry,
}

impl<'db, C: Connection> Update<'db, C> {
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

    /// Sets a column. Empty strings and nulls are written as `null`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicatePlaceholder`] under
    /// [`ErrorPolicy::Fail`] if the placeholder is already taken. Setting
    /// the same column again replaces it and frees its old placeholder.
    /// Under [`ErrorPolicy::Defer`] a rejected field is dropped and
    /// reported by [`Self::error`].
    pub fn field_add(
        self,
        name: impl Into<String>,
        value: impl ToSqlValue,
        param_type: ParamType,
    ) -> Result<Self> {
        self.field(FieldAssignment::new(name, value, param_type))
    }

    /// Sets a column from a prepared assignment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::field_add`].
    pub fn field(mut self, field: FieldAssignment) -> Result<Self> {
        self.registry.add_field(&mut self.fields, field)?;
        Ok(self)
    }

    /// Registers a condition.
    ///
    /// # Errors
    ///
    /// See [`Select::where_add`](super::Select::where_add).
    pub fn where_add(mut self, condition: Condition) -> Result<Self> {
        self.registry.add_condition(condition)?;
        Ok(self)
    }

    pub fn fields(&self) -> &[FieldAssignment] {
        &self.fields
    }

    pub fn conditions(&self) -> &[Condition] {
        self.registry.conditions()
    }

    pub const fn where_state(&self) -> WhereState {
        self.registry.state()
    }

    pub const fn error(&self) -> Option<&BuildError> {
        self.registry.rejected()
    }

    /// Returns the SQL text after prefix substitution.
    #[must_use]
    pub fn query_get(&self) -> String {
        let dialect = self.db.connection().dialect();
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{}={}", dialect.reserved(f.name()), f.value_sql()))
            .collect();
        let mut sql = format!("update {} set {}", self.table, sets.join(","));
        let clause = render_where(self.registry.conditions(), dialect);
        if !clause.is_empty() {
            sql.push(' ');
            sql.push_str(&clause.sql);
        }
        apply_prefix(&sql, self.db.prefix())
    }

    #[must_use]
    pub fn debug_binds(&self) -> Vec<Binding> {
        self.bindings(BindOptions::default())
    }

    fn bindings(&self, options: BindOptions) -> Vec<Binding> {
        let mut binder = ParamBinder::new(options);
        binder.push_fields(&self.fields);
        binder.push_conditions(self.registry.conditions());
        binder.into_bindings()
    }

    /// Renders the statement and its bindings without executing.
    #[must_use]
    pub fn prepared(&self, options: &RunOptions) -> PreparedQuery {
        PreparedQuery::new(self.query_get(), self.bindings(options.bind_options()))
    }

    /// Executes the update and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::EmptyFieldList`] when nothing is set,
    /// [`BuildError::Rejected`] after a deferred registration error, or the
    /// driver error.
    pub async fn run(&self, options: &RunOptions) -> Result<u64> {
        self.registry.ensure_runnable()?;
        if self.fields.is_empty() {
            return Err(BuildError::EmptyFieldList(self.table.clone()).into());
        }
        let query = self.prepared(options);
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
