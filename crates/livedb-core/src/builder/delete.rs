//! DELETE statement builder.

use super::{apply_prefix, ErrorPolicy, PreparedQuery, Registry, RunOptions, WhereState};
use crate::bind::{BindOptions, Binding, ParamBinder};
use crate::condition::Condition;
use crate::database::{Database, ExecMode, Executed};
use crate::driver::Connection;
use crate::error::{BuildError, Result};
use crate::render::render_where;

/// A DELETE statement builder.
#[derive(Debug)]
pub struct Delete<'db, C: Connection> {
    db: &'db Database<C>,
    table: String,
    registry: Registry,
}

impl<'db, C: Connection> Delete<'db, C> {
    pub(crate) fn new(db: &'db Database<C>, table: String) -> Self {
        Self {
            db,
            table,
            registry: Registry::new(db.policy()),
        }
    }

    #[must_use]
    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.registry.set_policy(policy);
        self
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

    pub fn conditions(&self) -> &[Condition] {
        self.registry.conditions()
    }

    pub const fn where_state(&self) -> WhereState {
        self.registry.state()
    }

    pub const fn error(&self) -> Option<&BuildError> {
        self.registry.rejected()
    }

    #[must_use]
    pub fn query_get(&self) -> String {
        let clause = render_where(self.registry.conditions(), self.db.connection().dialect());
        let sql = if clause.is_empty() {
            format!("delete from {}", self.table)
        } else {
            format!("delete from {} {}", self.table, clause.sql)
        };
        apply_prefix(&sql, self.db.prefix())
    }

    #[must_use]
    pub fn debug_binds(&self) -> Vec<Binding> {
        let mut binder = ParamBinder::new(BindOptions::default());
        binder.push_conditions(self.registry.conditions());
        binder.into_bindings()
    }

    #[must_use]
    pub fn prepared(&self, options: &RunOptions) -> PreparedQuery {
        let mut binder = ParamBinder::new(options.bind_options());
        binder.push_conditions(self.registry.conditions());
        PreparedQuery::new(self.query_get(), binder.into_bindings())
    }

    /// Deletes the matching rows and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Rejected`] after a deferred registration
    /// error, or the driver error.
    pub async fn run(&self, options: &RunOptions) -> Result<u64> {
        self.registry.ensure_runnable()?;
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
