//! INSERT ... ON DUPLICATE KEY UPDATE builder.

use super::insert::{field_bindings, insert_sql};
use super::{apply_prefix, ErrorPolicy, PreparedQuery, Registry, RunOptions};
use crate::bind::{BindOptions, Binding};
use crate::database::{Database, ExecMode, Executed};
use crate::driver::Connection;
use crate::error::{BuildError, Result};
use crate::field::FieldAssignment;
use crate::types::ParamType;
use crate::value::ToSqlValue;

/// An insert that overwrites the flagged columns when the row exists.
///
/// Renders `on duplicate key update` on MySQL and
/// `on conflict do update` on SQLite.
#[derive(Debug)]
pub struct InsertUpdate<'db, C: Connection> {
    db: &'db Database<C>,
    table: String,
    fields: Vec<FieldAssignment>,
    registry: Registry,
}

impl<'db, C: Connection> InsertUpdate<'db, C> {
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

    /// Adds a column written only on insert.
    ///
    /// # Errors
    ///
    /// See [`Insert::field_add`](super::Insert::field_add).
    pub fn field_add(
        self,
        name: impl Into<String>,
        value: impl ToSqlValue,
        param_type: ParamType,
    ) -> Result<Self> {
        self.field(FieldAssignment::new(name, value, param_type))
    }

    /// Adds a column written on insert and overwritten on conflict.
    ///
    /// # Errors
    ///
    /// See [`Insert::field_add`](super::Insert::field_add).
    pub fn field_update(
        self,
        name: impl Into<String>,
        value: impl ToSqlValue,
        param_type: ParamType,
    ) -> Result<Self> {
        self.field(FieldAssignment::new(name, value, param_type).upsert())
    }

    /// # Errors
    ///
    /// See [`Insert::field_add`](super::Insert::field_add).
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
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NoUpsertFields`] if fields were added but none
    /// is flagged for update.
    pub fn query_get(&self) -> std::result::Result<String, BuildError> {
        let updated: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.is_upsert())
            .map(FieldAssignment::name)
            .collect();
        if updated.is_empty() && !self.fields.is_empty() {
            return Err(BuildError::NoUpsertFields(self.table.clone()));
        }
        let mut sql = insert_sql(self.db, &self.table, &self.fields);
        sql.push_str(&self.db.connection().dialect().upsert_clause(&updated));
        Ok(apply_prefix(&sql, self.db.prefix()))
    }

    #[must_use]
    pub fn debug_binds(&self) -> Vec<Binding> {
        field_bindings(&self.fields, BindOptions::default())
    }

    /// Renders the statement and its bindings without executing.
    ///
    /// # Errors
    ///
    /// Same as [`Self::query_get`].
    pub fn prepared(&self, options: &RunOptions) -> std::result::Result<PreparedQuery, BuildError> {
        Ok(PreparedQuery::new(
            self.query_get()?,
            field_bindings(&self.fields, options.bind_options()),
        ))
    }

    /// Inserts or updates the row and returns the id reported by the
    /// driver. Returns `0` without executing when no field was added.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NoUpsertFields`], [`BuildError::Rejected`]
    /// after a deferred registration error, or the driver error.
    pub async fn run(&self, options: &RunOptions) -> Result<i64> {
        self.registry.ensure_runnable()?;
        if self.fields.is_empty() {
            return Ok(0);
        }
        let query = self.prepared(options)?;
        match self
            .db
            .run_prepared(&query, ExecMode::InsertId, options)
            .await?
        {
            Executed::Exec(result) => Ok(result.last_insert_id),
            Executed::Rows(_) => Ok(0),
        }
    }
}
