//! SELECT statement builder.

use super::{apply_prefix, ErrorPolicy, PreparedQuery, Registry, RunOptions, WhereState};
use crate::bind::{BindOptions, Binding, ParamBinder};
use crate::condition::Condition;
use crate::database::{Database, ExecMode, Executed};
use crate::driver::{Connection, Row};
use crate::error::{BuildError, Result};
use crate::render::render_where;
use crate::types::JoinKind;

/// How a joined table is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinConstraint {
    /// `using(<columns>)`
    Using(String),
    /// `on(<expression>)`
    On(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Join {
    table: String,
    constraint: JoinConstraint,
    kind: JoinKind,
}

/// A SELECT statement builder.
///
/// ```rust,ignore
/// let rows = db
///     .select("orders o")
///     .fields(&["o.id", "c.name"])
///     .join("customers c", JoinConstraint::On("c.id=o.customer".into()), JoinKind::Inner)
///     .where_add(Condition::new("o.total").placeholder("total").value(100).op(Operator::Bigger))?
///     .order("o.id desc")
///     .limit(20, 0)
///     .run(&RunOptions::default())
///     .await?;
/// ```
#[derive(Debug)]
pub struct Select<'db, C: Connection> {
    db: &'db Database<C>,
    table: String,
    fields: String,
    joins: Vec<Join>,
    registry: Registry,
    group: Option<String>,
    order: Option<String>,
    limit: Option<(u64, u64)>,
    for_update: bool,
}

impl<'db, C: Connection> Select<'db, C> {
    pub(crate) fn new(db: &'db Database<C>, table: String) -> Self {
        Self {
            db,
            table,
            fields: String::from("*"),
            joins: Vec::new(),
            registry: Registry::new(db.policy()),
            group: None,
            order: None,
            limit: None,
            for_update: false,
        }
    }

    /// Overrides the error policy inherited from the database.
    #[must_use]
    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.registry.set_policy(policy);
        self
    }

    /// Sets the selected columns. Defaults to `*`.
    #[must_use]
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.join(",");
        self
    }

    /// Selects every column of the table except `field`.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the column catalogue cannot be read.
    pub async fn fields_except(mut self, field: &str, alias: Option<&str>) -> Result<Self> {
        let excluded = match alias.filter(|a| !a.is_empty()) {
            Some(alias) => format!("{alias}.{field}"),
            None => field.to_owned(),
        };
        let columns = self.db.fields_get(&self.table, alias).await?;
        self.fields = columns
            .into_iter()
            .filter(|c| *c != excluded)
            .collect::<Vec<_>>()
            .join(",");
        Ok(self)
    }

    /// Adds a join.
    #[must_use]
    pub fn join(
        mut self,
        table: impl Into<String>,
        constraint: JoinConstraint,
        kind: JoinKind,
    ) -> Self {
        self.joins.push(Join {
            table: table.into(),
            constraint,
            kind,
        });
        self
    }

    /// Sets the `group by` expression.
    #[must_use]
    pub fn group(mut self, fields: impl Into<String>) -> Self {
        self.group = Some(fields.into());
        self
    }

    /// Sets the `order by` expression; an empty string clears it.
    #[must_use]
    pub fn order(mut self, fields: impl Into<String>) -> Self {
        let fields = fields.into();
        self.order = (!fields.is_empty()).then_some(fields);
        self
    }

    /// Returns at most `amount` rows, skipping the first `first`.
    #[must_use]
    pub const fn limit(mut self, amount: u64, first: u64) -> Self {
        self.limit = Some((amount, first));
        self
    }

    /// Appends `for update`.
    #[must_use]
    pub const fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    /// Registers a condition.
    ///
    /// # Errors
    ///
    /// Under [`ErrorPolicy::Fail`], returns the [`BuildError`] raised by
    /// the condition: builder state, duplicate placeholder, ambiguous field
    /// or missing second value. Under [`ErrorPolicy::Defer`] the call
    /// returns `Ok` with the condition dropped; the rejection is then
    /// reported by [`Self::error`] and [`Self::run`] refuses to execute.
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

    /// The first registration error, when running under
    /// [`ErrorPolicy::Defer`].
    pub const fn error(&self) -> Option<&BuildError> {
        self.registry.rejected()
    }

    /// Returns the SQL text after prefix substitution.
    #[must_use]
    pub fn query_get(&self) -> String {
        let dialect = self.db.connection().dialect();
        let mut sql = format!("select {} from {}", self.fields, self.table);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.kind.as_sql());
            sql.push_str(" join ");
            sql.push_str(&join.table);
            match &join.constraint {
                JoinConstraint::Using(columns) => sql.push_str(&format!(" using({columns})")),
                JoinConstraint::On(expression) => sql.push_str(&format!(" on({expression})")),
            }
        }
        let clause = render_where(self.registry.conditions(), dialect);
        if !clause.is_empty() {
            sql.push(' ');
            sql.push_str(&clause.sql);
        }
        if let Some(group) = &self.group {
            sql.push_str(" group by ");
            sql.push_str(&dialect.reserved(group));
        }
        if let Some(order) = &self.order {
            sql.push_str(" order by ");
            sql.push_str(&dialect.reserved(order));
        }
        if let Some((amount, first)) = self.limit {
            sql.push_str(&format!(" limit {first},{amount}"));
        }
        if self.for_update {
            sql.push_str(" for update");
        }
        apply_prefix(&sql, self.db.prefix())
    }

    /// Returns the bindings a run with default options would use.
    #[must_use]
    pub fn debug_binds(&self) -> Vec<Binding> {
        self.bindings(BindOptions::default())
    }

    pub(crate) fn bindings(&self, options: BindOptions) -> Vec<Binding> {
        let mut binder = ParamBinder::new(options);
        binder.push_conditions(self.registry.conditions());
        binder.into_bindings()
    }

    /// Renders the statement and its bindings without executing.
    #[must_use]
    pub fn prepared(&self, options: &RunOptions) -> PreparedQuery {
        PreparedQuery::new(self.query_get(), self.bindings(options.bind_options()))
    }

    /// Executes the query and returns every row.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Rejected`] if a deferred registration error
    /// was recorded, or the driver error if execution fails.
    pub async fn run(&self, options: &RunOptions) -> Result<Vec<Row>> {
        self.registry.ensure_runnable()?;
        let query = self.prepared(options);
        match self
            .db
            .run_prepared(&query, ExecMode::Rows, options)
            .await?
        {
            Executed::Rows(rows) => Ok(rows),
            Executed::Exec(_) => Ok(Vec::new()),
        }
    }

    /// Executes the query and returns the first row, if any.
    ///
    /// # Errors
    ///
    /// Same as [`Self::run`].
    pub async fn run_first(&self, options: &RunOptions) -> Result<Option<Row>> {
        Ok(self.run(options).await?.into_iter().next())
    }
}
