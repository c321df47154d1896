//! Statement builders.
//!
//! Every builder is created from a [`Database`](crate::Database), collects
//! fields and conditions through chained calls, and renders its SQL only
//! when asked: [`query_get`](select::Select::query_get) for the text,
//! `prepared` for text plus bindings, `run` to execute.

mod create;
mod delete;
mod insert;
mod select;
mod update;
mod upsert;

use std::convert::Infallible;
use std::fmt;

use tracing::warn;

pub use create::{ColumnDef, Create, Reference};
pub use delete::Delete;
pub use insert::Insert;
pub use select::{JoinConstraint, Select};
pub use update::Update;
pub use upsert::InsertUpdate;

use crate::bind::{BindOptions, Binding};
use crate::condition::Condition;
use crate::error::{BuildError, StateReason};
use crate::field::FieldAssignment;
use crate::guard::PlaceholderGuard;
use crate::hook::AuditEntry;
use crate::placeholder;
use crate::types::Operator;

/// What a builder does when a registration call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Return the error from the registration call.
    #[default]
    Fail,
    /// Log the error, keep the builder for inspection, and refuse to run.
    Defer,
}

/// Whether a builder still accepts conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhereState {
    #[default]
    Accepting,
    /// Entered after an `exists` condition. Terminal.
    Blocked,
}

/// Options for a terminal `run` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// HTML-escape bound text values. Defaults to `true`.
    pub html_safe: bool,
    /// Trim bound text values. Defaults to `true`.
    pub trim: bool,
    /// Log the full statement dump at `info` level.
    pub debug: bool,
    /// Record the statement in the audit table.
    pub log: Option<AuditEntry>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            html_safe: true,
            trim: true,
            debug: false,
            log: None,
        }
    }
}

impl RunOptions {
    #[must_use]
    pub const fn html_safe(mut self, enabled: bool) -> Self {
        self.html_safe = enabled;
        self
    }

    #[must_use]
    pub const fn trim(mut self, enabled: bool) -> Self {
        self.trim = enabled;
        self
    }

    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub fn log(mut self, entry: AuditEntry) -> Self {
        self.log = Some(entry);
        self
    }

    #[must_use]
    pub const fn bind_options(&self) -> BindOptions {
        BindOptions {
            html_safe: self.html_safe,
            trim: self.trim,
        }
    }
}

/// Rendered SQL with its bindings, ready to execute or inspect.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    pub sql: String,
    pub bindings: Vec<Binding>,
}

impl PreparedQuery {
    #[must_use]
    pub const fn new(sql: String, bindings: Vec<Binding>) -> Self {
        Self { sql, bindings }
    }

    /// Returns the SQL with each placeholder replaced by its escaped value.
    ///
    /// Placeholders without a binding are left as they are.
    #[must_use]
    pub fn interpolated(&self) -> String {
        let rewritten = placeholder::rewrite::<Infallible>(&self.sql, |name| {
            Ok(self
                .bindings
                .iter()
                .rev()
                .find(|b| b.placeholder == name)
                .map_or_else(|| format!(":{name}"), |b| b.value.to_sql_inline()))
        });
        match rewritten {
            Ok(sql) => sql,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for PreparedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SQL: [{}] {}", self.sql.len(), self.sql)?;
        write!(f, "Params: {}", self.bindings.len())?;
        for binding in &self.bindings {
            write!(f, "\n{binding}")?;
        }
        Ok(())
    }
}

/// Replaces the `##` table prefix token with `<prefix>_`.
#[must_use]
pub fn apply_prefix(sql: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => sql.replace("##", &format!("{prefix}_")),
        None => sql.to_owned(),
    }
}

/// Conditions, placeholder registry and error state shared by the
/// builders that take a WHERE clause.
#[derive(Debug, Clone, Default)]
pub(crate) struct Registry {
    conditions: Vec<Condition>,
    guard: PlaceholderGuard,
    state: WhereState,
    policy: ErrorPolicy,
    rejected: Option<BuildError>,
}

impl Registry {
    pub(crate) fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub(crate) fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub(crate) const fn state(&self) -> WhereState {
        self.state
    }

    pub(crate) const fn rejected(&self) -> Option<&BuildError> {
        self.rejected.as_ref()
    }

    pub(crate) fn set_policy(&mut self, policy: ErrorPolicy) {
        self.policy = policy;
    }

    /// Validates and appends a condition, honoring the error policy.
    pub(crate) fn add_condition(&mut self, condition: Condition) -> Result<(), BuildError> {
        let result = self.try_add(condition);
        self.settle(result)
    }

    fn try_add(&mut self, condition: Condition) -> Result<(), BuildError> {
        if self.state == WhereState::Blocked {
            return Err(BuildError::BuilderState(StateReason::Blocked));
        }
        let blocks = condition.operator() == Operator::Exists;
        if blocks && !self.conditions.is_empty() {
            return Err(BuildError::BuilderState(StateReason::ExistsNotFirst));
        }
        let condition = condition.normalize()?;
        self.guard.register_condition(&condition)?;
        self.conditions.push(condition);
        if blocks {
            self.state = WhereState::Blocked;
        }
        Ok(())
    }

    /// Adds `field` to `fields`, replacing the assignment to the same
    /// column. The replaced assignment's placeholder is released only
    /// once the new one is registered, so a rejected field leaves both
    /// the list and the guard untouched.
    pub(crate) fn add_field(
        &mut self,
        fields: &mut Vec<FieldAssignment>,
        field: FieldAssignment,
    ) -> Result<(), BuildError> {
        let result = self.try_add_field(fields, field);
        self.settle(result)
    }

    fn try_add_field(
        &mut self,
        fields: &mut Vec<FieldAssignment>,
        field: FieldAssignment,
    ) -> Result<(), BuildError> {
        let index = fields.iter().position(|f| f.name() == field.name());
        let previous = index
            .map(|i| &fields[i])
            .filter(|f| f.param_type().is_bindable())
            .map(|f| f.effective_placeholder().to_owned());
        let exempt = !field.param_type().is_bindable();
        let placeholder = field.effective_placeholder();
        if exempt || previous.as_deref() != Some(placeholder) {
            self.guard.check_and_register(placeholder, exempt)?;
            if let Some(previous) = &previous {
                self.guard.release(previous);
            }
        }
        match index {
            Some(i) => fields[i] = field,
            None => fields.push(field),
        }
        Ok(())
    }

    fn settle(&mut self, result: Result<(), BuildError>) -> Result<(), BuildError> {
        let Err(error) = result else {
            return Ok(());
        };
        if self.rejected.is_none() {
            self.rejected = Some(error.clone());
        }
        match self.policy {
            ErrorPolicy::Fail => Err(error),
            ErrorPolicy::Defer => {
                warn!(%error, "registration rejected, builder will refuse to run");
                Ok(())
            }
        }
    }

    /// Fails if an earlier registration error poisoned the builder.
    pub(crate) fn ensure_runnable(&self) -> Result<(), BuildError> {
        match &self.rejected {
            Some(error) => Err(BuildError::Rejected(Box::new(error.clone()))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamType;
    use crate::value::SqlValue;

    #[test]
    fn test_registry_blocks_after_exists() {
        let mut registry = Registry::new(ErrorPolicy::Fail);
        registry
            .add_condition(Condition::exists("select 1"))
            .unwrap();
        assert_eq!(registry.state(), WhereState::Blocked);
        let err = registry
            .add_condition(Condition::new("a").value(1))
            .unwrap_err();
        assert_eq!(err, BuildError::BuilderState(StateReason::Blocked));
    }

    #[test]
    fn test_registry_exists_must_be_first() {
        let mut registry = Registry::new(ErrorPolicy::Fail);
        registry
            .add_condition(Condition::new("a").value(1))
            .unwrap();
        let err = registry
            .add_condition(Condition::exists("select 1"))
            .unwrap_err();
        assert!(err.is_builder_state());
        assert_eq!(registry.state(), WhereState::Accepting);
        assert_eq!(registry.conditions().len(), 1);
    }

    #[test]
    fn test_registry_defer_policy() {
        let mut registry = Registry::new(ErrorPolicy::Defer);
        registry
            .add_condition(Condition::new("a").value(1))
            .unwrap();
        registry
            .add_condition(Condition::new("a").value(2))
            .unwrap();
        assert_eq!(registry.conditions().len(), 1);
        assert_eq!(
            registry.rejected(),
            Some(&BuildError::DuplicatePlaceholder(String::from("a")))
        );
        assert!(matches!(
            registry.ensure_runnable(),
            Err(BuildError::Rejected(_))
        ));
    }

    #[test]
    fn test_fields_share_the_guard() {
        let mut registry = Registry::new(ErrorPolicy::Fail);
        let mut fields = Vec::new();
        registry
            .add_field(
                &mut fields,
                FieldAssignment::new("name", "x", ParamType::Str),
            )
            .unwrap();
        let err = registry
            .add_condition(Condition::new("name").value("y"))
            .unwrap_err();
        assert_eq!(err, BuildError::DuplicatePlaceholder(String::from("name")));
    }

    #[test]
    fn test_replaced_field_registers_its_placeholder() {
        let mut registry = Registry::new(ErrorPolicy::Fail);
        let mut fields = Vec::new();
        registry
            .add_field(
                &mut fields,
                FieldAssignment::new("name", None::<String>, ParamType::Str),
            )
            .unwrap();
        registry
            .add_field(
                &mut fields,
                FieldAssignment::new("name", "x", ParamType::Str),
            )
            .unwrap();
        assert_eq!(fields.len(), 1);
        assert!(registry
            .add_condition(Condition::new("name").value("y"))
            .is_err());
    }

    #[test]
    fn test_replaced_field_releases_old_placeholder() {
        let mut registry = Registry::new(ErrorPolicy::Fail);
        let mut fields = Vec::new();
        registry
            .add_field(
                &mut fields,
                FieldAssignment::new("name", "x", ParamType::Str).placeholder("n1"),
            )
            .unwrap();
        registry
            .add_field(
                &mut fields,
                FieldAssignment::new("name", "y", ParamType::Str).placeholder("n2"),
            )
            .unwrap();
        registry
            .add_condition(Condition::new("name").value("z").placeholder("n1"))
            .unwrap();
        let err = registry
            .add_condition(Condition::new("name").value("z").placeholder("n2"))
            .unwrap_err();
        assert_eq!(err, BuildError::DuplicatePlaceholder(String::from("n2")));
    }

    #[test]
    fn test_rejected_field_leaves_state_untouched() {
        let mut registry = Registry::new(ErrorPolicy::Defer);
        let mut fields = Vec::new();
        registry
            .add_field(
                &mut fields,
                FieldAssignment::new("a", 1, ParamType::Int).placeholder("p"),
            )
            .unwrap();
        registry
            .add_field(
                &mut fields,
                FieldAssignment::new("b", 2, ParamType::Int).placeholder("p"),
            )
            .unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(
            registry.rejected(),
            Some(&BuildError::DuplicatePlaceholder(String::from("p")))
        );
    }

    #[test]
    fn test_prefix_substitution() {
        assert_eq!(
            apply_prefix("select * from ##users join ##roles", Some("app")),
            "select * from app_users join app_roles"
        );
        assert_eq!(
            apply_prefix("select * from ##users", None),
            "select * from ##users"
        );
    }

    #[test]
    fn test_interpolated_and_dump() {
        let query = PreparedQuery::new(
            String::from("select * from t where a=:a and b=:b2 and c=:c"),
            vec![
                Binding::new("a", SqlValue::Int(1), ParamType::Int),
                Binding::new("b2", SqlValue::from("it's"), ParamType::Str),
            ],
        );
        assert_eq!(
            query.interpolated(),
            "select * from t where a=1 and b='it''s' and c=:c"
        );
        let dump = query.to_string();
        assert!(dump.starts_with("SQL: [45] select * from t"));
        assert!(dump.contains("Params: 2\n:a = 1 (Int)"));
    }
}
