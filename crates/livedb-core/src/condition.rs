//! Condition descriptors for WHERE clauses.
//!
//! A [`Condition`] describes one predicate: the field, its operand, how it
//! links to the previous predicate, and how it is bound. Conditions are
//! assembled with chained setters and normalized once, when a builder
//! registers them.
//!
//! ```rust
//! use livedb_core::{Condition, Operator};
//!
//! let age = Condition::new("age").between(18, 65).placeholder("age_range");
//! let name = Condition::new("name").value("bob%").op(Operator::Like).or();
//! # let _ = (age, name);
//! ```

use crate::error::BuildError;
use crate::types::{Conjunction, Operator, ParamType, Parenthesis};
use crate::value::{SqlValue, ToSqlValue};

/// One predicate of a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field: Option<String>,
    value: Option<SqlValue>,
    value2: Option<SqlValue>,
    param_type: Option<ParamType>,
    operator: Operator,
    conjunction: Conjunction,
    parenthesis: Parenthesis,
    placeholder: Option<String>,
    blank_is_null: bool,
    no_field: bool,
    no_bind: bool,
}

impl Condition {
    /// Creates an equality condition on `field` with no value yet.
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self::with_field(Some(field.into()))
    }

    /// Creates a field-less entry, used to open or close a parenthesis on
    /// its own or to carry an `exists` subquery.
    #[must_use]
    pub fn marker() -> Self {
        Self::with_field(None)
    }

    /// Creates a field-less `exists(<subquery>)` condition.
    #[must_use]
    pub fn exists(subquery: impl Into<String>) -> Self {
        Self::marker().value(subquery.into()).op(Operator::Exists)
    }

    /// Creates a field-less `not exists(<subquery>)` condition.
    #[must_use]
    pub fn not_exists(subquery: impl Into<String>) -> Self {
        Self::marker()
            .value(subquery.into())
            .op(Operator::ExistsNot)
    }

    fn with_field(field: Option<String>) -> Self {
        Self {
            field,
            value: None,
            value2: None,
            param_type: None,
            operator: Operator::Equal,
            conjunction: Conjunction::And,
            parenthesis: Parenthesis::None,
            placeholder: None,
            blank_is_null: true,
            no_field: false,
            no_bind: false,
        }
    }

    /// Sets the operand. `None` and `SqlValue::Null` both mean "no value".
    #[must_use]
    pub fn value(mut self, value: impl ToSqlValue) -> Self {
        self.value = match value.to_sql_value() {
            SqlValue::Null => None,
            v => Some(v),
        };
        self
    }

    /// Sets both bounds and switches the operator to `between`.
    #[must_use]
    pub fn between(self, low: impl ToSqlValue, high: impl ToSqlValue) -> Self {
        self.value(low).value2(high).op(Operator::Between)
    }

    /// Sets the upper bound used by `between` and `not between`.
    #[must_use]
    pub fn value2(mut self, value: impl ToSqlValue) -> Self {
        self.value2 = match value.to_sql_value() {
            SqlValue::Null => None,
            v => Some(v),
        };
        self
    }

    /// Declares the parameter type. Inferred from the value when unset.
    #[must_use]
    pub const fn param_type(mut self, param_type: ParamType) -> Self {
        self.param_type = Some(param_type);
        self
    }

    #[must_use]
    pub const fn op(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// Links this condition to the previous one with `or`.
    #[must_use]
    pub const fn or(mut self) -> Self {
        self.conjunction = Conjunction::Or;
        self
    }

    #[must_use]
    pub const fn conjunction(mut self, conjunction: Conjunction) -> Self {
        self.conjunction = conjunction;
        self
    }

    /// Emits `(` before this condition.
    #[must_use]
    pub const fn open(mut self) -> Self {
        self.parenthesis = Parenthesis::Open;
        self
    }

    /// Emits `)` after this condition.
    #[must_use]
    pub const fn close(mut self) -> Self {
        self.parenthesis = Parenthesis::Close;
        self
    }

    /// Binds under `name` instead of the field name.
    #[must_use]
    pub fn placeholder(mut self, name: impl Into<String>) -> Self {
        self.placeholder = Some(name.into());
        self
    }

    /// Whether an empty string is turned into `null`. Defaults to `true`.
    #[must_use]
    pub const fn blank_is_null(mut self, enabled: bool) -> Self {
        self.blank_is_null = enabled;
        self
    }

    /// Keeps the entry out of the rendered clause and the placeholder
    /// registry; its value is still bound. Used to supply a value for a
    /// placeholder that appears elsewhere in the statement.
    #[must_use]
    pub const fn no_field(mut self) -> Self {
        self.no_field = true;
        self
    }

    /// Renders the value into the statement text instead of binding it.
    #[must_use]
    pub const fn no_bind(mut self) -> Self {
        self.no_bind = true;
        self
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub const fn value_ref(&self) -> Option<&SqlValue> {
        self.value.as_ref()
    }

    pub const fn value2_ref(&self) -> Option<&SqlValue> {
        self.value2.as_ref()
    }

    pub const fn declared_type(&self) -> Option<ParamType> {
        self.param_type
    }

    pub const fn operator(&self) -> Operator {
        self.operator
    }

    pub const fn conjunction_kind(&self) -> Conjunction {
        self.conjunction
    }

    pub const fn parenthesis(&self) -> Parenthesis {
        self.parenthesis
    }

    pub fn custom_placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub const fn is_no_field(&self) -> bool {
        self.no_field
    }

    pub const fn is_no_bind(&self) -> bool {
        self.no_bind
    }

    /// Name the value is bound under: the custom placeholder, else the field.
    pub fn effective_placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref().or(self.field.as_deref())
    }

    /// Returns `true` for a field-less entry that only carries a
    /// parenthesis. Exists predicates have no field but are real entries.
    #[must_use]
    pub const fn is_boundary_marker(&self) -> bool {
        self.field.is_none() && !matches!(self.operator, Operator::Exists | Operator::ExistsNot)
    }

    /// Returns `true` when the condition renders `is null`.
    #[must_use]
    pub fn is_null_test(&self) -> bool {
        !self.no_bind && (self.value.is_none() || self.param_type == Some(ParamType::Null))
    }

    /// Returns `true` when the placeholder registry ignores this condition.
    #[must_use]
    pub fn is_guard_exempt(&self) -> bool {
        self.field.is_none()
            || self.no_field
            || self.no_bind
            || matches!(self.param_type, Some(ParamType::Null | ParamType::Sql))
            || self.operator.is_set_or_null_test()
    }

    /// Applies blank-is-null coercion, type inference and forced no-bind,
    /// then checks the shape of the condition.
    ///
    /// # Errors
    ///
    /// - [`BuildError::AmbiguousField`] when the field contains `.` or `(`
    ///   and no custom placeholder is set.
    /// - [`BuildError::MissingSecondValue`] for a range operator without an
    ///   upper bound.
    pub fn normalize(mut self) -> Result<Self, BuildError> {
        if let Some(field) = &self.field {
            if self.placeholder.is_none() && (field.contains('.') || field.contains('(')) {
                return Err(BuildError::AmbiguousField(field.clone()));
            }
        }
        if self.blank_is_null && self.value.as_ref().is_some_and(SqlValue::is_blank) {
            self.value = None;
            self.param_type = Some(ParamType::Null);
        }
        if self.param_type.is_none() {
            self.param_type = Some(
                self.value
                    .as_ref()
                    .map_or(ParamType::Null, ParamType::infer),
            );
        }
        if self.operator.forces_no_bind() {
            self.no_bind = true;
        }
        if self.operator.is_range() && self.value2.is_none() {
            let name = self.effective_placeholder().unwrap_or_default();
            return Err(BuildError::MissingSecondValue(name.to_owned()));
        }
        Ok(self)
    }
}
