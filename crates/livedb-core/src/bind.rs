//! Parameter binding.
//!
//! The binder walks field assignments and conditions in statement order
//! and produces the `(placeholder, value, type)` triples a prepared
//! statement needs. Every triple is kept for later inspection.

use std::fmt;

use crate::condition::Condition;
use crate::driver::Statement;
use crate::error::DriverError;
use crate::field::FieldAssignment;
use crate::types::{Operator, ParamType};
use crate::value::SqlValue;

/// One value bound to a named placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub placeholder: String,
    pub value: SqlValue,
    pub param_type: ParamType,
}

impl Binding {
    #[must_use]
    pub fn new(placeholder: impl Into<String>, value: SqlValue, param_type: ParamType) -> Self {
        Self {
            placeholder: placeholder.into(),
            value,
            param_type,
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ":{} = {} ({:?})",
            self.placeholder,
            self.value.to_sql_inline(),
            self.param_type
        )
    }
}

/// Value sanitization applied before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindOptions {
    /// HTML-escape text values.
    pub html_safe: bool,
    /// Trim surrounding whitespace from text values.
    pub trim: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            html_safe: true,
            trim: true,
        }
    }
}

/// Collects bindings for a statement and applies them to it.
#[derive(Debug, Clone, Default)]
pub struct ParamBinder {
    options: BindOptions,
    bindings: Vec<Binding>,
}

impl ParamBinder {
    #[must_use]
    pub fn new(options: BindOptions) -> Self {
        Self {
            options,
            bindings: Vec::new(),
        }
    }

    /// Adds the bindings for a list of field assignments.
    pub fn push_fields(&mut self, fields: &[FieldAssignment]) {
        for field in fields {
            let Some(value) = field.value() else {
                continue;
            };
            if !field.param_type().is_bindable() {
                continue;
            }
            self.push(field.effective_placeholder(), value, field.param_type());
        }
    }

    /// Adds the bindings for a list of normalized conditions.
    ///
    /// Entries without a value, with a `Null` or `Sql` type, with a set or
    /// null-test operator, or flagged `no_bind` are skipped. Range
    /// operators add a second binding named `<placeholder>2`.
    pub fn push_conditions(&mut self, conditions: &[Condition]) {
        for condition in conditions {
            let Some(value) = condition.value_ref() else {
                continue;
            };
            let Some(param_type) = condition.declared_type() else {
                continue;
            };
            if !param_type.is_bindable()
                || matches!(
                    condition.operator(),
                    Operator::In | Operator::NotIn | Operator::IsNotNull
                )
                || condition.is_no_bind()
            {
                continue;
            }
            let Some(placeholder) = condition.effective_placeholder() else {
                continue;
            };
            self.push(placeholder, value, param_type);
            if condition.operator().is_range() {
                if let Some(upper) = condition.value2_ref() {
                    self.push(&format!("{placeholder}2"), upper, param_type);
                }
            }
        }
    }

    fn push(&mut self, placeholder: &str, value: &SqlValue, param_type: ParamType) {
        let value = value
            .clone()
            .sanitize(self.options.html_safe, self.options.trim);
        self.bindings
            .push(Binding::new(placeholder, value, param_type));
    }

    /// Binds every collected value onto `statement`.
    ///
    /// # Errors
    ///
    /// Propagates the first error reported by the statement.
    pub fn apply<S: Statement>(&self, statement: &mut S) -> Result<(), DriverError> {
        for binding in &self.bindings {
            statement.bind_value(&binding.placeholder, &binding.value, binding.param_type)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    #[must_use]
    pub fn into_bindings(self) -> Vec<Binding> {
        self.bindings
    }
}
