//! Field assignments for INSERT and UPDATE value lists.

use crate::types::ParamType;
use crate::value::{SqlValue, ToSqlValue};

/// A column/value pair written by an insert, upsert or update.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAssignment {
    name: String,
    value: Option<SqlValue>,
    param_type: ParamType,
    placeholder: Option<String>,
    upsert: bool,
}

impl FieldAssignment {
    /// Creates an assignment. An empty string or a null value turns the
    /// type into [`ParamType::Null`].
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl ToSqlValue, param_type: ParamType) -> Self {
        Self::build(name.into(), value.to_sql_value(), param_type, true)
    }

    /// Creates an assignment that stores an empty string as-is.
    #[must_use]
    pub fn keep_blank(
        name: impl Into<String>,
        value: impl ToSqlValue,
        param_type: ParamType,
    ) -> Self {
        Self::build(name.into(), value.to_sql_value(), param_type, false)
    }

    fn build(name: String, value: SqlValue, param_type: ParamType, blank_is_null: bool) -> Self {
        let value = match value {
            SqlValue::Null => None,
            v if blank_is_null && v.is_blank() => None,
            v => Some(v),
        };
        Self {
            name,
            param_type: if value.is_none() {
                ParamType::Null
            } else {
                param_type
            },
            value,
            placeholder: None,
            upsert: false,
        }
    }

    /// Binds under `name` instead of the column name.
    #[must_use]
    pub fn placeholder(mut self, name: impl Into<String>) -> Self {
        self.placeholder = Some(name.into());
        self
    }

    /// Flags the column for the `on duplicate key update` list.
    #[must_use]
    pub const fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn value(&self) -> Option<&SqlValue> {
        self.value.as_ref()
    }

    pub const fn param_type(&self) -> ParamType {
        self.param_type
    }

    pub const fn is_upsert(&self) -> bool {
        self.upsert
    }

    /// Name the value is bound under.
    pub fn effective_placeholder(&self) -> &str {
        self.placeholder.as_deref().unwrap_or(&self.name)
    }

    /// SQL emitted in a `values(...)` list or on the right of `set a=`.
    #[must_use]
    pub fn value_sql(&self) -> String {
        match self.param_type {
            ParamType::Null => String::from("null"),
            ParamType::Sql => self
                .value
                .as_ref()
                .map_or_else(String::new, SqlValue::to_raw_sql),
            _ => format!(":{}", self.effective_placeholder()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_null_become_null_type() {
        let field = FieldAssignment::new("bio", "", ParamType::Str);
        assert_eq!(field.param_type(), ParamType::Null);
        assert_eq!(field.value_sql(), "null");

        let field = FieldAssignment::new("bio", None::<String>, ParamType::Str);
        assert_eq!(field.param_type(), ParamType::Null);
    }

    #[test]
    fn test_keep_blank() {
        let field = FieldAssignment::keep_blank("bio", "", ParamType::Str);
        assert_eq!(field.param_type(), ParamType::Str);
        assert_eq!(field.value(), Some(&SqlValue::from("")));
    }

    #[test]
    fn test_value_sql() {
        assert_eq!(
            FieldAssignment::new("a", 1, ParamType::Int).value_sql(),
            ":a"
        );
        assert_eq!(
            FieldAssignment::new("a", 1, ParamType::Int)
                .placeholder("pa")
                .value_sql(),
            ":pa"
        );
        assert_eq!(
            FieldAssignment::new("updated", "now()", ParamType::Sql).value_sql(),
            "now()"
        );
    }
}
