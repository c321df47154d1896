//! Tag enums consumed by conditions, field assignments and DDL.

use std::fmt;

/// Declared type of a bound parameter.
///
/// Drivers map each tag onto their native parameter type. `Sql` is never
/// bound: the value is spliced into the statement text verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// SQL `NULL`.
    Null,
    /// Integer.
    Int,
    /// String.
    Str,
    /// Boolean.
    Bool,
    /// Raw SQL passthrough.
    Sql,
    /// Date or datetime, bound as text.
    Date,
    /// Floating point.
    Float,
}

impl ParamType {
    /// Infers the tag for a value when the caller did not declare one.
    #[must_use]
    pub const fn infer(value: &crate::value::SqlValue) -> Self {
        use crate::value::SqlValue;
        match value {
            SqlValue::Null => Self::Null,
            SqlValue::Bool(_) => Self::Bool,
            SqlValue::Int(_) => Self::Int,
            SqlValue::Float(_) => Self::Float,
            SqlValue::Text(_) => Self::Str,
        }
    }

    /// Returns `true` if values of this type go through parameter binding.
    #[must_use]
    pub const fn is_bindable(self) -> bool {
        !matches!(self, Self::Null | Self::Sql)
    }
}

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    /// `=`
    #[default]
    Equal,
    /// `<>`
    Different,
    /// `<`
    Smaller,
    /// `<=`
    SmallerEqual,
    /// `>`
    Bigger,
    /// `>=`
    BiggerEqual,
    /// `like`
    Like,
    /// `not like`
    NotLike,
    /// `in(...)` with a raw list or subquery.
    In,
    /// `not in(...)` with a raw list or subquery.
    NotIn,
    /// `is not null`
    IsNotNull,
    /// `exists(...)` with a raw subquery.
    Exists,
    /// `not exists(...)` with a raw subquery.
    ExistsNot,
    /// `between :p and :p2`
    Between,
    /// `not between :p and :p2`
    NotBetween,
    /// Full-text `match(...) against(...)`.
    Match,
    /// Full-text match in boolean mode.
    MatchBoolean,
    /// Full-text match with query expansion.
    MatchExpansion,
    /// The value is raw SQL appended after the field.
    Sql,
}

impl Operator {
    /// Returns the text placed between the field name and its operand.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Different => "<>",
            Self::Smaller => "<",
            Self::SmallerEqual => "<=",
            Self::Bigger => ">",
            Self::BiggerEqual => ">=",
            Self::Like => " like ",
            Self::NotLike => " not like ",
            Self::In => " in",
            Self::NotIn => " not in",
            Self::IsNotNull => " is not null",
            Self::Exists => "exists",
            Self::ExistsNot => "not exists",
            Self::Between => " between",
            Self::NotBetween => " not between",
            Self::Match | Self::MatchBoolean | Self::MatchExpansion => " against",
            Self::Sql => " ",
        }
    }

    /// Operators whose operand is rendered literally and never bound.
    #[must_use]
    pub const fn forces_no_bind(self) -> bool {
        matches!(
            self,
            Self::Sql | Self::In | Self::NotIn | Self::Exists | Self::ExistsNot | Self::IsNotNull
        )
    }

    /// Set and null-test operators, exempt from placeholder registration.
    #[must_use]
    pub const fn is_set_or_null_test(self) -> bool {
        matches!(
            self,
            Self::In | Self::NotIn | Self::IsNotNull | Self::Exists | Self::ExistsNot
        )
    }

    /// Returns `true` for `Between` and `NotBetween`.
    #[must_use]
    pub const fn is_range(self) -> bool {
        matches!(self, Self::Between | Self::NotBetween)
    }

    /// Returns `true` for the full-text match family.
    #[must_use]
    pub const fn is_match(self) -> bool {
        matches!(
            self,
            Self::Match | Self::MatchBoolean | Self::MatchExpansion
        )
    }
}

/// Logical link between a condition and the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => " and ",
            Self::Or => " or ",
        }
    }
}

/// Parenthesis emitted around a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parenthesis {
    #[default]
    None,
    /// `(` before the predicate.
    Open,
    /// `)` after the predicate.
    Close,
}

/// Join flavour for `Select::join`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    Inner,
    #[default]
    Left,
    Right,
}

impl JoinKind {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Column storage format for `create table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Int,
    IntBig,
    IntTiny,
    Text,
    /// `varchar(n)`; the size is mandatory.
    Varchar(u32),
}

impl Format {
    /// Returns `true` for the integer formats.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int | Self::IntBig | Self::IntTiny)
    }
}

/// Referential action on foreign-key update or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefAction {
    Cascade,
    NoAction,
    SetNull,
    #[default]
    Restrict,
}

impl fmt::Display for RefAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cascade => "cascade",
            Self::NoAction => "no action",
            Self::SetNull => "set null",
            Self::Restrict => "restrict",
        })
    }
}
