//! SQL values and parameter handling.
//!
//! Values reach the database either as bound parameters or, for raw SQL
//! passthrough, spliced verbatim into the statement text.

use serde::Serialize;

use crate::types::ParamType;

/// A SQL value carried by a condition, a field assignment or a fetched row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl SqlValue {
    /// Returns the SQL representation for inline use (escaped).
    ///
    /// Used only to produce a human-readable interpolated statement for
    /// debugging and audit logging, never to build executed SQL.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("null"),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => {
                // Escape single quotes by doubling them
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
        }
    }

    /// Returns the value as it appears when spliced into SQL without binding.
    ///
    /// Text is emitted as-is: this is the passthrough path for subqueries,
    /// `in` lists and expressions, so it must only carry trusted fragments.
    #[must_use]
    pub fn to_raw_sql(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Null => String::from("null"),
            other => other.to_sql_inline(),
        }
    }

    /// Returns `true` for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for the empty string.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }

    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content, parsing text when needed.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Text(s) => s.trim().parse().ok(),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(f) => Some(*f as i64),
            Self::Null => None,
        }
    }

    /// Coerces the value onto a declared parameter type.
    ///
    /// Mirrors how loosely-typed drivers treat a bound value: text is
    /// parsed for numeric and boolean tags, and anything bound as `Str` or
    /// `Date` is sent as text. Values that do not parse are passed through
    /// unchanged and left to the database to reject.
    #[must_use]
    pub fn cast(self, param_type: ParamType) -> Self {
        match (param_type, self) {
            (ParamType::Null, _) => Self::Null,
            (ParamType::Int, Self::Text(s)) => match s.trim().parse::<i64>() {
                Ok(n) => Self::Int(n),
                Err(_) => Self::Text(s),
            },
            (ParamType::Int, Self::Bool(b)) => Self::Int(i64::from(b)),
            (ParamType::Float, Self::Text(s)) => match s.trim().parse::<f64>() {
                Ok(f) => Self::Float(f),
                Err(_) => Self::Text(s),
            },
            #[allow(clippy::cast_precision_loss)]
            (ParamType::Float, Self::Int(n)) => Self::Float(n as f64),
            (ParamType::Bool, Self::Int(n)) => Self::Bool(n != 0),
            (ParamType::Bool, Self::Text(s)) => match s.trim() {
                "1" | "true" => Self::Bool(true),
                "0" | "false" | "" => Self::Bool(false),
                _ => Self::Text(s),
            },
            (ParamType::Str | ParamType::Date, Self::Text(s)) => Self::Text(s),
            (ParamType::Str | ParamType::Date, Self::Null) => Self::Null,
            (ParamType::Str | ParamType::Date, other) => Self::Text(other.to_raw_sql()),
            (_, other) => other,
        }
    }

    /// Applies the optional HTML escaping and whitespace trimming, in that
    /// order. Only text values are affected.
    #[must_use]
    pub fn sanitize(self, html_safe: bool, trim: bool) -> Self {
        match self {
            Self::Text(mut s) => {
                if html_safe {
                    s = html_escape::encode_quoted_attribute(&s).into_owned();
                }
                if trim {
                    let trimmed = s.trim();
                    if trimmed.len() != s.len() {
                        s = trimmed.to_owned();
                    }
                }
                Self::Text(s)
            }
            other => other,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        Self::Text(String::from(s))
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! int_to_sql_value {
    ($($t:ty),*) => {
        $(
            impl ToSqlValue for $t {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )*
    };
}

int_to_sql_value!(i8, i16, i32, i64, u8, u16, u32);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for &String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl ToSqlValue for chrono::NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.format("%Y-%m-%d").to_string())
    }
}

impl ToSqlValue for chrono::NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}
