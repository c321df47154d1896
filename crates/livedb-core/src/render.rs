//! WHERE clause rendering.
//!
//! Turns an ordered list of normalized [`Condition`]s into SQL text. The
//! conjunction placement around field-less entries follows a positional
//! rule that existing callers rely on, including its odd corners; the
//! tests below pin them.

use crate::condition::Condition;
use crate::dialect::Dialect;
use crate::types::{Operator, ParamType, Parenthesis};

/// Output of [`render_where`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedWhere<'a> {
    /// `where ...`, or empty when nothing is visible.
    pub sql: String,
    /// The full, unfiltered sequence, to be walked by the binder.
    pub conditions: &'a [Condition],
}

impl RenderedWhere<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Renders the WHERE clause for `conditions`.
///
/// Entries flagged `no_field` are dropped before positions are computed.
/// A conjunction is written before entry `i` unless `i` is 0, the previous
/// entry has no field, or this entry has no field and is the last one.
/// Exists and not-exists predicates count as fielded entries here, so the
/// conjunctions around them are always written.
#[must_use]
pub fn render_where<'a>(conditions: &'a [Condition], dialect: &dyn Dialect) -> RenderedWhere<'a> {
    let visible: Vec<&Condition> = conditions.iter().filter(|c| !c.is_no_field()).collect();
    if visible.is_empty() {
        return RenderedWhere {
            sql: String::new(),
            conditions,
        };
    }

    let mut sql = String::from("where ");
    let count = visible.len();
    for (i, condition) in visible.iter().enumerate() {
        let suppress = i == 0
            || visible[i - 1].is_boundary_marker()
            || (condition.is_boundary_marker() && i + 1 == count);
        if !suppress {
            sql.push_str(condition.conjunction_kind().as_sql());
        }
        if condition.parenthesis() == Parenthesis::Open {
            sql.push('(');
        }
        push_predicate(&mut sql, condition, dialect);
        if condition.parenthesis() == Parenthesis::Close {
            sql.push(')');
        }
    }

    RenderedWhere { sql, conditions }
}

fn push_predicate(sql: &mut String, condition: &Condition, dialect: &dyn Dialect) {
    let field = condition.field().map(|f| dialect.reserved(f));
    let field = field.as_deref().unwrap_or_default();
    let placeholder = condition.effective_placeholder().unwrap_or_default();
    let raw = || {
        condition
            .value_ref()
            .map(crate::value::SqlValue::to_raw_sql)
            .unwrap_or_default()
    };

    match condition.operator() {
        Operator::IsNotNull => {
            sql.push_str(field);
            sql.push_str(" is not null");
        }
        op @ (Operator::In | Operator::NotIn | Operator::Exists | Operator::ExistsNot) => {
            sql.push_str(field);
            sql.push_str(op.as_sql());
            sql.push('(');
            sql.push_str(&raw());
            sql.push(')');
        }
        op @ (Operator::Between | Operator::NotBetween) => {
            sql.push_str(field);
            sql.push_str(op.as_sql());
            sql.push_str(&format!(" :{placeholder} and :{placeholder}2"));
        }
        op @ (Operator::Match | Operator::MatchBoolean | Operator::MatchExpansion) => {
            sql.push_str(&format!("match({field}) against(:{placeholder}"));
            match op {
                Operator::MatchBoolean => sql.push_str(" in boolean mode"),
                Operator::MatchExpansion => sql.push_str(" with query expansion"),
                _ => {}
            }
            sql.push(')');
        }
        op if condition.field().is_some() => {
            if condition.is_null_test() {
                sql.push_str(field);
                sql.push_str(" is null");
                return;
            }
            sql.push_str(field);
            sql.push_str(op.as_sql());
            if condition.declared_type() == Some(ParamType::Sql) || condition.is_no_bind() {
                match condition.custom_placeholder() {
                    Some(custom) => {
                        sql.push(':');
                        sql.push_str(custom);
                    }
                    None => sql.push_str(&raw()),
                }
            } else {
                sql.push(':');
                sql.push_str(placeholder);
            }
        }
        _ => {}
    }
}
