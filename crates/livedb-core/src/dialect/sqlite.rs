//! SQLite dialect.

use super::Dialect;
use crate::types::Format;

/// SQLite dialect.
///
/// SQLite accepts backtick-quoted identifiers, so reserved names are
/// quoted the same way as on MySQL. Upserts use `on conflict do update`
/// against the `excluded` pseudo-table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn upsert_clause(&self, columns: &[&str]) -> String {
        let sets: Vec<String> = columns
            .iter()
            .map(|column| {
                let column = self.reserved(column);
                format!("{column}=excluded.{column}")
            })
            .collect();
        format!(" on conflict do update set {}", sets.join(","))
    }

    fn auto_increment(&self) -> &'static str {
        "autoincrement"
    }

    fn column_type(&self, format: Format, _unsigned: bool) -> String {
        if format.is_integer() {
            String::from("integer")
        } else {
            String::from("text")
        }
    }

    fn truncate(&self, table: &str) -> String {
        format!("delete from {table}")
    }

    fn columns_query(&self, _database: Option<&str>, table: &str, alias: Option<&str>) -> String {
        match alias.filter(|a| !a.is_empty()) {
            Some(alias) => format!(
                "select '{alias}.' || name as COLUMN_NAME from pragma_table_info('{table}') order by cid"
            ),
            None => format!("select name as COLUMN_NAME from pragma_table_info('{table}') order by cid"),
        }
    }
}
