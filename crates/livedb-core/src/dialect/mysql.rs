//! MySQL / MariaDB dialect.

use super::{CreateOptions, Dialect};
use crate::types::Format;

/// MySQL dialect: backtick quoting, `on duplicate key update`,
/// `auto_increment` and engine/charset table options.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn upsert_clause(&self, columns: &[&str]) -> String {
        let sets: Vec<String> = columns
            .iter()
            .map(|column| {
                let column = self.reserved(column);
                format!("{column}=values({column})")
            })
            .collect();
        format!(" on duplicate key update {}", sets.join(","))
    }

    fn auto_increment(&self) -> &'static str {
        "auto_increment"
    }

    fn column_type(&self, format: Format, unsigned: bool) -> String {
        let base = match format {
            Format::Int => "int",
            Format::IntBig => "bigint",
            Format::IntTiny => "tinyint",
            Format::Text => "text",
            Format::Varchar(size) => return format!("varchar({size})"),
        };
        if unsigned && format.is_integer() {
            format!("{base} unsigned")
        } else {
            String::from(base)
        }
    }

    fn column_charset(&self, charset: &str, collate: &str) -> Option<String> {
        Some(format!(" character set {charset} collate {collate}"))
    }

    fn table_options(&self, options: &CreateOptions) -> Option<String> {
        Some(format!(
            " Engine={} default charset={} collate={}",
            options.engine, options.charset, options.collate
        ))
    }

    fn truncate(&self, table: &str) -> String {
        format!("truncate {table}")
    }

    fn columns_query(&self, database: Option<&str>, table: &str, alias: Option<&str>) -> String {
        let mut sql = String::from("select ");
        if let Some(alias) = alias.filter(|a| !a.is_empty()) {
            sql.push_str(&format!("concat('{alias}.',COLUMN_NAME) as "));
        }
        sql.push_str("COLUMN_NAME from information_schema.columns where table_schema=");
        match database {
            Some(db) => sql.push_str(&format!("'{db}'")),
            None => sql.push_str("database()"),
        }
        sql.push_str(&format!(
            " and table_name='{table}' order by ORDINAL_POSITION"
        ));
        sql
    }

    fn begin_transaction(&self) -> &'static str {
        "start transaction"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_clause() {
        assert_eq!(
            MySqlDialect::new().upsert_clause(&["name", "order"]),
            " on duplicate key update name=values(name),`order`=values(`order`)"
        );
    }

    #[test]
    fn test_column_types() {
        let d = MySqlDialect::new();
        assert_eq!(d.column_type(Format::Int, true), "int unsigned");
        assert_eq!(d.column_type(Format::IntBig, false), "bigint");
        assert_eq!(d.column_type(Format::Varchar(45), true), "varchar(45)");
        assert_eq!(d.column_type(Format::Text, true), "text");
    }

    #[test]
    fn test_columns_query() {
        let sql = MySqlDialect::new().columns_query(Some("shop"), "users", Some("u"));
        assert_eq!(
            sql,
            "select concat('u.',COLUMN_NAME) as COLUMN_NAME from information_schema.columns \
             where table_schema='shop' and table_name='users' order by ORDINAL_POSITION"
        );
    }

    #[test]
    fn test_table_options() {
        assert_eq!(
            MySqlDialect::new()
                .table_options(&CreateOptions::default())
                .unwrap(),
            " Engine=InnoDB default charset=utf8mb4 collate=utf8mb4_unicode_ci"
        );
    }
}
