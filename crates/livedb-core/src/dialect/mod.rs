//! SQL Dialect support.
//!
//! The builders emit mostly portable SQL; this trait covers the places
//! where MySQL and SQLite disagree: reserved identifiers, the upsert
//! clause, DDL types and table options, and the column catalogue.

use std::borrow::Cow;
use std::fmt::Debug;

use crate::types::Format;

mod mysql;
mod sqlite;

pub use mysql::MySqlDialect;
pub use sqlite::SqliteDialect;

/// Identifiers quoted when used as column or table names.
pub const RESERVED_WORDS: &[&str] = &["order", "default", "group", "update", "div"];

/// Table-wide options for `create table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOptions {
    /// Emit `if not exists`.
    pub if_not_exists: bool,
    /// Storage engine (MySQL only).
    pub engine: String,
    /// Default character set (MySQL only).
    pub charset: String,
    /// Default collation (MySQL only).
    pub collate: String,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            if_not_exists: false,
            engine: String::from("InnoDB"),
            charset: String::from("utf8mb4"),
            collate: String::from("utf8mb4_unicode_ci"),
        }
    }
}

impl CreateOptions {
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '`'
    }

    /// Returns the words that must be quoted when used as identifiers.
    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED_WORDS
    }

    /// Quotes `name` if it is a reserved word, matching case-insensitively.
    fn reserved<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self
            .reserved_words()
            .iter()
            .any(|word| word.eq_ignore_ascii_case(name))
        {
            Cow::Owned(self.quote_identifier(name))
        } else {
            Cow::Borrowed(name)
        }
    }

    /// Quotes an identifier unconditionally.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        format!("{quote}{name}{quote}")
    }

    /// Returns the clause appended to an insert so that a conflicting row
    /// gets `columns` overwritten with the inserted values.
    fn upsert_clause(&self, columns: &[&str]) -> String;

    /// Keyword marking an auto-increment column.
    fn auto_increment(&self) -> &'static str;

    /// Returns the column type for `format`.
    fn column_type(&self, format: Format, unsigned: bool) -> String;

    /// Per-column character set and collation, if the dialect has them.
    fn column_charset(&self, _charset: &str, _collate: &str) -> Option<String> {
        None
    }

    /// Trailing table options for `create table`, if any.
    fn table_options(&self, _options: &CreateOptions) -> Option<String> {
        None
    }

    /// Statement emptying `table`.
    fn truncate(&self, table: &str) -> String;

    /// Query listing the columns of `table` in a `COLUMN_NAME` column,
    /// optionally prefixed with `alias.`.
    fn columns_query(&self, database: Option<&str>, table: &str, alias: Option<&str>) -> String;

    /// Statement opening a transaction.
    fn begin_transaction(&self) -> &'static str {
        "begin"
    }
}
