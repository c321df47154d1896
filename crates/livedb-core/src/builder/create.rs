//! CREATE TABLE builder.

use super::apply_prefix;
use crate::database::Database;
use crate::dialect::{CreateOptions, Dialect};
use crate::driver::Connection;
use crate::error::{BuildError, Result};
use crate::types::{Format, RefAction};

/// A foreign key target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub table: String,
    pub field: String,
    pub on_update: RefAction,
    pub on_delete: RefAction,
}

impl Reference {
    /// References `table(field)` with `restrict` on both actions.
    #[must_use]
    pub fn new(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            field: field.into(),
            on_update: RefAction::default(),
            on_delete: RefAction::default(),
        }
    }

    #[must_use]
    pub const fn on_update(mut self, action: RefAction) -> Self {
        self.on_update = action;
        self
    }

    #[must_use]
    pub const fn on_delete(mut self, action: RefAction) -> Self {
        self.on_delete = action;
        self
    }
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    name: String,
    format: Format,
    unsigned: bool,
    charset: Option<(String, String)>,
    not_null: bool,
    default: Option<String>,
    primary: bool,
    auto_increment: bool,
    unique: bool,
    reference: Option<Reference>,
}

impl ColumnDef {
    #[must_use]
    pub fn new(name: impl Into<String>, format: Format) -> Self {
        Self {
            name: name.into(),
            format,
            unsigned: false,
            charset: None,
            not_null: false,
            default: None,
            primary: false,
            auto_increment: false,
            unique: false,
            reference: None,
        }
    }

    /// Only affects integer formats on MySQL.
    #[must_use]
    pub const fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>, collate: impl Into<String>) -> Self {
        self.charset = Some((charset.into(), collate.into()));
        self
    }

    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    #[must_use]
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn references(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn to_sql(&self, dialect: &dyn Dialect) -> String {
        let mut sql = format!(
            "{} {}",
            dialect.reserved(&self.name),
            dialect.column_type(self.format, self.unsigned)
        );
        if let Some(charset) = self
            .charset
            .as_ref()
            .and_then(|(charset, collate)| dialect.column_charset(charset, collate))
        {
            sql.push_str(&charset);
        }
        if self.not_null {
            sql.push_str(" not null");
        }
        if let Some(default) = &self.default {
            sql.push_str(&format!(" default '{}'", default.replace('\'', "''")));
        }
        if self.primary {
            sql.push_str(" primary key");
        }
        if self.auto_increment {
            sql.push(' ');
            sql.push_str(dialect.auto_increment());
        }
        if self.unique {
            sql.push_str(" unique");
        }
        if let Some(reference) = &self.reference {
            sql.push_str(&format!(
                " references {}({})",
                reference.table, reference.field
            ));
            if reference.on_delete != RefAction::Restrict {
                sql.push_str(&format!(" on delete {}", reference.on_delete));
            }
            if reference.on_update != RefAction::Restrict {
                sql.push_str(&format!(" on update {}", reference.on_update));
            }
        }
        sql
    }
}

/// A CREATE TABLE builder.
///
/// ```rust,ignore
/// db.create("##users")
///     .add(ColumnDef::new("id", Format::Int).unsigned().primary().auto_increment())
///     .add(ColumnDef::new("email", Format::Varchar(120)).not_null())
///     .add(ColumnDef::new("tenant", Format::Int))
///     .unique(&["email", "tenant"])?
///     .run(&CreateOptions::default().if_not_exists())
///     .await?;
/// ```
#[derive(Debug)]
pub struct Create<'db, C: Connection> {
    db: &'db Database<C>,
    table: String,
    columns: Vec<ColumnDef>,
    unique: Vec<Vec<String>>,
}

impl<'db, C: Connection> Create<'db, C> {
    pub(crate) const fn new(db: &'db Database<C>, table: String) -> Self {
        Self {
            db,
            table,
            columns: Vec::new(),
            unique: Vec::new(),
        }
    }

    /// Adds a column. A column with the same name is replaced.
    #[must_use]
    pub fn add(mut self, column: ColumnDef) -> Self {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        self
    }

    /// Adds a table-level unique constraint over `columns`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownColumn`] if a column was not added yet.
    pub fn unique(mut self, columns: &[&str]) -> Result<Self> {
        if let Some(missing) = columns
            .iter()
            .find(|name| self.columns.iter().all(|c| c.name != **name))
        {
            return Err(BuildError::UnknownColumn((*missing).to_owned()).into());
        }
        self.unique
            .push(columns.iter().map(|name| (*name).to_owned()).collect());
        Ok(self)
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Returns the DDL text after prefix substitution.
    #[must_use]
    pub fn query_get(&self, options: &CreateOptions) -> String {
        let dialect = self.db.connection().dialect();
        let mut parts: Vec<String> = self.columns.iter().map(|c| c.to_sql(dialect)).collect();
        parts.extend(
            self.unique
                .iter()
                .map(|group| format!("unique({})", group.join(","))),
        );

        let mut sql = String::from("create table ");
        if options.if_not_exists {
            sql.push_str("if not exists ");
        }
        sql.push_str(&self.table);
        sql.push('(');
        sql.push_str(&parts.join(","));
        sql.push(')');
        if let Some(table_options) = dialect.table_options(options) {
            sql.push_str(&table_options);
        }
        apply_prefix(&sql, self.db.prefix())
    }

    /// Creates the table.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the statement fails.
    pub async fn run(&self, options: &CreateOptions) -> Result<()> {
        self.db.run_plain(&self.query_get(options)).await?;
        Ok(())
    }
}
