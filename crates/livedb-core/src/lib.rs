//! # livedb-core
//!
//! Fluent SQL statement builders over a pluggable driver.
//!
//! This crate provides:
//! - Verb builders (select, insert, insert-or-update, update, delete and
//!   create table) borrowed from a [`Database`] handle
//! - A WHERE-clause renderer driven by [`Condition`] descriptors, with
//!   grouping, `and`/`or` chaining and operator-specific rendering
//! - Named `:placeholder` binding with a per-statement uniqueness guard
//! - MySQL and SQLite dialects for the parts of SQL they disagree on
//!
//! ## Building a WHERE clause
//!
//! Values never appear in the SQL text. Each condition renders a named
//! placeholder and its value is bound separately:
//!
//! ```rust
//! use livedb_core::{render_where, Condition, MySqlDialect, Operator};
//!
//! let conditions = vec![
//!     Condition::new("age").value(18).op(Operator::BiggerEqual).normalize().unwrap(),
//!     Condition::new("name").value("").or().normalize().unwrap(),
//! ];
//! let clause = render_where(&conditions, &MySqlDialect::new());
//! assert_eq!(clause.sql, "where age>=:age or name is null");
//! ```
//!
//! ## Running statements
//!
//! Builders render lazily and execute through a [`Connection`]:
//!
//! ```rust,ignore
//! let db = Database::new(driver).with_prefix("app");
//! let id = db
//!     .insert("##users")
//!     .field_add("name", "Ada", ParamType::Str)?
//!     .run(&RunOptions::default())
//!     .await?;
//! let updated = db
//!     .update("##users")
//!     .field_add("name", "Ada Lovelace", ParamType::Str)?
//!     .where_add(Condition::new("id").value(id))?
//!     .run(&RunOptions::default())
//!     .await?;
//! ```

pub mod bind;
pub mod builder;
pub mod condition;
pub mod database;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod field;
pub mod guard;
pub mod hook;
pub mod placeholder;
pub mod render;
pub mod types;
pub mod value;

pub use bind::{BindOptions, Binding, ParamBinder};
pub use builder::{
    apply_prefix, ColumnDef, Create, Delete, ErrorPolicy, Insert, InsertUpdate, JoinConstraint,
    PreparedQuery, Reference, RunOptions, Select, Update, WhereState,
};
pub use condition::Condition;
pub use database::Database;
pub use dialect::{CreateOptions, Dialect, MySqlDialect, SqliteDialect};
pub use driver::{Connection, ExecResult, Row, Statement};
pub use error::{BuildError, DriverError, DriverErrorKind, Error, Result, StateReason};
pub use field::FieldAssignment;
pub use guard::PlaceholderGuard;
pub use hook::{AuditEntry, RunHook, RunOutcome, RunReport};
pub use render::{render_where, RenderedWhere};
pub use types::{Conjunction, Format, JoinKind, Operator, ParamType, Parenthesis, RefAction};
pub use value::{SqlValue, ToSqlValue};
