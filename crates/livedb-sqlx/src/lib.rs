//! # livedb-sqlx
//!
//! SQLite and MySQL drivers for `livedb-core`, built on sqlx.
//!
//! Each driver owns one connection and implements
//! [`livedb_core::Connection`]: statements written with named
//! `:placeholders` are rewritten to positional `?` parameters, values are
//! bound according to their declared type, and fetched rows are decoded
//! into [`livedb_core::Row`]s.
//!
//! ```rust,no_run
//! use livedb_core::{Condition, ParamType, RunOptions};
//! use livedb_sqlx::{DbConfig, SqliteDriver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = SqliteDriver::open(&DbConfig::new("sqlite::memory:")).await?;
//! db.create("users")
//!     .add(livedb_core::ColumnDef::new("id", livedb_core::Format::Int).primary())
//!     .add(livedb_core::ColumnDef::new("name", livedb_core::Format::Text))
//!     .run(&livedb_core::CreateOptions::default())
//!     .await?;
//! let id = db
//!     .insert("users")
//!     .field_add("name", "Ann", ParamType::Str)?
//!     .run(&RunOptions::default())
//!     .await?;
//! let user = db
//!     .select("users")
//!     .where_add(Condition::new("id").value(id))?
//!     .run_first(&RunOptions::default())
//!     .await?;
//! assert!(user.is_some());
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
mod mysql;
mod sqlite;
mod statement;

pub use config::{Backend, ConfigError, DbConfig};
pub use error::driver_error;
pub use mysql::MySqlDriver;
pub use sqlite::SqliteDriver;
pub use statement::NamedStatement;
