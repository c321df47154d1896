#![allow(dead_code)]

use livedb_core::{ColumnDef, CreateOptions, Database, Format, RefAction, Reference};
use livedb_sqlx::{DbConfig, SqliteDriver};

pub async fn memory_db() -> Database<SqliteDriver> {
    SqliteDriver::open(&DbConfig::new("sqlite::memory:"))
        .await
        .unwrap_or_else(|e| panic!("failed to open in-memory database: {e}"))
}

/// Opens an in-memory database with `users` and `posts` tables.
pub async fn seeded_db() -> Database<SqliteDriver> {
    let db = memory_db().await;
    db.create("users")
        .add(ColumnDef::new("id", Format::Int).primary().auto_increment())
        .add(ColumnDef::new("name", Format::Varchar(60)).not_null())
        .add(ColumnDef::new("email", Format::Varchar(120)).unique())
        .add(ColumnDef::new("age", Format::Int))
        .add(ColumnDef::new("bio", Format::Text))
        .add(ColumnDef::new("order", Format::Int).default("0"))
        .run(&CreateOptions::default())
        .await
        .unwrap();
    db.create("posts")
        .add(ColumnDef::new("id", Format::Int).primary().auto_increment())
        .add(
            ColumnDef::new("user", Format::Int)
                .references(Reference::new("users", "id").on_delete(RefAction::Cascade)),
        )
        .add(ColumnDef::new("title", Format::Text))
        .run(&CreateOptions::default())
        .await
        .unwrap();
    db
}
