mod common;

use std::sync::{Arc, Mutex};

use common::{mysql_db, row, sqlite_db, Event, MockConnection};
use livedb_core::{
    AuditEntry, BuildError, ColumnDef, Condition, CreateOptions, Database, DriverErrorKind, Error,
    ErrorPolicy, FieldAssignment, Format, ParamType, RunOptions, SqlValue,
};

#[tokio::test]
async fn select_run_binds_and_returns_rows() {
    let (db, conn) = mysql_db();
    conn.set_rows(vec![row(&[
        ("id", SqlValue::Int(7)),
        ("name", SqlValue::from("Ann")),
    ])]);
    let rows = db
        .select("users")
        .where_add(Condition::new("name").value("Ann"))
        .unwrap()
        .run(&RunOptions::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("id"), Some(&SqlValue::Int(7)));
    assert_eq!(
        conn.events(),
        vec![Event::Fetch {
            sql: String::from("select * from users where name=:name"),
            binds: vec![(String::from("name"), SqlValue::from("Ann"), ParamType::Str)],
        }]
    );
}

#[tokio::test]
async fn run_first_returns_none_on_empty() {
    let (db, _) = mysql_db();
    let first = db
        .select("users")
        .run_first(&RunOptions::default())
        .await
        .unwrap();
    assert!(first.is_none());
}

#[tokio::test]
async fn builders_can_run_twice() {
    let (db, conn) = mysql_db();
    let delete = db
        .delete("sessions")
        .where_add(Condition::new("user").value(3))
        .unwrap();
    delete.run(&RunOptions::default()).await.unwrap();
    delete.run(&RunOptions::default()).await.unwrap();
    let statements = conn.statements();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0], statements[1]);
}

#[tokio::test]
async fn insert_returns_generated_id() {
    let (db, _) = mysql_db();
    let first = db
        .insert("users")
        .field_add("name", "Ann", ParamType::Str)
        .unwrap()
        .run(&RunOptions::default())
        .await
        .unwrap();
    let second = db
        .insert("users")
        .field_add("name", "Bob", ParamType::Str)
        .unwrap()
        .run(&RunOptions::default())
        .await
        .unwrap();
    assert_eq!((first, second), (1, 2));
}

#[tokio::test]
async fn empty_insert_does_not_execute() {
    let (db, conn) = mysql_db();
    let id = db
        .insert("users")
        .run(&RunOptions::default())
        .await
        .unwrap();
    assert_eq!(id, 0);
    let id = db
        .insert_update("users")
        .run(&RunOptions::default())
        .await
        .unwrap();
    assert_eq!(id, 0);
    assert!(conn.events().is_empty());
}

#[tokio::test]
async fn empty_update_is_an_error() {
    let (db, conn) = mysql_db();
    let err = db
        .update("users")
        .where_add(Condition::new("id").value(1))
        .unwrap()
        .run(&RunOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.as_build(),
        Some(&BuildError::EmptyFieldList(String::from("users")))
    );
    assert!(conn.events().is_empty());
}

#[tokio::test]
async fn update_and_delete_report_affected_rows() {
    let (db, conn) = mysql_db();
    conn.set_affected(4);
    let updated = db
        .update("users")
        .field_add("active", 0, ParamType::Int)
        .unwrap()
        .run(&RunOptions::default())
        .await
        .unwrap();
    let deleted = db
        .delete("users")
        .run(&RunOptions::default())
        .await
        .unwrap();
    assert_eq!((updated, deleted), (4, 4));
}

#[tokio::test]
async fn deferred_error_blocks_run_but_keeps_builder() {
    let (db, conn) = mysql_db();
    let select = db
        .select("users")
        .policy(ErrorPolicy::Defer)
        .where_add(Condition::new("id").value(1))
        .unwrap()
        .where_add(Condition::new("id").value(2))
        .unwrap();
    assert_eq!(select.conditions().len(), 1);
    assert_eq!(select.query_get(), "select * from users where id=:id");
    assert_eq!(
        select.error(),
        Some(&BuildError::DuplicatePlaceholder(String::from("id")))
    );
    let err = select.run(&RunOptions::default()).await.unwrap_err();
    assert!(matches!(err.as_build(), Some(BuildError::Rejected(_))));
    assert!(conn.events().is_empty());
}

#[tokio::test]
async fn deferred_field_error_blocks_insert() {
    let (db, conn) = mysql_db();
    let insert = db
        .insert("t")
        .policy(ErrorPolicy::Defer)
        .field(FieldAssignment::new("a", 1, ParamType::Int).placeholder("p"))
        .unwrap()
        .field(FieldAssignment::new("b", 2, ParamType::Int).placeholder("p"))
        .unwrap();
    assert_eq!(insert.fields().len(), 1);
    assert_eq!(
        insert.error(),
        Some(&BuildError::DuplicatePlaceholder(String::from("p")))
    );
    let err = insert.run(&RunOptions::default()).await.unwrap_err();
    assert!(matches!(err.as_build(), Some(BuildError::Rejected(_))));

    let upsert = db
        .insert_update("t")
        .policy(ErrorPolicy::Defer)
        .field_add("a", 1, ParamType::Int)
        .unwrap()
        .field(
            FieldAssignment::new("b", 2, ParamType::Int)
                .placeholder("a")
                .upsert(),
        )
        .unwrap();
    assert!(upsert.error().is_some());
    let err = upsert.run(&RunOptions::default()).await.unwrap_err();
    assert!(matches!(err.as_build(), Some(BuildError::Rejected(_))));
    assert!(conn.events().is_empty());
}

#[tokio::test]
async fn database_policy_is_inherited() {
    let db = Database::new(MockConnection::mysql()).with_policy(ErrorPolicy::Defer);
    let delete = db
        .delete("t")
        .where_add(Condition::new("a.b").value(1))
        .unwrap();
    assert_eq!(
        delete.error(),
        Some(&BuildError::AmbiguousField(String::from("a.b")))
    );
}

#[tokio::test]
async fn insert_from_select_uses_select_bindings() {
    let (db, conn) = mysql_db();
    let source = db
        .select("users")
        .fields(&["id", "name"])
        .where_add(Condition::new("active").value(1))
        .unwrap();
    db.insert("archive")
        .run_from_select(&["id", "name"], &source, &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(
        conn.events(),
        vec![Event::Execute {
            sql: String::from(
                "insert into archive(id,name) select id,name from users where active=:active"
            ),
            binds: vec![(String::from("active"), SqlValue::Int(1), ParamType::Int)],
        }]
    );
}

#[tokio::test]
async fn hook_sees_every_successful_run() {
    let (_, conn) = mysql_db();
    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let db = Database::new(conn)
        .with_prefix("app")
        .on_run(move |report| {
            sink.lock()
                .unwrap()
                .push((report.query.to_owned(), report.outcome.to_string()));
        });
    db.insert("##users")
        .field_add("name", "Ann", ParamType::Str)
        .unwrap()
        .run(&RunOptions::default())
        .await
        .unwrap();
    db.select("##users")
        .run(&RunOptions::default())
        .await
        .unwrap();
    db.truncate("##users").await.unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (
                String::from("insert into app_users(name) values(:name)"),
                String::from("id 1")
            ),
            (
                String::from("select * from app_users"),
                String::from("0 rows")
            ),
            (
                String::from("truncate app_users"),
                String::from("1 affected")
            ),
        ]
    );
}

#[tokio::test]
async fn failed_run_skips_hook_and_surfaces_driver_error() {
    let (_, conn) = mysql_db();
    conn.fail_on("from users");
    let calls = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&calls);
    let db = Database::new(conn).on_run(move |_| *counter.lock().unwrap() += 1);
    let err = db
        .select("users")
        .run(&RunOptions::default())
        .await
        .unwrap_err();
    match err {
        Error::Driver(driver) => assert_eq!(driver.kind(), DriverErrorKind::Statement),
        other => panic!("expected driver error, got {other:?}"),
    }
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn audit_entry_is_written_after_statement() {
    let (db, conn) = mysql_db();
    let options = RunOptions::default().log(AuditEntry::new(12).user(5).client("curl", "10.0.0.1"));
    db.update("users")
        .field_add("name", "Ann & Co", ParamType::Str)
        .unwrap()
        .where_add(Condition::new("id").value(9))
        .unwrap()
        .run(&options)
        .await
        .unwrap();
    let events = conn.events();
    assert_eq!(events.len(), 2);
    let Event::Execute { sql, binds } = &events[1] else {
        panic!("expected audit insert, got {:?}", events[1]);
    };
    assert!(sql.starts_with("insert into sys_logs(time,log,user_id,agent,ip,query)"));
    let bound = |name: &str| {
        binds
            .iter()
            .find(|(placeholder, _, _)| placeholder == name)
            .map(|(_, value, _)| value.clone())
    };
    assert_eq!(bound("log"), Some(SqlValue::Int(12)));
    assert_eq!(bound("user"), Some(SqlValue::Int(5)));
    assert_eq!(bound("ip"), Some(SqlValue::from("10.0.0.1")));
    assert_eq!(
        bound("query"),
        Some(SqlValue::from(
            "update users set name='Ann &amp; Co' where id=9"
        ))
    );
}

#[tokio::test]
async fn transaction_commits_on_success() {
    let (db, conn) = mysql_db();
    let id = db
        .transaction(|db| async move {
            db.insert("users")
                .field_add("name", "Ann", ParamType::Str)?
                .run(&RunOptions::default())
                .await
        })
        .await
        .unwrap();
    assert_eq!(id, 1);
    let events = conn.events();
    assert_eq!(events.first(), Some(&Event::Begin));
    assert_eq!(events.last(), Some(&Event::Commit));
}

#[tokio::test]
async fn transaction_rolls_back_on_error() {
    let (db, conn) = mysql_db();
    conn.fail_on("into logs");
    let result: Result<i64, Error> = db
        .transaction(|db| async move {
            db.insert("users")
                .field_add("name", "Ann", ParamType::Str)?
                .run(&RunOptions::default())
                .await?;
            db.insert("logs")
                .field_add("msg", "created", ParamType::Str)?
                .run(&RunOptions::default())
                .await
        })
        .await;
    assert!(result.is_err());
    assert_eq!(conn.events().last(), Some(&Event::Rollback));
    assert!(!conn.events().contains(&Event::Commit));
}

#[tokio::test]
async fn transaction_handler_maps_failure() {
    let (db, conn) = mysql_db();
    conn.fail_on("delete");
    let outcome = db
        .transaction_with_handler(
            |db| async move { db.delete("users").run(&RunOptions::default()).await },
            |_| u64::MAX,
        )
        .await
        .unwrap();
    assert_eq!(outcome, u64::MAX);
    assert_eq!(conn.events().last(), Some(&Event::Rollback));
}

#[tokio::test]
async fn truncate_per_dialect() {
    let (db, conn) = sqlite_db();
    db.truncate("logs").await.unwrap();
    assert_eq!(conn.statements(), ["delete from logs"]);
}

#[tokio::test]
async fn fields_get_reads_catalogue() {
    let (db, conn) = mysql_db();
    conn.set_rows(vec![
        row(&[("COLUMN_NAME", SqlValue::from("u.id"))]),
        row(&[("COLUMN_NAME", SqlValue::from("u.name"))]),
        row(&[("COLUMN_NAME", SqlValue::from("u.password"))]),
    ]);
    let db = db.with_database("shop");
    let select = db
        .select("users u")
        .fields_except("password", Some("u"))
        .await
        .unwrap();
    assert_eq!(select.query_get(), "select u.id,u.name from users u");
    assert_eq!(
        conn.statements()[0],
        "select concat('u.',COLUMN_NAME) as COLUMN_NAME from information_schema.columns \
         where table_schema='shop' and table_name='users' order by ORDINAL_POSITION"
    );
}

#[tokio::test]
async fn create_runs_ddl() {
    let (db, conn) = sqlite_db();
    db.create("tags")
        .add(ColumnDef::new("id", Format::Int).primary())
        .add(ColumnDef::new("label", Format::Text).not_null())
        .run(&CreateOptions::default().if_not_exists())
        .await
        .unwrap();
    assert_eq!(
        conn.statements(),
        ["create table if not exists tags(id integer primary key,label text not null)"]
    );
}
