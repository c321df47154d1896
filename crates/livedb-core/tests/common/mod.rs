#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use livedb_core::{
    Connection, Database, Dialect, DriverError, DriverErrorKind, ExecResult, MySqlDialect,
    ParamType, Row, SqlValue, SqliteDialect, Statement,
};

/// Something the mock connection was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Execute {
        sql: String,
        binds: Vec<(String, SqlValue, ParamType)>,
    },
    Fetch {
        sql: String,
        binds: Vec<(String, SqlValue, ParamType)>,
    },
    Exec(String),
    Begin,
    Commit,
    Rollback,
}

impl Event {
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Execute { sql, .. } | Self::Fetch { sql, .. } | Self::Exec(sql) => Some(sql),
            _ => None,
        }
    }
}

pub struct MockStatement {
    sql: String,
    binds: Vec<(String, SqlValue, ParamType)>,
}

impl Statement for MockStatement {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn bind_value(
        &mut self,
        placeholder: &str,
        value: &SqlValue,
        param_type: ParamType,
    ) -> Result<(), DriverError> {
        self.binds
            .push((placeholder.to_owned(), value.clone(), param_type));
        Ok(())
    }
}

/// A connection that records every call and answers with canned data.
#[derive(Debug, Clone)]
pub struct MockConnection {
    dialect: Arc<dyn Dialect>,
    pub events: Arc<Mutex<Vec<Event>>>,
    rows: Arc<Mutex<Vec<Row>>>,
    fail_on: Arc<Mutex<Option<String>>>,
    next_id: Arc<Mutex<i64>>,
    affected: Arc<Mutex<u64>>,
}

impl MockConnection {
    pub fn mysql() -> Self {
        Self::with_dialect(Arc::new(MySqlDialect::new()))
    }

    pub fn sqlite() -> Self {
        Self::with_dialect(Arc::new(SqliteDialect::new()))
    }

    fn with_dialect(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            events: Arc::default(),
            rows: Arc::default(),
            fail_on: Arc::default(),
            next_id: Arc::new(Mutex::new(1)),
            affected: Arc::new(Mutex::new(1)),
        }
    }

    /// Rows returned by every subsequent fetch.
    pub fn set_rows(&self, rows: Vec<Row>) {
        *self.rows.lock().unwrap() = rows;
    }

    /// Makes any statement containing `needle` fail.
    pub fn fail_on(&self, needle: &str) {
        *self.fail_on.lock().unwrap() = Some(needle.to_owned());
    }

    pub fn set_affected(&self, affected: u64) {
        *self.affected.lock().unwrap() = affected;
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// SQL text of every executed statement, in order.
    pub fn statements(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| e.sql().map(str::to_owned))
            .collect()
    }

    fn check(&self, sql: &str) -> Result<(), DriverError> {
        match self.fail_on.lock().unwrap().as_deref() {
            Some(needle) if sql.contains(needle) => Err(DriverError::new(
                DriverErrorKind::Statement,
                format!("mock failure on: {sql}"),
            )),
            _ => Ok(()),
        }
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Connection for MockConnection {
    type Statement = MockStatement;

    fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    fn prepare(&self, sql: &str) -> Result<MockStatement, DriverError> {
        Ok(MockStatement {
            sql: sql.to_owned(),
            binds: Vec::new(),
        })
    }

    async fn execute(&self, statement: MockStatement) -> Result<ExecResult, DriverError> {
        self.check(&statement.sql)?;
        let is_insert = statement.sql.starts_with("insert");
        self.record(Event::Execute {
            sql: statement.sql,
            binds: statement.binds,
        });
        let last_insert_id = if is_insert {
            let mut next = self.next_id.lock().unwrap();
            let id = *next;
            *next += 1;
            id
        } else {
            0
        };
        Ok(ExecResult {
            rows_affected: *self.affected.lock().unwrap(),
            last_insert_id,
        })
    }

    async fn fetch_all(&self, statement: MockStatement) -> Result<Vec<Row>, DriverError> {
        self.check(&statement.sql)?;
        self.record(Event::Fetch {
            sql: statement.sql,
            binds: statement.binds,
        });
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn exec(&self, sql: &str) -> Result<u64, DriverError> {
        self.check(sql)?;
        self.record(Event::Exec(sql.to_owned()));
        Ok(*self.affected.lock().unwrap())
    }

    fn last_insert_id(&self) -> i64 {
        *self.next_id.lock().unwrap() - 1
    }

    async fn begin(&self) -> Result<(), DriverError> {
        self.record(Event::Begin);
        Ok(())
    }

    async fn commit(&self) -> Result<(), DriverError> {
        self.record(Event::Commit);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DriverError> {
        self.record(Event::Rollback);
        Ok(())
    }
}

pub fn mysql_db() -> (Database<MockConnection>, MockConnection) {
    let conn = MockConnection::mysql();
    (Database::new(conn.clone()), conn)
}

pub fn sqlite_db() -> (Database<MockConnection>, MockConnection) {
    let conn = MockConnection::sqlite();
    (Database::new(conn.clone()), conn)
}

pub fn row(pairs: &[(&str, SqlValue)]) -> Row {
    pairs.iter().cloned().collect()
}
