//! Run hooks and audit logging.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::bind::Binding;
use crate::driver::Row;

/// What a successful run produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome<'a> {
    /// Rows fetched by a select.
    Rows(&'a [Row]),
    /// Rows affected by an update, delete or truncate.
    Count(u64),
    /// Id generated by an insert.
    Id(i64),
    /// Statement completed without a meaningful result.
    Done,
}

/// Passed to the run hook after each successful execution.
#[derive(Debug, Clone, Copy)]
pub struct RunReport<'a> {
    /// Final SQL, after table prefix substitution.
    pub query: &'a str,
    pub bindings: &'a [Binding],
    pub outcome: RunOutcome<'a>,
    /// Wall-clock time spent in the driver.
    pub elapsed: Duration,
}

/// Observer invoked after every successful run.
pub type RunHook = Arc<dyn Fn(&RunReport<'_>) + Send + Sync>;

/// Event written to the `sys_logs` audit table when a run asks for it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditEntry {
    /// Application-defined event code.
    pub event: i64,
    pub user: Option<i64>,
    pub agent: Option<String>,
    pub ip: Option<String>,
}

impl AuditEntry {
    #[must_use]
    pub const fn new(event: i64) -> Self {
        Self {
            event,
            user: None,
            agent: None,
            ip: None,
        }
    }

    #[must_use]
    pub const fn user(mut self, user: i64) -> Self {
        self.user = Some(user);
        self
    }

    /// Records the client user agent and address.
    #[must_use]
    pub fn client(mut self, agent: impl Into<String>, ip: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self.ip = Some(ip.into());
        self
    }
}

/// Insert statement used to record an [`AuditEntry`].
pub const AUDIT_INSERT: &str = "insert into sys_logs(time,log,user_id,agent,ip,query) \
                                values(:time,:log,:user,:agent,:ip,:query)";

impl fmt::Display for RunOutcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows(rows) => write!(f, "{} rows", rows.len()),
            Self::Count(n) => write!(f, "{n} affected"),
            Self::Id(id) => write!(f, "id {id}"),
            Self::Done => f.write_str("done"),
        }
    }
}
