//! Connection settings.

use std::env;
use std::num::ParseIntError;
use std::time::Duration;

use livedb_core::{Connection, Database};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors raised while reading a [`DbConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    /// A numeric variable does not parse.
    #[error("invalid value {value:?} for {var}: {source}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// The URL scheme names no supported backend.
    #[error("unsupported database url: {0}")]
    UnsupportedUrl(String),
}

/// Which driver a URL selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    MySql,
}

/// Database connection settings.
///
/// Deserializes from any serde format; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// `sqlite:` or `mysql:` connection URL.
    pub url: String,
    /// Substituted for the `##` token in table names.
    pub prefix: Option<String>,
    /// Schema consulted for column lookups.
    pub database: Option<String>,
    pub connect_timeout_secs: u64,
    /// Deadline applied to every statement, if set.
    pub statement_timeout_secs: Option<u64>,
    /// Connection character set (MySQL only).
    pub charset: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::from("sqlite::memory:"),
            prefix: None,
            database: None,
            connect_timeout_secs: 5,
            statement_timeout_secs: None,
            charset: String::from("utf8mb4"),
        }
    }
}

impl DbConfig {
    /// Creates a configuration for `url` with default settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// `DATABASE_URL` is required; `LIVEDB_PREFIX`, `LIVEDB_DATABASE`,
    /// `LIVEDB_CONNECT_TIMEOUT` and `LIVEDB_STATEMENT_TIMEOUT` are optional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the URL is missing or a timeout is not a
    /// number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?;
        let mut config = Self::new(url);
        config.prefix = lookup("LIVEDB_PREFIX").filter(|p| !p.is_empty());
        config.database = lookup("LIVEDB_DATABASE").filter(|d| !d.is_empty());

        if let Some(secs) = parse_secs(&lookup, "LIVEDB_CONNECT_TIMEOUT")? {
            info!(secs, "overriding connect timeout from env");
            config.connect_timeout_secs = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "LIVEDB_STATEMENT_TIMEOUT")? {
            info!(secs, "statement timeout set from env");
            config.statement_timeout_secs = Some(secs);
        }
        Ok(config)
    }

    /// Returns the backend selected by the URL scheme.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedUrl`] for any other scheme.
    pub fn backend(&self) -> Result<Backend, ConfigError> {
        if self.url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else if self.url.starts_with("mysql:") || self.url.starts_with("mariadb:") {
            Ok(Backend::MySql)
        } else {
            Err(ConfigError::UnsupportedUrl(self.url.clone()))
        }
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_secs.map(Duration::from_secs)
    }

    /// Wraps `conn` in a [`Database`] carrying this prefix and schema.
    #[must_use]
    pub fn database<C: Connection>(&self, conn: C) -> Database<C> {
        let mut db = Database::new(conn);
        if let Some(prefix) = &self.prefix {
            db = db.with_prefix(prefix.as_str());
        }
        if let Some(database) = &self.database {
            db = db.with_database(database.as_str());
        }
        db
    }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|source| ConfigError::InvalidNumber { var, value, source })
        })
        .transpose()
}
