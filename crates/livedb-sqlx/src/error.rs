//! Mapping of sqlx failures onto driver error kinds.

use std::future::Future;
use std::time::Duration;

use livedb_core::{DriverError, DriverErrorKind};

/// Wraps a sqlx error, classifying it by cause.
pub fn driver_error(error: sqlx::Error) -> DriverError {
    let kind = match &error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Configuration(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => DriverErrorKind::Connection,
        sqlx::Error::PoolTimedOut => DriverErrorKind::Timeout,
        sqlx::Error::Database(_) | sqlx::Error::Protocol(_) => DriverErrorKind::Statement,
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::TypeNotFound { .. } => DriverErrorKind::Decode,
        _ => DriverErrorKind::Other,
    };
    DriverError::new(kind, error)
}

/// Reclassifies a failure while opening a connection. Timeouts keep
/// their kind.
pub fn connect_error(error: DriverError) -> DriverError {
    match error.kind() {
        DriverErrorKind::Timeout | DriverErrorKind::Connection => error,
        _ => DriverError::new(DriverErrorKind::Connection, error),
    }
}

/// Awaits `future`, failing with [`DriverErrorKind::Timeout`] once
/// `limit` elapses.
pub async fn with_deadline<T>(
    limit: Option<Duration>,
    future: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, DriverError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|elapsed| DriverError::new(DriverErrorKind::Timeout, elapsed))?
            .map_err(driver_error),
        None => future.await.map_err(driver_error),
    }
}
