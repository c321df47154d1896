//! Error types for statement building and execution.

use std::fmt;

use thiserror::Error;

/// Why a builder refused a new condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateReason {
    /// An `exists` condition was registered; nothing may follow it.
    Blocked,
    /// `exists` may only be the first condition.
    ExistsNotFirst,
}

impl fmt::Display for StateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocked => f.write_str("no more conditions allowed"),
            Self::ExistsNotFirst => {
                f.write_str("the operator 'exists' must be the first condition")
            }
        }
    }
}

/// Errors detected while registering conditions or fields on a builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The builder does not accept this condition in its current state.
    #[error("{0}")]
    BuilderState(StateReason),

    /// Placeholder already registered by another condition or field.
    #[error("the placeholder '{0}' is already registered")]
    DuplicatePlaceholder(String),

    /// A field name that cannot double as a bind name.
    #[error("the field '{0}' needs a custom placeholder")]
    AmbiguousField(String),

    /// `between` or `not between` without its upper bound.
    #[error("the field '{0}' needs a second value for between")]
    MissingSecondValue(String),

    /// An update statement with nothing to set.
    #[error("no fields to update in '{0}'")]
    EmptyFieldList(String),

    /// An insert-or-update statement with no field flagged for update.
    #[error("no field flagged for update in '{0}'")]
    NoUpsertFields(String),

    /// A table-level constraint naming a column that was never added.
    #[error("field '{0}' not found")]
    UnknownColumn(String),

    /// Execution attempted on a builder that recorded an earlier error.
    #[error("builder rejected: {0}")]
    Rejected(Box<BuildError>),
}

impl BuildError {
    /// Returns `true` for errors caused by the builder's state machine.
    #[must_use]
    pub const fn is_builder_state(&self) -> bool {
        matches!(self, Self::BuilderState(_))
    }
}

/// Broad category of a driver failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// Establishing or keeping the connection.
    Connection,
    /// Preparing or executing a statement.
    Statement,
    /// A placeholder in the statement was never bound.
    UnboundPlaceholder,
    /// A connect or statement deadline elapsed.
    Timeout,
    /// A fetched column could not be decoded.
    Decode,
    /// Anything else.
    Other,
}

/// A failure surfaced by the underlying database driver.
#[derive(Debug, Error)]
#[error("{kind:?} error: {source}")]
pub struct DriverError {
    kind: DriverErrorKind,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl DriverError {
    /// Wraps a driver-specific error.
    pub fn new(
        kind: DriverErrorKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    /// Returns the category of this failure.
    #[must_use]
    pub const fn kind(&self) -> DriverErrorKind {
        self.kind
    }
}

/// Top-level error for builder and database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Structural error detected while building a statement.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Error reported by the driver while preparing or executing.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl Error {
    /// Returns the build error, if this is one.
    #[must_use]
    pub const fn as_build(&self) -> Option<&BuildError> {
        match self {
            Self::Build(e) => Some(e),
            Self::Driver(_) => None,
        }
    }
}

/// Result type alias for builder and database operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_messages() {
        assert_eq!(
            BuildError::DuplicatePlaceholder(String::from("id")).to_string(),
            "the placeholder 'id' is already registered"
        );
        assert_eq!(
            BuildError::BuilderState(StateReason::Blocked).to_string(),
            "no more conditions allowed"
        );
        assert_eq!(
            BuildError::AmbiguousField(String::from("t.col")).to_string(),
            "the field 't.col' needs a custom placeholder"
        );
    }

    #[test]
    fn test_driver_error_kind() {
        let err = DriverError::new(DriverErrorKind::Timeout, "statement deadline elapsed");
        assert_eq!(err.kind(), DriverErrorKind::Timeout);
        assert!(err.to_string().contains("statement deadline elapsed"));

        let err: Error = err.into();
        assert!(err.as_build().is_none());
    }

    #[test]
    fn test_rejected_wraps_original() {
        let err = BuildError::Rejected(Box::new(BuildError::AmbiguousField(String::from("a.b"))));
        assert!(err
            .to_string()
            .ends_with("the field 'a.b' needs a custom placeholder"));
    }
}
