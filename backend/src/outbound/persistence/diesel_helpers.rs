//! Shared Diesel error classification for the repository adapters.
//!
//! Repositories translate [`DbFailure`] into their own port error so the
//! decision about which database conditions are transient lives in one place.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Coarse classification of a failed Diesel operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DbFailure {
    /// The database could not be reached or dropped the connection.
    Connection(String),
    /// A unique constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// A foreign key constraint rejected the write.
    ForeignKeyViolation { constraint: Option<String> },
    /// Any other query failure.
    Query(String),
}

impl DbFailure {
    /// Constraint name reported by PostgreSQL, lowercased.
    pub fn constraint(&self) -> Option<String> {
        match self {
            Self::UniqueViolation { constraint } | Self::ForeignKeyViolation { constraint } => {
                constraint.as_deref().map(str::to_lowercase)
            }
            Self::Connection(_) | Self::Query(_) => None,
        }
    }
}

/// Classify a Diesel error, logging the raw driver message at debug level.
///
/// Driver messages can contain row data, so only the classification leaves
/// this function in error values.
pub(crate) fn classify_diesel_error(error: DieselError, operation: &'static str) -> DbFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), operation, "diesel operation failed");
        }
        other => debug!(error = %other, operation, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(kind, info) => {
            let constraint = info.constraint_name().map(str::to_owned);
            match kind {
                DatabaseErrorKind::UniqueViolation => DbFailure::UniqueViolation { constraint },
                DatabaseErrorKind::ForeignKeyViolation => {
                    DbFailure::ForeignKeyViolation { constraint }
                }
                DatabaseErrorKind::ClosedConnection => {
                    DbFailure::Connection("database connection error".to_owned())
                }
                _ => DbFailure::Query("database error".to_owned()),
            }
        }
        DieselError::NotFound => DbFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => DbFailure::Query("database query error".to_owned()),
        DieselError::BrokenTransactionManager => {
            DbFailure::Connection("transaction manager broken".to_owned())
        }
        _ => DbFailure::Query("database error".to_owned()),
    }
}
