//! Shared helpers for Diesel repository implementations.
//!
//! - Error classification from Diesel errors into the few outcomes the
//!   repositories distinguish.
//! - Revision casting between database and domain types.
//! - Row collection with a single conversion error.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

use super::pool::PoolError;

/// Extract a readable message from a pool error.
pub fn map_pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Outcome of a failed Diesel call, reduced to what repositories map on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DieselFailure {
    /// A unique constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// A foreign key constraint rejected the write or delete.
    ForeignKeyViolation { constraint: Option<String> },
    /// The connection dropped mid-call.
    Connection { message: &'static str },
    /// Anything else; the message is safe to surface.
    Query { message: &'static str },
}

/// Classify a Diesel error and emit debug context.
pub fn classify_diesel_error(error: DieselError, operation: &'static str) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), operation, "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            %error,
            operation,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DieselFailure::Query {
            message: "record not found",
        },
        DieselError::QueryBuilderError(_) => DieselFailure::Query {
            message: "database query error",
        },
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::UniqueViolation => DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            },
            DatabaseErrorKind::ForeignKeyViolation => DieselFailure::ForeignKeyViolation {
                constraint: info.constraint_name().map(str::to_owned),
            },
            DatabaseErrorKind::ClosedConnection => DieselFailure::Connection {
                message: "database connection error",
            },
            other => {
                warn!(kind = ?other, operation, "unmapped database error");
                DieselFailure::Query {
                    message: "database error",
                }
            }
        },
        _ => DieselFailure::Query {
            message: "database error",
        },
    }
}

/// True when `constraint` names the given column's foreign key.
///
/// Postgres names default FK constraints `<table>_<column>_fkey`.
pub fn constraint_mentions(constraint: Option<&str>, column: &str) -> bool {
    constraint.is_some_and(|name| name.contains(column))
}

/// Cast database revision (i32) to domain revision (u32).
///
/// A `CHECK (revision >= 1)` constraint keeps stored revisions positive.
#[expect(
    clippy::cast_sign_loss,
    reason = "revision is always positive in database"
)]
pub fn cast_revision(revision: i32) -> u32 {
    revision as u32
}

/// Cast domain revision (u32) to database revision (i32).
#[expect(
    clippy::cast_possible_wrap,
    reason = "revision values are always small positive integers"
)]
pub fn cast_revision_for_db(revision: u32) -> i32 {
    revision as i32
}

/// Collect row conversion results, mapping the first error through `map_err`.
pub fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}
