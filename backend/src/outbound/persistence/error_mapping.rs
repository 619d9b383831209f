//! Diesel and pool failures mapped onto [`PersistenceError`].

use tracing::debug;

use crate::domain::ports::PersistenceError;

use super::pool::PoolError;

/// Map pool checkout failures to connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> PersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            PersistenceError::connection(message)
        }
    }
}

/// Map Diesel failures, keeping `NotFound` as the sentinel.
pub(crate) fn map_diesel_error(error: diesel::result::Error) -> PersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => PersistenceError::not_found(),
        DieselError::QueryBuilderError(_) => PersistenceError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            PersistenceError::connection("database connection error")
        }
        DieselError::SerializationError(err) | DieselError::DeserializationError(err) => {
            PersistenceError::query(err.to_string())
        }
        _ => PersistenceError::query("database error"),
    }
}
