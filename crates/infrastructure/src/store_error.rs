use proofai_core::AppError;

/// SQLSTATE raised when `statement_timeout` cancels a query.
const QUERY_CANCELED: &str = "57014";

/// Maps a sqlx failure into an application error.
///
/// Timeouts and connectivity failures become `UpstreamUnavailable` so callers
/// can degrade instead of failing hard. Unique violations become `Conflict`.
pub(crate) fn store_error(context: &str, error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        if database_error.is_unique_violation() {
            return AppError::Conflict(format!("{context}: {error}"));
        }
    }

    let unavailable = match &error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(database_error) => {
            database_error.code().as_deref() == Some(QUERY_CANCELED)
        }
        _ => false,
    };

    if unavailable {
        return AppError::UpstreamUnavailable(format!("{context}: {error}"));
    }

    AppError::Internal(format!("{context}: {error}"))
}

/// Converts a stored non-negative integer column into `u32`.
pub(crate) fn stored_count(column: &str, value: i32) -> Result<u32, AppError> {
    u32::try_from(value)
        .map_err(|_| AppError::Internal(format!("column '{column}' holds negative value {value}")))
}

/// Converts a count into the `INTEGER` column representation.
pub(crate) fn column_count(column: &str, value: u32) -> Result<i32, AppError> {
    i32::try_from(value).map_err(|_| {
        AppError::Validation(format!("value {value} for '{column}' exceeds the storable range"))
    })
}
