// 🚨 Error Taxonomy
// One typed error for every request path: store access, validation, empty
// results and malformed records never collapse into a single message.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightsError {
    /// Store could not be opened (a.k.a. DataUnavailable)
    #[error("Unable to connect to the database: {0}")]
    ConnectionFailure(String),

    /// Missing or empty required parameter, rejected before any fetch
    #[error("{0}")]
    Validation(String),

    /// Well-formed query that matched zero rows
    #[error("{0}")]
    NotFound(String),

    /// Malformed filter or failing statement
    #[error("Query failed: {0}")]
    Query(String),

    /// A row that cannot be decoded into its typed record
    #[error("Malformed record: {0}")]
    Transformation(String),
}

impl InsightsError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            InsightsError::ConnectionFailure(_) => "DATA_UNAVAILABLE",
            InsightsError::Validation(_) => "VALIDATION_ERROR",
            InsightsError::NotFound(_) => "NOT_FOUND",
            InsightsError::Query(_) => "QUERY_ERROR",
            InsightsError::Transformation(_) => "TRANSFORMATION_ERROR",
        }
    }

    /// HTTP status the boundary should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            InsightsError::ConnectionFailure(_) => 500,
            InsightsError::Validation(_) | InsightsError::Query(_) => 400,
            InsightsError::NotFound(_) => 404,
            InsightsError::Transformation(_) => 500,
        }
    }
}

/// Store-side failure codes: the caller did nothing wrong, the store is unusable
fn is_store_failure(code: rusqlite::ErrorCode) -> bool {
    use rusqlite::ErrorCode;

    matches!(
        code,
        ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::NotADatabase
            | ErrorCode::SystemIoFailure
            | ErrorCode::CannotOpen
            | ErrorCode::ReadOnly
            | ErrorCode::DiskFull
            | ErrorCode::PermissionDenied
    )
}

impl From<rusqlite::Error> for InsightsError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => {
                InsightsError::Transformation(err.to_string())
            }
            rusqlite::Error::SqliteFailure(failure, msg) => {
                let detail = msg.unwrap_or_else(|| failure.to_string());
                // A store without the expected schema is not usable yet
                if is_store_failure(failure.code) || detail.starts_with("no such table") {
                    InsightsError::ConnectionFailure(detail)
                } else {
                    InsightsError::Query(detail)
                }
            }
            _ => InsightsError::Query(err.to_string()),
        }
    }
}

pub type InsightsResult<T> = Result<T, InsightsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(InsightsError::ConnectionFailure("x".into()).status_code(), 500);
        assert_eq!(InsightsError::NotFound("x".into()).status_code(), 404);
        assert_eq!(InsightsError::Validation("x".into()).status_code(), 400);
        assert_eq!(InsightsError::Query("x".into()).status_code(), 400);
        assert_eq!(InsightsError::Transformation("x".into()).status_code(), 500);
    }

    #[test]
    fn test_decoding_failures_are_transformation_errors() {
        let err: InsightsError =
            rusqlite::Error::InvalidColumnType(0, "date".to_string(), rusqlite::types::Type::Null)
                .into();
        assert_eq!(err.code(), "TRANSFORMATION_ERROR");

        let err: InsightsError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.code(), "QUERY_ERROR");
    }

    fn sqlite_failure(code: std::os::raw::c_int, msg: &str) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), Some(msg.to_string()))
    }

    #[test]
    fn test_store_failures_are_unavailable_not_caller_errors() {
        let cases = [
            sqlite_failure(rusqlite::ffi::SQLITE_BUSY, "database is locked"),
            sqlite_failure(rusqlite::ffi::SQLITE_CORRUPT, "database disk image is malformed"),
            sqlite_failure(rusqlite::ffi::SQLITE_NOTADB, "file is not a database"),
            sqlite_failure(rusqlite::ffi::SQLITE_IOERR, "disk I/O error"),
            sqlite_failure(rusqlite::ffi::SQLITE_ERROR, "no such table: material_data"),
        ];

        for err in cases {
            let err: InsightsError = err.into();
            assert_eq!(err.code(), "DATA_UNAVAILABLE", "{}", err);
            assert_eq!(err.status_code(), 500);
        }

        let err: InsightsError =
            sqlite_failure(rusqlite::ffi::SQLITE_ERROR, "near \"FROM\": syntax error").into();
        assert_eq!(err.code(), "QUERY_ERROR");
    }
}
