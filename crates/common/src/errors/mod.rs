//! Error types for the DOF archive services
//!
//! Provides:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - The `{"message": ...}` error envelope
//! - Classification of MySQL data errors into client errors

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, RuntimeErr};
use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlDatabaseError;
use thiserror::Error;

use crate::pdf::ResolveError;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// MySQL error numbers that describe bad input rather than a broken server:
/// 1048 column cannot be null, 1264 out of range, 1265 data truncated
/// (bad ENUM value), 1292 incorrect typed value, 1366 incorrect value,
/// 1406 data too long, 1452 foreign key failure, 3819 CHECK violated.
const DATA_ERROR_NUMBERS: &[u16] = &[1048, 1264, 1265, 1292, 1366, 1406, 1452, 3819];

/// Whether a MySQL error number is caused by the submitted data
pub fn is_data_error(number: u16) -> bool {
    DATA_ERROR_NUMBERS.contains(&number)
}

/// Error codes for machine-readable error identification in logs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    MissingField,
    InvalidFormat,
    ConstraintViolation,
    NotFound,
    DatabaseError,
    ConnectionError,
    UnsupportedStorage,
    UpstreamError,
    InternalError,
    ConfigurationError,
    SerializationError,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("Invalid request body: {message}")]
    InvalidFormat { message: String },

    #[error("Invalid request parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Data error (ENUM or length): {message}")]
    Constraint { message: String },

    // Resource errors
    #[error("{resource_type} with id {id} not found")]
    NotFound { resource_type: String, id: String },

    #[error("{resource_type} with id {id} not found or unchanged")]
    Unchanged { resource_type: String, id: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Document retrieval errors
    #[error("{message}")]
    UnsupportedStorage { message: String },

    #[error("Could not retrieve the PDF: {message}")]
    Upstream { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a missing row
    pub fn not_found(resource_type: &str, id: impl ToString) -> Self {
        AppError::NotFound {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingFields { .. } => ErrorCode::MissingField,
            AppError::InvalidFormat { .. } |
            AppError::InvalidParameter { .. } => ErrorCode::InvalidFormat,
            AppError::Constraint { .. } => ErrorCode::ConstraintViolation,
            AppError::NotFound { .. } | AppError::Unchanged { .. } => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::UnsupportedStorage { .. } => ErrorCode::UnsupportedStorage,
            AppError::Upstream { .. } => ErrorCode::UpstreamError,
            AppError::Internal { .. } | AppError::Other(_) => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::MissingFields { .. } |
            AppError::InvalidFormat { .. } |
            AppError::InvalidParameter { .. } |
            AppError::Constraint { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound { .. } |
            AppError::Unchanged { .. } => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            AppError::Database(_) |
            AppError::DatabaseConnection { .. } |
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 501 Not Implemented
            AppError::UnsupportedStorage { .. } => StatusCode::NOT_IMPLEMENTED,

            // 502 Bad Gateway
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Error envelope returned by every failing route
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => AppError::DatabaseConnection {
                message: err.to_string(),
            },
            _ => match mysql_error_number(&err) {
                Some(number) if is_data_error(number) => AppError::Constraint {
                    message: err.to_string(),
                },
                _ => AppError::Database(err),
            },
        }
    }
}

/// Extract the server error number from a MySQL statement failure
fn mysql_error_number(err: &DbErr) -> Option<u16> {
    let runtime = match err {
        DbErr::Exec(runtime) | DbErr::Query(runtime) => runtime,
        _ => return None,
    };

    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) => db_err
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(|e| e.number()),
        _ => None,
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidFormat {
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidParameter {
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidParameter {
            message: rejection.body_text(),
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::UnsupportedScheme { .. } => AppError::UnsupportedStorage {
                message: err.to_string(),
            },
            other => AppError::Upstream {
                message: other.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string()
        }
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Internal {
            message: format!("Failed to build zip bundle: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_mapping() {
        let err = AppError::not_found("Summary", 42);
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Summary with id 42 not found");
    }

    #[test]
    fn test_missing_fields_message() {
        let err = AppError::MissingFields {
            fields: vec!["model".into(), "confidence".into()],
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing required fields: model, confidence");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_connection_failure_is_server_error() {
        let err: AppError = DbErr::Conn(RuntimeErr::Internal("refused".into())).into();
        assert!(matches!(err, AppError::DatabaseConnection { .. }));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_generic_db_error_is_500() {
        let err: AppError = DbErr::Custom("boom".into()).into();
        assert!(matches!(err, AppError::Database(_)));
        assert!(err.is_server_error());
    }

    #[test]
    fn test_data_error_numbers() {
        for number in [1048, 1264, 1265, 1292, 1366, 1406, 1452, 3819] {
            assert!(is_data_error(number), "{} should be a data error", number);
        }
        // duplicate key, lock wait timeout, server gone away
        for number in [1062, 1205, 2006] {
            assert!(!is_data_error(number));
        }
    }

    #[test]
    fn test_error_number_only_read_from_statement_failures() {
        assert_eq!(mysql_error_number(&DbErr::Custom("1406".into())), None);
        assert_eq!(
            mysql_error_number(&DbErr::Conn(RuntimeErr::Internal("refused".into()))),
            None
        );

        let exec = DbErr::Exec(RuntimeErr::Internal("not a driver error".into()));
        assert_eq!(mysql_error_number(&exec), None);

        let err: AppError = exec.into();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_non_database_sqlx_error_is_not_classified() {
        let err = DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::RowNotFound));
        assert_eq!(mysql_error_number(&err), None);
        assert!(matches!(AppError::from(err), AppError::Database(_)));
    }

    #[test]
    fn test_invalid_parameter_is_400() {
        let err = AppError::InvalidParameter {
            message: "Cannot parse `abc` to a `i64`".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_resolve_error_mapping() {
        let unsupported: AppError = ResolveError::UnsupportedScheme {
            uri: "s3://bucket/key".into(),
        }
        .into();
        assert_eq!(unsupported.status_code(), StatusCode::NOT_IMPLEMENTED);

        let missing: AppError = ResolveError::NotFound {
            uri: "/nowhere.pdf".into(),
        }
        .into();
        assert_eq!(missing.status_code(), StatusCode::BAD_GATEWAY);

        let upstream: AppError = ResolveError::Status {
            url: "http://example.test/a.pdf".into(),
            status: 503,
        }
        .into();
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);
    }
}
