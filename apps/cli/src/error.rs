//! # CLI Error Type
//!
//! Unified error type for commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Botica                                 │
//! │                                                                         │
//! │  botica order add F-01 --line "Gasas:doce:0,80"                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  CliResult<T>                                                    │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::QueryFailed("...") ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Validation Error? ─── CoreError::InvalidLineSpec ─ CliError ──►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  stderr: error[VALIDATION_ERROR]: Invalid line 'Gasas:doce:0,80': ...   │
//! │  exit code: 2                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::process::ExitCode;
use thiserror::Error;

use botica_core::{CoreError, ValidationError};
use botica_db::DbError;

/// Error returned from commands.
///
/// With `--json` it is printed as:
/// ```json
/// { "code": "NOT_FOUND", "message": "Client not found: F-404" }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("error[{}]: {message}", .code.as_str())]
pub struct CliError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Business rule violated
    BusinessLogic,

    /// CSV or JSON file could not be read
    ImportError,

    /// Configuration could not be loaded
    ConfigError,

    /// File could not be read or written
    IoError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::BusinessLogic => "BUSINESS_LOGIC",
            ErrorCode::ImportError => "IMPORT_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl CliError {
    /// Creates a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }

    /// Process exit status: 2 for bad input, 3 for missing records, 1 otherwise.
    pub fn exit_code(&self) -> ExitCode {
        match self.code {
            ErrorCode::ValidationError => ExitCode::from(2),
            ErrorCode::NotFound => ExitCode::from(3),
            _ => ExitCode::FAILURE,
        }
    }
}

/// Converts database errors.
impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CliError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => CliError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                CliError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(e) => CliError::new(
                ErrorCode::DatabaseError,
                format!("Database connection failed: {}", e),
            ),
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                CliError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Csv(e) => CliError::new(ErrorCode::ImportError, format!("CSV: {}", e)),
            DbError::Json(e) => CliError::new(ErrorCode::ImportError, format!("JSON: {}", e)),
            DbError::Io(e) => CliError::new(ErrorCode::IoError, e),
            DbError::Core(e) => CliError::from(e),
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors.
impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ClientNotFound(id) => CliError::not_found("Client", &id),
            CoreError::OrderNotFound(id) => CliError::not_found("Order", &id),
            CoreError::VisitNotFound(id) => CliError::not_found("Visit", &id),
            e @ CoreError::EmptyOrder => CliError::validation(e.to_string()),
            e @ CoreError::InvalidLineSpec { .. } => CliError::validation(e.to_string()),
            e @ CoreError::VisitAlreadyOrdered { .. } => {
                CliError::new(ErrorCode::BusinessLogic, e.to_string())
            }
            CoreError::Validation(e) => CliError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(err.to_string())
    }
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

/// Result alias for commands.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let err = CliError::not_found("Client", "F-404");
        assert_eq!(err.to_string(), "error[NOT_FOUND]: Client not found: F-404");
    }

    #[test]
    fn test_db_errors_map_to_codes() {
        let err: CliError = DbError::duplicate("code", "F-01").into();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err: CliError = DbError::Core(CoreError::EmptyOrder).into();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err: CliError = DbError::Csv("bad quote".to_string()).into();
        assert_eq!(err.code, ErrorCode::ImportError);
    }

    #[test]
    fn test_already_ordered_is_business_logic() {
        let err: CliError = CoreError::VisitAlreadyOrdered {
            visit_id: "v1".to_string(),
            order_id: "o1".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert!(err.message.contains("v1"));
    }

    #[test]
    fn test_json_shape() {
        let err = CliError::validation("name is required");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"code":"VALIDATION_ERROR","message":"name is required"}"#);
    }
}
