use sea_orm::error::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};

/// Serializable error body handed to whatever request layer sits in front of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable category (e.g. "validation_error", "conflict")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Whether the caller may retry the whole operation
    pub retryable: bool,
    /// ISO 8601 timestamp when error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Postgres: lock_not_available, deadlock_detected, serialization_failure.
/// SQLite: SQLITE_BUSY / SQLITE_LOCKED.
const CONTENTION_MARKERS: [&str; 7] = [
    "55P03",
    "40P01",
    "40001",
    "lock timeout",
    "deadlock detected",
    "could not serialize access",
    "database is locked",
];

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return ServiceError::Conflict(format!("unique constraint violated: {}", detail));
        }

        let message = err.to_string();
        if CONTENTION_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
        {
            return ServiceError::Conflict(format!("row lock not acquired: {}", message));
        }

        ServiceError::DatabaseError(err)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<config::ConfigError> for ServiceError {
    fn from(err: config::ConfigError) -> Self {
        ServiceError::ConfigError(err.to_string())
    }
}

impl ServiceError {
    /// Only conflicts are worth retrying; everything else fails the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Stable category string for callers that need to branch on the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::NotFound(_) => "not_found",
            Self::ValidationError(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::InvariantViolation(_) => "invariant_violation",
            Self::EventError(_) => "event_error",
            Self::ConfigError(_) => "config_error",
            Self::InternalError(_) => "internal_error",
        }
    }

    /// Returns the error message suitable for callers outside the engine.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::EventError(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.kind().to_string(),
            message: self.response_message(),
            retryable: self.is_retryable(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_errors_are_classified_as_conflicts() {
        let err: ServiceError =
            DbErr::Custom("canceling statement due to lock timeout (55P03)".into()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(err.is_retryable());

        let err: ServiceError = DbErr::Custom("database is locked".into()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn plain_database_errors_stay_database_errors() {
        let err: ServiceError = DbErr::Custom("connection reset".into()).into();
        assert!(matches!(err, ServiceError::DatabaseError(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::InternalError("sensitive".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::DatabaseError(DbErr::Custom("secret dsn".into())).response_message(),
            "Database error"
        );
        assert_eq!(
            ServiceError::ValidationError("quantity must be positive".into()).response_message(),
            "Validation error: quantity must be positive"
        );
    }

    #[test]
    fn response_carries_kind_and_retry_hint() {
        let body = ServiceError::Conflict("number taken".into()).to_response();
        assert_eq!(body.error, "conflict");
        assert!(body.retryable);

        let body = ServiceError::NotFound("goods 7".into()).to_response();
        assert_eq!(body.error, "not_found");
        assert!(!body.retryable);
    }
}
