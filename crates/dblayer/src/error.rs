//! Error types for dblayer

use std::time::Duration;
use thiserror::Error;

/// Result type alias for dblayer operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Boxed error produced by a backend that is not PostgreSQL.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Unsupported backend tag or unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// PostgreSQL query execution error, returned as reported by the server
    #[cfg(feature = "pool")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Error reported by any other backend, returned unchanged
    #[error("Backend error: {0}")]
    Backend(#[source] BoxError),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Misuse of the builder (DELETE without WHERE, empty SET, mismatched batch keys, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A builder tried to execute without a pool or transaction bound to it
    #[error("No executor bound: {0}")]
    NoExecutor(String),

    /// The active dialect cannot express the requested operation
    #[error("Unsupported by {dialect}: {feature}")]
    Unsupported {
        dialect: &'static str,
        feature: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Deadline exceeded before the statement completed
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the context
    #[error("Query cancelled")]
    Cancelled,

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an unsupported-feature error for a dialect
    pub fn unsupported(dialect: &'static str, feature: impl Into<String>) -> Self {
        Self::Unsupported {
            dialect,
            feature: feature.into(),
        }
    }

    /// Wrap an error produced by a non-PostgreSQL backend.
    pub fn backend(err: impl Into<BoxError>) -> Self {
        Self::Backend(err.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if the caller cancelled the operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if the backend reported a unique constraint violation (SQLSTATE 23505).
    pub fn is_unique_violation(&self) -> bool {
        self.sqlstate() == Some("23505")
    }

    /// Check if the backend reported a foreign key violation (SQLSTATE 23503).
    pub fn is_foreign_key_violation(&self) -> bool {
        self.sqlstate() == Some("23503")
    }

    /// Check if the backend reported a check constraint violation (SQLSTATE 23514).
    pub fn is_check_violation(&self) -> bool {
        self.sqlstate() == Some("23514")
    }

    /// SQLSTATE code of a PostgreSQL server error, if any.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            #[cfg(feature = "pool")]
            Self::Query(err) => err.as_db_error().map(|db| db.code().code()),
            _ => None,
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_distinct_from_timeout() {
        let cancelled = OrmError::Cancelled;
        let timeout = OrmError::Timeout(Duration::from_millis(5));
        assert!(cancelled.is_cancelled());
        assert!(!cancelled.is_timeout());
        assert!(timeout.is_timeout());
        assert!(!timeout.is_cancelled());
    }

    #[test]
    fn non_server_errors_carry_no_sqlstate() {
        let err = OrmError::backend("disk full");
        assert_eq!(err.sqlstate(), None);
        assert!(!err.is_unique_violation());
        assert_eq!(err.to_string(), "Backend error: disk full");
    }

    #[test]
    fn unsupported_names_dialect() {
        let err = OrmError::unsupported("sqlite", "MODIFY COLUMN");
        assert_eq!(err.to_string(), "Unsupported by sqlite: MODIFY COLUMN");
    }
}
