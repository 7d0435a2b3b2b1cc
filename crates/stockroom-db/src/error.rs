//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError (stockroom-service) ← Conflict / NotFound / Storage     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - An update matched no row for the given ID
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate SKU
    /// - Duplicate invoice number
    /// - Duplicate username or email
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Sale line referencing a missing sale or item
    /// - Session for a missing user
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative stock, unknown role, ...).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Begin, commit, or rollback failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wraps a commit/rollback/begin failure.
    pub fn transaction(err: impl std::fmt::Display) -> Self {
        DbError::TransactionFailed(err.to_string())
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → by constraint kind
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();

                match db_err.kind() {
                    // SQLite: "UNIQUE constraint failed: <table>.<column>"
                    ErrorKind::UniqueViolation => {
                        let field = msg
                            .split("UNIQUE constraint failed: ")
                            .nth(1)
                            .unwrap_or("unknown")
                            .to_string();
                        DbError::UniqueViolation {
                            field,
                            value: "unknown".to_string(),
                        }
                    }
                    ErrorKind::ForeignKeyViolation => {
                        DbError::ForeignKeyViolation { message: msg }
                    }
                    ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                        DbError::CheckViolation { message: msg }
                    }
                    _ => DbError::QueryFailed(msg),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
