//! # Database Error Types
//!
//! Error types for database operations and the transactional engines.
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
//! │       ▲                                                                 │
//! │       │                                                                 │
//! │  CoreError (aurum-core) ← Validation / business rule failures          │
//! │                                                                         │
//! │  Engine operations return DbError, which carries both worlds.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use aurum_core::error::{CoreError, ValidationError, ValidationErrors};

/// Database and engine operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    /// - Cancelling a debt no order references
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// An OUT movement would overdraw the account.
    ///
    /// The posting engine never clamps: the movement is rejected with the
    /// available balance so the caller can tell the operator exactly how
    /// short they are.
    #[error("Insufficient balance on {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: String,
        available: String,
        requested: String,
    },

    /// A period close overlaps movements already claimed by another close.
    #[error("Period already closed: movements between {start} and {end} belong to close {close_id}")]
    PeriodAlreadyClosed {
        start: String,
        end: String,
        close_id: String,
    },

    /// A period close found nothing to close.
    #[error("No unclaimed movements between {start} and {end}")]
    NoMovements { start: String, end: String },

    /// A guarded update found its precondition no longer true.
    ///
    /// ## When This Occurs
    /// - A concurrent writer changed the row between read and update
    ///
    /// Retryable: re-read and try once more.
    #[error("Concurrent modification of {entity}: {id}")]
    Conflict { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate account or movement type name
    /// - Second line for the same item on one order
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A business rule from aurum-core failed.
    #[error(transparent)]
    Core(#[from] CoreError),

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

    /// Creates a Conflict error for a guarded update that touched no rows.
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::Conflict {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<ValidationErrors> for DbError {
    fn from(errors: ValidationErrors) -> Self {
        DbError::Core(CoreError::Validation(errors))
    }
}

impl From<ValidationError> for DbError {
    fn from(error: ValidationError) -> Self {
        DbError::Core(CoreError::Validation(error.into()))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
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
                let msg = db_err.message();

                // SQLite error messages for constraints:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
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
