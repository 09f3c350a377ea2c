//! # Database Error Types
//!
//! Error types for store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        Business rule (CoreError)           │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ◄──────────── DbError::Core (unchanged)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Orchestrator does NOT catch-and-convert: the most specific error      │
//! │  reaches the caller, the transaction rolls back on drop                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UI displays a message                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use grocer_core::CoreError;
use thiserror::Error;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A point lookup was given an identifier that cannot exist (`<= 0`).
    #[error("Invalid key for {collection}: {id}")]
    InvalidKey { collection: String, id: i64 },

    /// Target of an update (or a required lookup) does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// UNIQUE or CHECK constraint failed.
    ///
    /// ## When This Occurs
    /// - Duplicate invoice number, category name or username
    /// - A second inventory entry for the same product
    /// - A write that would leave product stock negative
    #[error("Constraint violated on {field}: {value}")]
    ConstraintViolation { field: String, value: String },

    /// A category cannot be deleted while products still point at it.
    #[error("Category {id} is used by {product_count} product(s)")]
    CategoryInUse { id: i64, product_count: i64 },

    /// A backup document was written by a newer schema.
    #[error("Backup version {found} is newer than supported version {supported}")]
    IncompatibleVersion { found: u32, supported: u32 },

    /// `list` was asked for an index the collection does not have.
    #[error("Unknown index '{index}' on {collection}")]
    UnknownIndex { collection: String, index: String },

    /// Ledger collections only ever grow.
    #[error("{collection} is append-only")]
    AppendOnly { collection: String },

    /// Business rule violation from grocer-core, passed through unchanged.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database connection failed or the store is closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Runtime SQL error.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (waited longer than the acquire timeout).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Backup document or setting value could not be (de)serialized.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    ConfigSaveFailed(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid_key(collection: impl Into<String>, id: i64) -> Self {
        DbError::InvalidKey {
            collection: collection.into(),
            id,
        }
    }

    /// Errors that concern one record's content rather than the store.
    ///
    /// Backup import skips records failing this way and aborts on anything
    /// else. `QueryFailed` is not one of them: locked, full or failing
    /// disks surface that way.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            DbError::ConstraintViolation { .. }
                | DbError::Serialization(_)
                | DbError::Core(CoreError::Validation(_))
        )
    }

    /// The store was closed or never opened.
    pub fn is_closed(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → UNIQUE / CHECK → ConstraintViolation
///                               anything else  → QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
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

                // "UNIQUE constraint failed: sales.invoice_number"
                // "CHECK constraint failed: products_stock_non_negative"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::ConstraintViolation {
                        field: field.to_string(),
                        value: "duplicate".to_string(),
                    }
                } else if let Some(field) = msg.strip_prefix("CHECK constraint failed: ") {
                    DbError::ConstraintViolation {
                        field: field.to_string(),
                        value: "check failed".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ConstraintViolation {
                        field: "foreign key".to_string(),
                        value: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DbError::Serialization(err.to_string())
            }

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        DbError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for DbError {
    fn from(err: toml::de::Error) -> Self {
        DbError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for DbError {
    fn from(err: toml::ser::Error) -> Self {
        DbError::ConfigSaveFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
