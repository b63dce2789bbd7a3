//! Error types for querymap

use thiserror::Error;

/// Result type alias for querymap operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for query construction and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// The builder cannot produce a statement (no table, nothing to set, ...)
    #[error("Construction error: {0}")]
    Construction(String),

    /// A lookup that requires a row found none
    #[error("Not found in '{table}': {condition}")]
    NotFound { table: String, condition: String },

    /// A value or strategy the caller asked for cannot be honored
    #[error("Unexpected value: {0}")]
    UnexpectedValue(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a construction error
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction(message.into())
    }

    /// Create a not found error for a table and the condition that matched nothing
    pub fn not_found(table: impl Into<String>, condition: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
            condition: condition.into(),
        }
    }

    /// Create an unexpected value error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedValue(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a construction error
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Construction(_))
    }

    /// Check if this is an unexpected value error
    pub fn is_unexpected_value(&self) -> bool {
        matches!(self, Self::UnexpectedValue(_))
    }

    /// Wrap a tokio_postgres error, keeping server-side messages readable
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return Self::Connection(err.to_string());
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
