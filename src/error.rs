//! Error types for the kinship cache layer
//!
//! Provides error handling for store adapters, relation configuration,
//! and cache list operations.

use std::fmt;

/// Result type alias for cache list operations
pub type KinshipResult<T> = Result<T, KinshipError>;

/// Errors surfaced by store adapters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The membership row already exists
    Duplicate,
    /// The backend is unreachable or rejected the operation
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Duplicate => write!(f, "membership row already exists"),
            StoreError::Backend(msg) => write!(f, "store backend error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

// Convert from sqlx errors, mapping unique violations to Duplicate
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Errors surfaced by cache lists and relation bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KinshipError {
    /// The underlying relation store failed
    Storage(String),
    /// Relation descriptor or binding configuration is invalid
    Configuration(String),
    /// No relation registered under the given name
    UnknownRelation(String),
    /// Item identity does not fit the relation's item type set
    InvalidItem(String),
}

impl fmt::Display for KinshipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinshipError::Storage(msg) => write!(f, "storage error: {}", msg),
            KinshipError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            KinshipError::UnknownRelation(name) => write!(f, "unknown relation '{}'", name),
            KinshipError::InvalidItem(msg) => write!(f, "invalid item: {}", msg),
        }
    }
}

impl std::error::Error for KinshipError {}

impl From<StoreError> for KinshipError {
    fn from(err: StoreError) -> Self {
        KinshipError::Storage(err.to_string())
    }
}
