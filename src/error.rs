//! Error types for table store operations

use thiserror::Error;

/// Errors that can occur while translating metadata or writing rows
#[derive(Debug, Error)]
pub enum TableStoreError {
    #[error("Type mapping error: {0}")]
    TypeMapping(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Row not found: {0}")]
    RowNotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TableStoreError {
    pub fn type_mapping(msg: impl Into<String>) -> Self {
        Self::TypeMapping(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn unknown_column(msg: impl Into<String>) -> Self {
        Self::UnknownColumn(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn row_not_found(msg: impl Into<String>) -> Self {
        Self::RowNotFound(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, TableStoreError>;
