//! Error types for the record store

use hrdash_insights::InsightsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {message}")]
    Sqlite {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("io error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid record: {field}: {reason}")]
    InvalidRecord { field: String, reason: String },

    #[error("record not found: {id}")]
    NotFound { id: String },

    #[error("duplicate entry number: {entry_number}")]
    DuplicateEntryNumber { entry_number: String },
}

impl StoreError {
    pub fn sqlite(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Sqlite {
            message: message.into(),
            source,
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    pub fn json(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            message: message.into(),
            source,
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller supplied bad input (as opposed to a storage failure)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRecord { .. } | Self::NotFound { .. } | Self::DuplicateEntryNumber { .. }
        )
    }
}

impl From<StoreError> for InsightsError {
    fn from(err: StoreError) -> Self {
        InsightsError::record_source_with_source("record store query failed", err)
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
