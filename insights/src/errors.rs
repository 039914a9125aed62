//! Insights error types
//!
//! The dashboard pipeline itself never fails: unresolvable references are
//! dropped and cardinality mismatches are logged. Errors only surface at the
//! I/O edges (config, taxonomy files, the record source).

use thiserror::Error;

/// Error category for structured logging and exit-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// `dashboard.toml` or env misconfigured
    ConfigError,
    /// Taxonomy file unreadable or structurally invalid
    TaxonomyError,
    /// Failures fetching the record snapshot
    RecordSourceError,
    /// Unexpected logic bugs
    InternalError,
}

impl ErrorCategory {
    /// Machine-readable code for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::TaxonomyError => "TAXONOMY_ERROR",
            Self::RecordSourceError => "RECORD_SOURCE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the dashboard can still render (with the builtin taxonomy or
    /// default config) after this error
    pub fn render_recoverable(&self) -> bool {
        matches!(self, Self::ConfigError)
    }
}

#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("taxonomy error: {message}")]
    Taxonomy {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("record source error: {message}")]
    RecordSource {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl InsightsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::ConfigError,
            Self::Taxonomy { .. } => ErrorCategory::TaxonomyError,
            Self::RecordSource { .. } => ErrorCategory::RecordSourceError,
            Self::Internal { .. } => ErrorCategory::InternalError,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn taxonomy(message: impl Into<String>) -> Self {
        Self::Taxonomy {
            message: message.into(),
            source: None,
        }
    }

    pub fn taxonomy_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Taxonomy {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a record source error with source
    ///
    /// Record-store collaborators use this to surface their own error type
    /// through [`crate::RecordSource::query`].
    pub fn record_source_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::RecordSource {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }
}

/// Result type for insights operations
pub type Result<T> = std::result::Result<T, InsightsError>;
