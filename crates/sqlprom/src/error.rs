//! Error types for sqlprom

use thiserror::Error;

/// Result type alias for sqlprom operations
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Error types for metric registration, observation and configuration
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A metric with the same name was already registered with a different schema
    #[error("Metric '{name}' already registered with a different schema: {reason}")]
    RegistrationMismatch { name: String, reason: String },

    /// Observation label values do not match the registered label names
    #[error("Label count mismatch: expected {expected} values, got {actual}")]
    LabelCount { expected: usize, actual: usize },

    /// Histogram bucket boundaries are unusable
    #[error("Invalid buckets: {0}")]
    InvalidBuckets(String),

    /// Error reported by the underlying Prometheus registry
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Configuration could not be parsed or validated
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl MetricsError {
    /// Create a registration mismatch error
    pub fn registration_mismatch(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RegistrationMismatch {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid buckets error
    pub fn invalid_buckets(message: impl Into<String>) -> Self {
        Self::InvalidBuckets(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if this error must abort service startup.
    ///
    /// Registration-time schema problems corrupt the time series if ignored,
    /// so they are never recoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MetricsError::RegistrationMismatch { .. }
                | MetricsError::InvalidBuckets(_)
                | MetricsError::Config(_)
        )
    }
}
