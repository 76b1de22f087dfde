//! Engine error types.

use thiserror::Error;

/// Boxed cause attached to a resolution failure.
pub type ErrorCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for analysis operations.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// The registry was unreachable, returned an unusable response, or no
    /// published version satisfied the descriptor.
    #[error("Package not found: {name}@{descriptor}: {reason}")]
    PackageNotFound {
        name: String,
        descriptor: String,
        reason: String,
        #[source]
        source: Option<ErrorCause>,
    },

    /// The caller supplied an unusable request or configuration.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

impl AnalyzeError {
    /// Create a `PackageNotFound` error without an underlying cause.
    #[must_use]
    pub fn not_found(name: &str, descriptor: &str, reason: impl Into<String>) -> Self {
        Self::PackageNotFound {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Create a `PackageNotFound` error carrying the original cause.
    #[must_use]
    pub fn not_found_caused(
        name: &str,
        descriptor: &str,
        reason: impl Into<String>,
        cause: impl Into<ErrorCause>,
    ) -> Self {
        Self::PackageNotFound {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            reason: reason.into(),
            source: Some(cause.into()),
        }
    }

    /// Create an `InvalidArguments` error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Whether this error is a `PackageNotFound`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PackageNotFound { .. })
    }
}
