//! Domain error types.

use thiserror::Error;

use crate::store::StoreError;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced resource (track, catalog slot, submission) is missing.
    /// Carries an HTTP-like status, a short title, and a user-facing
    /// remediation message alongside the diagnostic detail.
    #[error("{detail}")]
    NotFound {
        /// HTTP-like status code for the API layer.
        status: u16,
        /// Short machine-friendly title.
        title: &'static str,
        /// User-facing remediation message.
        message: &'static str,
        /// Diagnostic detail including the underlying error.
        detail: String,
    },

    /// A store operation failed fatally.
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),

    /// An infrastructure failure outside the store (serialization, config).
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// HTTP-like status code for this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { status, .. } => *status,
            Self::Store(StoreError::Conflict) => 409,
            Self::Store(StoreError::NotFound) => 404,
            Self::Store(StoreError::BatchFailed { status }) => *status,
            Self::Store(StoreError::Backend(_)) | Self::Infrastructure(_) => 500,
        }
    }
}
