//! Error types for the entitlement crate.

use thiserror::Error;

/// Entitlement-specific errors.
#[derive(Debug, Error)]
pub enum EntitlementError {
    /// Activation code format is invalid.
    #[error("invalid activation code: {0}")]
    InvalidCode(String),

    /// Ed25519 signature verification failed.
    #[error("activation code signature invalid")]
    InvalidSignature,

    /// The stored record has a shape no state maps to. Unreachable through
    /// the public API; treated as a defect, never silently recovered.
    #[error("entitlement state inconsistent: {0}")]
    StateInconsistent(String),
}

impl EntitlementError {
    /// Returns true for validation failures, which callers must not retry.
    #[must_use]
    pub fn is_invalid_code(&self) -> bool {
        matches!(self, Self::InvalidCode(_) | Self::InvalidSignature)
    }
}

/// Result type for entitlement operations.
pub type EntitlementResult<T> = Result<T, EntitlementError>;
