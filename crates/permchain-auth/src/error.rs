//! Error types for the authorization layer.

use thiserror::Error;

/// Reasons an action or transaction is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The transaction id has already been recorded.
    #[error("duplicate transaction: {0}")]
    DuplicateTransaction(String),

    /// The issuer is not a registered participant.
    #[error("unauthorized participant: {0}")]
    Unauthorized(String),

    /// The issuer is registered but lacks the required capability.
    #[error("participant {participant} lacks capability {capability}")]
    MissingCapability {
        participant: String,
        capability: String,
    },
}

/// Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthError>;
