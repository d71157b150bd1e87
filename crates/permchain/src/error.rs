//! Error types for chain operations.

use permchain_auth::AuthError;
use permchain_core::ValidationError;
use thiserror::Error;

/// Errors that can occur during chain operations.
///
/// Every mutating operation that returns an error leaves the chain and its
/// authenticator exactly as they were before the call.
#[derive(Debug, Error)]
pub enum ChainError {
    /// A transaction id is already committed, or repeated within one block.
    #[error("duplicate transaction: {0}")]
    DuplicateTransaction(String),

    /// The issuer is not a registered participant.
    #[error("unauthorized participant: {0}")]
    Unauthorized(String),

    /// The issuer lacks the required capability.
    #[error("participant {participant} lacks capability {capability}")]
    MissingCapability {
        participant: String,
        capability: String,
    },

    /// The candidate block failed validation after linkage was finalized.
    #[error("invalid block: {0}")]
    InvalidBlock(#[from] ValidationError),

    /// The chain holds no blocks.
    #[error("chain is empty")]
    EmptyChain,

    /// Snapshot encoding or decoding failed.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl From<AuthError> for ChainError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::DuplicateTransaction(id) => ChainError::DuplicateTransaction(id),
            AuthError::Unauthorized(id) => ChainError::Unauthorized(id),
            AuthError::MissingCapability {
                participant,
                capability,
            } => ChainError::MissingCapability {
                participant,
                capability,
            },
        }
    }
}

/// Result type for chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;
