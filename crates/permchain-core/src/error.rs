//! Error types for permchain core.

use thiserror::Error;

/// Core errors raised while constructing records or handling key material.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid timestamp: nanoseconds {0} must be below 1_000_000_000")]
    InvalidTimestamp(u32),

    #[error("priority {0} is outside 0..=255")]
    PriorityOutOfRange(i64),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature")]
    InvalidSignature,
}

/// Validation errors for transactions and blocks.
///
/// Validation predicates (`is_valid`, `is_structurally_valid`) collapse these
/// into a boolean; the `validate_*` functions return the first failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("structural error: {0}")]
    StructuralError(String),

    #[error("timestamp nanoseconds {0} must be below 1_000_000_000")]
    InvalidTimestamp(u32),

    #[error("transaction uuid is empty")]
    EmptyUuid,

    #[error("canonical payload is empty")]
    EmptyPayload,

    #[error("transaction {0} is not signed")]
    MissingSignature(String),

    #[error("block hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch { stored: String, computed: String },

    #[error("merkle root mismatch: stored {stored}, computed {computed}")]
    MerkleRootMismatch { stored: String, computed: String },

    #[error("transaction {index} is invalid: {reason}")]
    InvalidTransaction { index: usize, reason: Box<ValidationError> },

    #[error("linkage broken at block {index}: expected previous hash {expected}, got {got}")]
    LinkageError {
        index: u64,
        expected: String,
        got: String,
    },

    #[error("non-contiguous block index: expected {expected}, got {got}")]
    NonContiguousIndex { expected: u64, got: u64 },

    #[error("block index {0} has no successor")]
    IndexOverflow(u64),

    #[error("signature verification failed for transaction {0}")]
    SignatureFailed(String),
}
