//! # Permchain Core
//!
//! Integrity primitives for the permchain ledger: transactions, blocks and
//! Merkle trees, plus the hashing and signing seams they rely on.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over hash-linked data structures.
//!
//! ## Key Types
//!
//! - [`TransactionRecord`] - A signed, timestamped unit of intent
//! - [`Block`] - An ordered batch of transactions with linkage and a hash
//! - [`MerkleTree`] - Order-sensitive digest with inclusion proofs
//! - [`Canonical`] - The encoding contract every payload type implements
//! - [`HashAlgorithm`], [`Signer`], [`Verifier`] - Cryptographic collaborators
//!
//! ## Canonicalization
//!
//! Merkle leaves are the bytes produced by [`canonical_bytes`]; signatures
//! cover the unambiguous [`signing_message`]. See the [`canonical`] module.

pub mod block;
pub mod canonical;
pub mod crypto;
pub mod error;
pub mod merkle;
pub mod transaction;
pub mod types;
pub mod validation;

pub use block::Block;
pub use canonical::{canonical_bytes, canonical_string, signing_message, Canonical, SIGN_DOMAIN};
pub use crypto::{Digest, Ed25519PublicKey, HashAlgorithm, Keypair, Signer, Verifier};
pub use error::{CoreError, ValidationError};
pub use merkle::{merkle_proof, merkle_root, verify_proof, MerkleProof, MerkleTree, ProofStep, Side};
pub use transaction::TransactionRecord;
pub use types::{Timestamp, DEFAULT_PRIORITY, GENESIS_PREVIOUS_HASH, NANOS_PER_SEC};
pub use validation::{validate_block, validate_linkage, validate_transaction_structure};
