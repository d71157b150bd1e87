//! # Permchain
//!
//! A permissioned, append-only ledger for robot and device fleets.
//!
//! ## Overview
//!
//! Permchain combines two layers:
//!
//! - **Integrity**: transactions are batched into blocks; each block commits
//!   to its transactions through a Merkle root and to its predecessor through
//!   a hash link
//! - **Policy**: an authenticator decides which participants may act, which
//!   capabilities they hold, and which transaction ids are already consumed
//!
//! A [`Chain`] owns both and is safe to share across threads.
//!
//! ## Usage
//!
//! ```rust
//! use std::collections::BTreeMap;
//!
//! use permchain::core::{Block, Keypair, TransactionRecord};
//! use permchain::{Chain, ChainError};
//!
//! let keypair = Keypair::generate();
//! let chain = Chain::new("fleet", "genesis-1", "boot".to_string(), &keypair);
//!
//! // Commit a block of signed transactions.
//! let txs = vec![
//!     TransactionRecord::new("tx-1", "move north".to_string()).signed(&keypair),
//!     TransactionRecord::new("tx-2", "pick crate".to_string()).signed(&keypair),
//! ];
//! chain.append(Block::new(txs)).unwrap();
//! assert_eq!(chain.len(), 2);
//! assert!(chain.is_valid());
//!
//! // Gate an action on a capability.
//! chain.register_participant("robot-A", "active", BTreeMap::new());
//! chain.grant_capability("robot-A", "MOVE");
//! chain
//!     .validate_and_record_action("robot-A", "move to dock", "cmd-1", Some("MOVE"))
//!     .unwrap();
//!
//! let replay = chain.validate_and_record_action("robot-A", "move to dock", "cmd-1", Some("MOVE"));
//! assert!(matches!(replay, Err(ChainError::DuplicateTransaction(_))));
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `permchain::core` - Transactions, blocks, Merkle trees, hashing and signing
//! - `permchain::auth` - Participants, capabilities and replay protection

pub mod chain;
pub mod error;
pub mod snapshot;

// Re-export component crates
pub use permchain_auth as auth;
pub use permchain_core as core;

// Re-export main types for convenience
pub use chain::{Chain, ChainConfig, ChainSummary};
pub use error::{ChainError, Result};
pub use snapshot::ChainSnapshot;

// Re-export commonly used core types
pub use permchain_core::{
    Block, Canonical, Ed25519PublicKey, HashAlgorithm, Keypair, MerkleProof, MerkleTree, Signer,
    Timestamp, TransactionRecord, ValidationError, Verifier,
};
