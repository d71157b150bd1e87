//! Block: an ordered batch of transactions with linkage and a self-describing hash.
//!
//! ```text
//! merkle_root = MerkleTree(tx.canonical_bytes() for tx in transactions).root
//! hash        = H(index || ts.sec || ts.nanosec || previous_hash || nonce || merkle_root)
//! ```
//!
//! Numbers are ASCII decimal, hashes lowercase hex, all concatenated without
//! separators. Linkage fields are finalized only when a chain accepts the
//! block; see [`Block::recompute_linkage`].

use serde::{Deserialize, Serialize};

use crate::canonical::Canonical;
use crate::crypto::{Digest, HashAlgorithm, Verifier};
use crate::error::ValidationError;
use crate::merkle::{verify_proof, MerkleProof, MerkleTree};
use crate::transaction::TransactionRecord;
use crate::types::{Timestamp, GENESIS_PREVIOUS_HASH};
use crate::validation::validate_block;

/// A batch of transactions plus linkage fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block<P> {
    /// Position in the chain; 0 for genesis.
    pub index: u64,

    /// Hash of the predecessor, or `"GENESIS"`.
    pub previous_hash: String,

    /// Hex Merkle root over the transactions' canonical bytes.
    pub merkle_root: String,

    /// Nonce folded into the hash. Always 0 in the core.
    pub nonce: u64,

    /// Creation time.
    pub timestamp: Timestamp,

    /// Hex block hash.
    pub hash: String,

    /// Hash function for `hash` and `merkle_root`.
    pub algorithm: HashAlgorithm,

    /// Ordered transactions.
    pub transactions: Vec<TransactionRecord<P>>,
}

impl<P: Canonical> Block<P> {
    /// Create a genesis-shaped block using SHA-256.
    pub fn new(transactions: Vec<TransactionRecord<P>>) -> Self {
        Self::with_algorithm(transactions, HashAlgorithm::default())
    }

    /// Create a genesis-shaped block with an explicit hash algorithm.
    pub fn with_algorithm(transactions: Vec<TransactionRecord<P>>, algorithm: HashAlgorithm) -> Self {
        Self::with_timestamp(transactions, algorithm, Timestamp::now())
    }

    /// Create a genesis-shaped block with a fixed timestamp.
    pub fn with_timestamp(
        transactions: Vec<TransactionRecord<P>>,
        algorithm: HashAlgorithm,
        timestamp: Timestamp,
    ) -> Self {
        let mut block = Self {
            index: 0,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            merkle_root: String::new(),
            nonce: 0,
            timestamp,
            hash: String::new(),
            algorithm,
            transactions,
        };
        block.merkle_root = block.calculate_merkle_root();
        block.hash = block.calculate_hash();
        block
    }

    /// Build the Merkle tree over the current transactions.
    pub fn merkle_tree(&self) -> MerkleTree {
        let leaves: Vec<Vec<u8>> = self
            .transactions
            .iter()
            .map(TransactionRecord::canonical_bytes)
            .collect();
        MerkleTree::new(self.algorithm, &leaves)
    }

    /// Recompute the Merkle root over the current transactions.
    pub fn calculate_merkle_root(&self) -> String {
        self.merkle_tree().root_hex()
    }

    /// Recompute the block hash from the stored fields.
    pub fn calculate_hash(&self) -> String {
        let preimage = format!(
            "{}{}{}{}{}{}",
            self.index,
            self.timestamp.sec,
            self.timestamp.nanosec,
            self.previous_hash,
            self.nonce,
            self.merkle_root
        );
        self.algorithm.hex_digest(preimage.as_bytes())
    }

    /// Set linkage fields, then rebuild the Merkle root and hash.
    ///
    /// Called by the chain during append.
    pub fn recompute_linkage(&mut self, index: u64, previous_hash: impl Into<String>) {
        self.index = index;
        self.previous_hash = previous_hash.into();
        self.merkle_root = self.calculate_merkle_root();
        self.hash = self.calculate_hash();
    }

    /// Rehash with a different algorithm, keeping linkage.
    pub fn rehash_with(&mut self, algorithm: HashAlgorithm) {
        self.algorithm = algorithm;
        self.merkle_root = self.calculate_merkle_root();
        self.hash = self.calculate_hash();
    }

    /// Run every self-consistency check, returning the first failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_block(self)
    }

    /// Pure validity predicate: structure, hash, Merkle root and transactions.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Verify every transaction signature against `verifier`.
    pub fn verify_signatures<V: Verifier + ?Sized>(&self, verifier: &V) -> Result<(), ValidationError> {
        for tx in &self.transactions {
            if !tx.verify_signature(verifier) {
                return Err(ValidationError::SignatureFailed(tx.uuid.clone()));
            }
        }
        Ok(())
    }

    /// Inclusion proof for the transaction at `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        self.merkle_tree().proof(index)
    }

    /// Prove the transaction at `index` is committed by `merkle_root`.
    ///
    /// Out-of-range indices and unparsable stored roots yield `false`.
    pub fn verify_transaction_inclusion(&self, index: usize) -> bool {
        let Some(tx) = self.transactions.get(index) else {
            return false;
        };
        let Ok(root) = Digest::from_hex(&self.merkle_root) else {
            return false;
        };
        let Some(proof) = self.proof(index) else {
            return false;
        };
        verify_proof(self.algorithm, &tx.canonical_bytes(), index, &proof, &root)
    }

    /// Transaction uuids in block order.
    pub fn transaction_ids(&self) -> impl Iterator<Item = &str> {
        self.transactions.iter().map(|tx| tx.uuid.as_str())
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Returns true if the block carries no transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Returns true for a block still carrying genesis linkage.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }
}
