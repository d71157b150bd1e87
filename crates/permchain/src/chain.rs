//! The Chain: an ordered, hash-linked sequence of blocks.
//!
//! A chain owns its [`Authenticator`] and is the only component that mutates
//! the authenticator's used-id set during normal operation. All state sits
//! behind one `RwLock`: every check-then-act sequence (append, record action)
//! runs entirely under the write lock, so two concurrent appends can never
//! both pass the duplicate check for the same transaction id.

use std::collections::{BTreeMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use permchain_auth::Authenticator;
use permchain_core::{
    validate_linkage, Block, Canonical, Ed25519PublicKey, HashAlgorithm, Signer,
    TransactionRecord, ValidationError, Verifier, DEFAULT_PRIORITY,
};
use serde::Serialize;

use crate::error::{ChainError, Result};
use crate::snapshot::ChainSnapshot;

/// Configuration for a Chain.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Hash function for every block and Merkle tree in the chain.
    pub hash_algorithm: HashAlgorithm,
    /// Priority used by the convenience constructors.
    pub default_priority: u8,
    /// When set, every appended transaction must verify against this key.
    pub authority: Option<Ed25519PublicKey>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::Sha256,
            default_priority: DEFAULT_PRIORITY,
            authority: None,
        }
    }
}

impl ChainConfig {
    /// Use `algorithm` for all hashing.
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Use `priority` for convenience-built transactions.
    pub fn with_default_priority(mut self, priority: u8) -> Self {
        self.default_priority = priority;
        self
    }

    /// Require every transaction to be signed by `authority`.
    pub fn with_authority(mut self, authority: Ed25519PublicKey) -> Self {
        self.authority = Some(authority);
        self
    }
}

/// Point-in-time overview of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainSummary {
    pub uuid: String,
    pub blocks: usize,
    pub transactions: usize,
    pub valid: bool,
    pub genesis_hash: String,
    pub latest_hash: String,
    pub participants: usize,
    pub used_ids: usize,
}

struct ChainState<P> {
    blocks: Vec<Block<P>>,
    auth: Authenticator,
}

/// A permissioned, append-only chain of blocks.
pub struct Chain<P> {
    uuid: String,
    config: ChainConfig,
    state: RwLock<ChainState<P>>,
}

impl<P: Canonical + Clone> Chain<P> {
    /// Create a chain whose genesis block holds one signed transaction.
    pub fn new<S: Signer + ?Sized>(
        uuid: impl Into<String>,
        genesis_tx_id: impl Into<String>,
        genesis_payload: P,
        signer: &S,
    ) -> Self {
        let config = ChainConfig::default();
        let genesis = genesis_block(genesis_tx_id, genesis_payload, signer, &config);
        Self::from_genesis(uuid.into(), genesis, config)
    }

    /// Create a chain with explicit configuration.
    ///
    /// Fails with `InvalidBlock` if the genesis transaction does not verify
    /// against a configured authority.
    pub fn with_config<S: Signer + ?Sized>(
        uuid: impl Into<String>,
        genesis_tx_id: impl Into<String>,
        genesis_payload: P,
        signer: &S,
        config: ChainConfig,
    ) -> Result<Self> {
        let genesis = genesis_block(genesis_tx_id, genesis_payload, signer, &config);
        if let Some(authority) = &config.authority {
            genesis.verify_signatures(authority)?;
        }
        Ok(Self::from_genesis(uuid.into(), genesis, config))
    }

    fn from_genesis(uuid: String, genesis: Block<P>, config: ChainConfig) -> Self {
        let mut auth = Authenticator::new();
        for id in genesis.transaction_ids() {
            auth.mark_used(id);
        }
        tracing::info!(chain = %uuid, genesis = %genesis.hash, "chain created");

        Self {
            uuid,
            config,
            state: RwLock::new(ChainState {
                blocks: vec![genesis],
                auth,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ChainState<P>> {
        // Mutations happen only after every check passes, so a poisoned
        // lock still guards consistent state.
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ChainState<P>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Block Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a candidate block.
    ///
    /// 1. Reject if any transaction id is already used or repeated in the block.
    /// 2. Finalize linkage (index, previous hash) and rehash.
    /// 3. Reject if the block is invalid (or fails the authority check).
    /// 4. Mark every transaction id used.
    /// 5. Commit the block.
    ///
    /// Steps 1-5 run under one write lock; on any failure nothing changes.
    pub fn append(&self, mut candidate: Block<P>) -> Result<()> {
        let mut state = self.write();

        {
            let mut seen = HashSet::with_capacity(candidate.len());
            for id in candidate.transaction_ids() {
                if state.auth.is_used(id) || !seen.insert(id) {
                    tracing::warn!(chain = %self.uuid, tx = %id, "rejecting block with duplicate transaction");
                    return Err(ChainError::DuplicateTransaction(id.to_string()));
                }
            }
        }

        let last = state.blocks.last().ok_or(ChainError::EmptyChain)?;
        let Some(next_index) = last.index.checked_add(1) else {
            tracing::warn!(chain = %self.uuid, index = last.index, "chain index exhausted");
            return Err(ValidationError::IndexOverflow(last.index).into());
        };
        candidate.algorithm = self.config.hash_algorithm;
        candidate.recompute_linkage(next_index, last.hash.clone());

        if let Err(e) = self.check_candidate(last, &candidate) {
            tracing::warn!(chain = %self.uuid, error = %e, "rejecting invalid block");
            return Err(e.into());
        }

        let ChainState { blocks, auth } = &mut *state;
        for id in candidate.transaction_ids() {
            auth.mark_used(id);
        }
        tracing::debug!(
            chain = %self.uuid,
            index = candidate.index,
            hash = %candidate.hash,
            transactions = candidate.len(),
            "block committed"
        );
        blocks.push(candidate);
        Ok(())
    }

    fn check_candidate(
        &self,
        last: &Block<P>,
        candidate: &Block<P>,
    ) -> std::result::Result<(), ValidationError> {
        candidate.validate()?;
        validate_linkage(last, candidate)?;
        if let Some(authority) = &self.config.authority {
            candidate.verify_signatures(authority)?;
        }
        Ok(())
    }

    /// Build, sign and append a single-transaction block.
    pub fn append_transaction<S: Signer + ?Sized>(
        &self,
        tx_id: impl Into<String>,
        payload: P,
        signer: &S,
        priority: Option<u8>,
    ) -> Result<()> {
        let priority = priority.unwrap_or(self.config.default_priority);
        let tx = TransactionRecord::with_priority(tx_id, payload, priority).signed(signer);
        self.append(Block::with_algorithm(vec![tx], self.config.hash_algorithm))
    }

    /// Validate every block and every adjacent pair.
    ///
    /// Fails with `EmptyChain` for a chain without blocks.
    pub fn validate(&self) -> Result<()> {
        let state = self.read();
        validate_blocks(&state.blocks)
    }

    /// Chain validity predicate. False for an empty chain.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Verify every committed transaction signature against `verifier`.
    pub fn verify_signatures_with<V: Verifier + ?Sized>(&self, verifier: &V) -> Result<()> {
        let state = self.read();
        for block in &state.blocks {
            block.verify_signatures(verifier)?;
        }
        Ok(())
    }

    /// Verify every committed signature against the configured authority.
    ///
    /// Succeeds trivially when no authority is configured.
    pub fn verify_signatures(&self) -> Result<()> {
        match &self.config.authority {
            Some(authority) => self.verify_signatures_with(authority),
            None => Ok(()),
        }
    }

    /// Prove transaction `tx_index` of block `block_index` against its root.
    pub fn verify_transaction_inclusion(&self, block_index: usize, tx_index: usize) -> bool {
        self.read()
            .blocks
            .get(block_index)
            .is_some_and(|block| block.verify_transaction_inclusion(tx_index))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// The chain identifier.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// The chain configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.read().blocks.len()
    }

    /// Returns true if the chain holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.read().blocks.is_empty()
    }

    /// A copy of every block in order.
    pub fn blocks(&self) -> Vec<Block<P>> {
        self.read().blocks.clone()
    }

    /// A copy of the block at `index`.
    pub fn block(&self, index: usize) -> Option<Block<P>> {
        self.read().blocks.get(index).cloned()
    }

    /// A copy of the newest block.
    pub fn last_block(&self) -> Result<Block<P>> {
        self.read().blocks.last().cloned().ok_or(ChainError::EmptyChain)
    }

    /// Total transactions across all blocks.
    pub fn transaction_count(&self) -> usize {
        self.read().blocks.iter().map(Block::len).sum()
    }

    /// Check if `tx_id` has been consumed by a block or an action.
    pub fn is_transaction_used(&self, tx_id: &str) -> bool {
        self.read().auth.is_used(tx_id)
    }

    /// A point-in-time copy of the authenticator.
    ///
    /// The copy is detached: later chain mutations do not show up in it, and
    /// holding it never blocks the chain.
    pub fn authenticator(&self) -> Authenticator {
        self.read().auth.clone()
    }

    /// Point-in-time overview.
    pub fn summary(&self) -> ChainSummary {
        let state = self.read();
        let hash_at = |block: Option<&Block<P>>| block.map(|b| b.hash.clone()).unwrap_or_default();
        ChainSummary {
            uuid: self.uuid.clone(),
            blocks: state.blocks.len(),
            transactions: state.blocks.iter().map(Block::len).sum(),
            valid: validate_blocks(&state.blocks).is_ok(),
            genesis_hash: hash_at(state.blocks.first()),
            latest_hash: hash_at(state.blocks.last()),
            participants: state.auth.participant_count(),
            used_ids: state.auth.used_count(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Participant Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Register (or re-register) a participant.
    pub fn register_participant(
        &self,
        id: impl Into<String>,
        initial_state: impl Into<String>,
        metadata: BTreeMap<String, String>,
    ) {
        self.write().auth.register_with(id, initial_state, metadata);
    }

    /// Check if `id` is a registered participant.
    pub fn is_participant_authorized(&self, id: &str) -> bool {
        self.read().auth.is_authorized(id)
    }

    /// State of `id`, or `"unknown"`.
    pub fn participant_state(&self, id: &str) -> String {
        self.read().auth.state(id).to_string()
    }

    /// Update a participant's state. False for unregistered ids.
    pub fn update_participant_state(&self, id: &str, new_state: impl Into<String>) -> bool {
        self.write().auth.update_state(id, new_state)
    }

    /// Grant a capability. No-op for unregistered ids.
    pub fn grant_capability(&self, id: &str, capability: impl Into<String>) {
        self.write().auth.grant(id, capability);
    }

    /// Revoke a capability. No-op for unregistered ids.
    pub fn revoke_capability(&self, id: &str, capability: &str) {
        self.write().auth.revoke(id, capability);
    }

    /// Check if `id` holds `capability`.
    pub fn has_capability(&self, id: &str, capability: &str) -> bool {
        self.read().auth.has_capability(id, capability)
    }

    /// Capabilities held by `id`, sorted.
    pub fn participant_capabilities(&self, id: &str) -> Vec<String> {
        self.read()
            .auth
            .capabilities(id)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Metadata value for `key` on `id`.
    pub fn participant_metadata(&self, id: &str, key: &str) -> Option<String> {
        self.read().auth.metadata(id, key).map(str::to_string)
    }

    /// Set a metadata entry. No-op for unregistered ids.
    pub fn set_participant_metadata(&self, id: &str, key: impl Into<String>, value: impl Into<String>) {
        self.write().auth.set_metadata(id, key, value);
    }

    /// Attach a verification key to a participant.
    pub fn set_participant_key(&self, id: &str, key: Ed25519PublicKey) {
        self.write().auth.set_public_key(id, key);
    }

    /// Validate an action and record its id, atomically.
    pub fn validate_and_record_action(
        &self,
        issuer: &str,
        description: &str,
        tx_id: &str,
        required_capability: Option<&str>,
    ) -> Result<()> {
        self.write()
            .auth
            .validate_and_record(issuer, description, tx_id, required_capability)
            .map_err(ChainError::from)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Snapshots
    // ─────────────────────────────────────────────────────────────────────────

    /// Export the full chain state.
    pub fn snapshot(&self) -> ChainSnapshot<P> {
        let state = self.read();
        ChainSnapshot {
            uuid: self.uuid.clone(),
            hash_algorithm: self.config.hash_algorithm,
            blocks: state.blocks.clone(),
            authenticator: state.auth.snapshot(),
        }
    }

    /// Rebuild a chain from a snapshot without re-validating it.
    ///
    /// The used-id set becomes the snapshot's ids plus every block's
    /// transaction ids. The snapshot's hash algorithm overrides `config`.
    /// Call [`is_valid`](Self::is_valid) to check integrity afterwards.
    pub fn restore(snapshot: ChainSnapshot<P>, mut config: ChainConfig) -> Result<Self> {
        if snapshot.blocks.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        config.hash_algorithm = snapshot.hash_algorithm;

        let mut auth = Authenticator::from_snapshot(snapshot.authenticator);
        for id in snapshot.blocks.iter().flat_map(Block::transaction_ids) {
            auth.mark_used(id);
        }
        tracing::info!(chain = %snapshot.uuid, blocks = snapshot.blocks.len(), "chain restored");

        Ok(Self {
            uuid: snapshot.uuid,
            config,
            state: RwLock::new(ChainState {
                blocks: snapshot.blocks,
                auth,
            }),
        })
    }
}

fn genesis_block<P: Canonical, S: Signer + ?Sized>(
    tx_id: impl Into<String>,
    payload: P,
    signer: &S,
    config: &ChainConfig,
) -> Block<P> {
    let tx = TransactionRecord::with_priority(tx_id, payload, config.default_priority).signed(signer);
    Block::with_algorithm(vec![tx], config.hash_algorithm)
}

fn validate_blocks<P: Canonical>(blocks: &[Block<P>]) -> Result<()> {
    let first = blocks.first().ok_or(ChainError::EmptyChain)?;
    first.validate()?;
    for pair in blocks.windows(2) {
        pair[1].validate()?;
        validate_linkage(&pair[0], &pair[1])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use permchain_core::Keypair;

    fn keypair() -> Keypair {
        Keypair::from_seed(&[0x42; 32])
    }

    fn chain() -> Chain<String> {
        Chain::new("c1", "g1", "genesis".to_string(), &keypair())
    }

    fn block(ids: &[&str]) -> Block<String> {
        let kp = keypair();
        Block::new(
            ids.iter()
                .map(|id| TransactionRecord::new(*id, format!("payload-{id}")).signed(&kp))
                .collect(),
        )
    }

    #[test]
    fn test_new_chain() {
        let chain = chain();
        assert_eq!(chain.uuid(), "c1");
        assert_eq!(chain.len(), 1);
        assert!(chain.is_valid());
        assert!(chain.is_transaction_used("g1"));

        let genesis = chain.last_block().unwrap();
        assert!(genesis.is_genesis());
    }

    #[test]
    fn test_append_links_blocks() {
        let chain = chain();
        chain.append(block(&["a", "b"])).unwrap();
        chain.append(block(&["c"])).unwrap();

        let blocks = chain.blocks();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].index, 1);
        assert_eq!(blocks[2].index, 2);
        assert_eq!(blocks[1].previous_hash, blocks[0].hash);
        assert_eq!(blocks[2].previous_hash, blocks[1].hash);
        assert!(chain.is_valid());
        assert_eq!(chain.transaction_count(), 4);
    }

    #[test]
    fn test_duplicate_within_block_rejected() {
        let chain = chain();
        let result = chain.append(block(&["x", "x"]));
        assert!(matches!(result, Err(ChainError::DuplicateTransaction(id)) if id == "x"));
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_transaction_used("x"));
    }

    #[test]
    fn test_genesis_id_cannot_be_replayed() {
        let chain = chain();
        assert!(matches!(
            chain.append(block(&["g1"])),
            Err(ChainError::DuplicateTransaction(_))
        ));
    }

    #[test]
    fn test_invalid_block_rejected_without_side_effects() {
        let chain = chain();
        let unsigned = TransactionRecord::new("u1", "payload".to_string());
        let result = chain.append(Block::new(vec![unsigned]));
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(ValidationError::InvalidTransaction { .. }))
        ));
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_transaction_used("u1"));
    }

    #[test]
    fn test_append_rehashes_with_chain_algorithm() {
        let config = ChainConfig::default().with_hash_algorithm(HashAlgorithm::Blake3);
        let chain = Chain::with_config("c", "g", "genesis".to_string(), &keypair(), config).unwrap();

        // Candidate built with SHA-256 is rehashed on append.
        chain.append(block(&["a"])).unwrap();
        let last = chain.last_block().unwrap();
        assert_eq!(last.algorithm, HashAlgorithm::Blake3);
        assert!(chain.is_valid());
    }

    #[test]
    fn test_authority_enforced() {
        let authority = keypair();
        let intruder = Keypair::from_seed(&[0x99; 32]);
        let config = ChainConfig::default().with_authority(authority.public_key());
        let chain = Chain::with_config("c", "g", "genesis".to_string(), &authority, config).unwrap();

        chain
            .append_transaction("ok", "signed by authority".to_string(), &authority, None)
            .unwrap();
        let result =
            chain.append_transaction("bad", "signed by intruder".to_string(), &intruder, None);
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(ValidationError::SignatureFailed(id))) if id == "bad"
        ));
        assert_eq!(chain.len(), 2);
        assert!(chain.verify_signatures().is_ok());
    }

    #[test]
    fn test_authority_rejects_foreign_genesis() {
        let config = ChainConfig::default().with_authority(keypair().public_key());
        let other = Keypair::from_seed(&[0x01; 32]);
        let result = Chain::with_config("c", "g", "genesis".to_string(), &other, config);
        assert!(matches!(result, Err(ChainError::InvalidBlock(_))));
    }

    #[test]
    fn test_default_priority_from_config() {
        let config = ChainConfig::default().with_default_priority(7);
        let chain = Chain::with_config("c", "g", "genesis".to_string(), &keypair(), config).unwrap();
        chain
            .append_transaction("t", "x".to_string(), &keypair(), None)
            .unwrap();
        let last = chain.last_block().unwrap();
        assert_eq!(last.transactions[0].priority, 7);
        assert_eq!(chain.block(0).unwrap().transactions[0].priority, 7);
    }

    #[test]
    fn test_participant_passthroughs() {
        let chain = chain();
        let meta = BTreeMap::from([("model".to_string(), "X1".to_string())]);
        chain.register_participant("robot-A", "active", meta);
        chain.grant_capability("robot-A", "MOVE");

        assert!(chain.is_participant_authorized("robot-A"));
        assert_eq!(chain.participant_state("robot-A"), "active");
        assert_eq!(chain.participant_metadata("robot-A", "model").as_deref(), Some("X1"));
        assert_eq!(chain.participant_capabilities("robot-A"), vec!["MOVE".to_string()]);

        assert!(chain.update_participant_state("robot-A", "idle"));
        assert!(!chain.update_participant_state("robot-B", "idle"));
        assert_eq!(chain.participant_state("robot-B"), "unknown");

        chain.revoke_capability("robot-A", "MOVE");
        assert!(!chain.has_capability("robot-A", "MOVE"));
    }

    #[test]
    fn test_action_and_block_share_replay_set() {
        let chain = chain();
        chain.register_participant("robot-A", "active", BTreeMap::new());
        chain
            .validate_and_record_action("robot-A", "move", "cmd-1", None)
            .unwrap();

        assert!(matches!(
            chain.append(block(&["cmd-1"])),
            Err(ChainError::DuplicateTransaction(_))
        ));
    }

    #[test]
    fn test_summary() {
        let chain = chain();
        chain.append(block(&["a", "b"])).unwrap();
        let summary = chain.summary();
        assert_eq!(summary.uuid, "c1");
        assert_eq!(summary.blocks, 2);
        assert_eq!(summary.transactions, 3);
        assert!(summary.valid);
        assert_eq!(summary.used_ids, 3);
        assert_eq!(summary.latest_hash, chain.last_block().unwrap().hash);
    }

    #[test]
    fn test_verify_transaction_inclusion() {
        let chain = chain();
        chain.append(block(&["a", "b", "c"])).unwrap();
        assert!(chain.verify_transaction_inclusion(1, 2));
        assert!(!chain.verify_transaction_inclusion(1, 3));
        assert!(!chain.verify_transaction_inclusion(5, 0));
    }

    #[test]
    fn test_validate_blocks_empty() {
        let empty: Vec<Block<String>> = Vec::new();
        assert!(matches!(validate_blocks(&empty), Err(ChainError::EmptyChain)));
    }

    #[test]
    fn test_authenticator_copy_is_detached() {
        let chain = chain();
        chain.register_participant("robot-A", "active", BTreeMap::new());

        let auth = chain.authenticator();
        // Mutating while the copy is alive must not block.
        chain.grant_capability("robot-A", "MOVE");
        chain.append(block(&["a"])).unwrap();

        assert!(!auth.has_capability("robot-A", "MOVE"));
        assert!(!auth.is_used("a"));
        assert!(chain.authenticator().has_capability("robot-A", "MOVE"));
    }

    #[test]
    fn test_append_after_max_index_rejected() {
        let chain = chain();
        let mut snapshot = chain.snapshot();
        snapshot.blocks[0].recompute_linkage(u64::MAX, "f".repeat(64));
        let exhausted = Chain::restore(snapshot, ChainConfig::default()).unwrap();

        let result = exhausted.append(block(&["a"]));
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(ValidationError::IndexOverflow(u64::MAX)))
        ));
        assert_eq!(exhausted.len(), 1);
        assert!(!exhausted.is_transaction_used("a"));
    }
}
