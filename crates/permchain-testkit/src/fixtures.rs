//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::collections::BTreeMap;

use permchain::{Chain, ChainConfig};
use permchain_auth::Authenticator;
use permchain_core::{Block, Ed25519PublicKey, Keypair, TransactionRecord};

/// A test fixture with a signing keypair.
pub struct TestFixture {
    pub keypair: Keypair,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self {
            keypair: Keypair::generate(),
        }
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(&seed),
        }
    }

    /// Get the keypair's public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    /// A signed transaction with a string payload.
    pub fn make_tx(&self, id: &str, payload: &str) -> TransactionRecord<String> {
        TransactionRecord::new(id, payload.to_string()).signed(&self.keypair)
    }

    /// A candidate block of signed transactions.
    pub fn make_block(&self, ids: &[&str]) -> Block<String> {
        Block::new(
            ids.iter()
                .map(|id| self.make_tx(id, &format!("payload for {id}")))
                .collect(),
        )
    }

    /// A chain with genesis "g0" plus `blocks` blocks of `per_block`
    /// transactions, ids "tx-<block>-<n>" (1-based).
    pub fn make_chain(&self, uuid: &str, blocks: usize, per_block: usize) -> Chain<String> {
        self.fill(Chain::new(uuid, "g0", "genesis".to_string(), &self.keypair), blocks, per_block)
    }

    /// Like [`make_chain`](Self::make_chain), with this fixture's key as the
    /// chain authority.
    pub fn make_authority_chain(
        &self,
        uuid: &str,
        blocks: usize,
        per_block: usize,
    ) -> Chain<String> {
        let config = ChainConfig::default().with_authority(self.public_key());
        let chain = Chain::with_config(uuid, "g0", "genesis".to_string(), &self.keypair, config)
            .expect("fixture key signs its own genesis");
        self.fill(chain, blocks, per_block)
    }

    fn fill(&self, chain: Chain<String>, blocks: usize, per_block: usize) -> Chain<String> {
        for b in 1..=blocks {
            let ids: Vec<String> = (1..=per_block).map(|n| format!("tx-{b}-{n}")).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            chain
                .append(self.make_block(&refs))
                .expect("fixture ids are unique");
        }
        chain
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// An authenticator with `robot-A` (active, MOVE) and `robot-B`
/// (maintenance, no capabilities).
pub fn robot_fleet() -> Authenticator {
    let mut auth = Authenticator::new();
    auth.register_with(
        "robot-A",
        "active",
        BTreeMap::from([("model".to_string(), "AMR-200".to_string())]),
    );
    auth.grant("robot-A", "MOVE");
    auth.register_with("robot-B", "maintenance", BTreeMap::new());
    auth
}

/// Create multiple test fixtures for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}
