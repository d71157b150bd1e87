//! Shared fixtures for chain integration tests.

#![allow(dead_code)]

use permchain::core::{Block, Keypair, TransactionRecord};
use permchain::Chain;

/// Deterministic signing key.
pub fn authority() -> Keypair {
    Keypair::from_seed(&[0x11; 32])
}

/// Route chain logs to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Signed transactions with the given ids.
pub fn signed_txs(keypair: &Keypair, ids: &[&str]) -> Vec<TransactionRecord<String>> {
    ids.iter()
        .map(|id| TransactionRecord::new(*id, format!("payload for {id}")).signed(keypair))
        .collect()
}

/// A candidate block of signed transactions.
pub fn signed_block(keypair: &Keypair, ids: &[&str]) -> Block<String> {
    Block::new(signed_txs(keypair, ids))
}

/// Chain "c1" with genesis "g1" plus three blocks of two transactions each,
/// ids "tx-<block>-<n>".
pub fn populated_chain(keypair: &Keypair) -> Chain<String> {
    let chain = Chain::new("c1", "g1", "genesis".to_string(), keypair);
    for b in 1..=3 {
        let ids = [format!("tx-{b}-1"), format!("tx-{b}-2")];
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        chain
            .append(signed_block(keypair, &refs))
            .expect("fixture block must append");
    }
    chain
}
