//! Proptest generators for property-based testing.

use proptest::prelude::*;

use permchain_core::{Block, Ed25519PublicKey, HashAlgorithm, Keypair, Timestamp, TransactionRecord};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random Ed25519PublicKey.
pub fn public_key() -> impl Strategy<Value = Ed25519PublicKey> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate a hash algorithm.
pub fn hash_algorithm() -> impl Strategy<Value = HashAlgorithm> {
    prop_oneof![Just(HashAlgorithm::Sha256), Just(HashAlgorithm::Blake3)]
}

/// Generate a valid timestamp.
pub fn timestamp() -> impl Strategy<Value = Timestamp> {
    (0i32..=i32::MAX, 0u32..1_000_000_000).prop_map(|(sec, nanosec)| Timestamp { sec, nanosec })
}

/// Generate a transaction or participant id.
pub fn tx_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,23}".prop_map(String::from)
}

/// Generate a text payload.
pub fn payload() -> impl Strategy<Value = String> {
    "[ -~]{1,64}".prop_map(String::from)
}

/// Parameters for generating one transaction.
#[derive(Debug, Clone)]
pub struct TxParams {
    pub uuid: String,
    pub payload: String,
    pub priority: u8,
    pub timestamp: Timestamp,
}

impl Arbitrary for TxParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (tx_id(), payload(), any::<u8>(), timestamp())
            .prop_map(|(uuid, payload, priority, timestamp)| TxParams {
                uuid,
                payload,
                priority,
                timestamp,
            })
            .boxed()
    }
}

/// Parameters for generating a block.
#[derive(Debug, Clone)]
pub struct BlockParams {
    pub keypair: Keypair,
    pub algorithm: HashAlgorithm,
    pub timestamp: Timestamp,
    pub transactions: Vec<TxParams>,
}

impl Arbitrary for BlockParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(), // seed
            hash_algorithm(),
            timestamp(),
            prop::collection::vec(any::<TxParams>(), 1..12),
        )
            .prop_map(|(seed, algorithm, timestamp, transactions)| BlockParams {
                keypair: Keypair::from_seed(&seed),
                algorithm,
                timestamp,
                transactions,
            })
            .boxed()
    }
}

/// Build a signed transaction from parameters.
pub fn tx_from_params(params: &TxParams, keypair: &Keypair) -> TransactionRecord<String> {
    TransactionRecord::with_timestamp(
        params.uuid.clone(),
        params.payload.clone(),
        params.priority,
        params.timestamp,
    )
    .signed(keypair)
}

/// Build a genesis-shaped block from parameters.
pub fn block_from_params(params: &BlockParams) -> Block<String> {
    let txs = params
        .transactions
        .iter()
        .map(|tx| tx_from_params(tx, &params.keypair))
        .collect();
    Block::with_timestamp(txs, params.algorithm, params.timestamp)
}
