//! # Permchain Testkit
//!
//! Testing utilities for permchain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed inputs with known canonical encodings and digests
//! - **Generators**: Proptest strategies for transactions, blocks and ids
//! - **Fixtures**: Seeded keypairs and helpers for building chains
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the canonical encoding and block hash so any other
//! implementation can check itself against this one:
//!
//! ```rust
//! use permchain_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! assert!(verify_all_vectors().iter().all(|(_, ok, _)| *ok));
//! assert!(!all_vectors().is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use permchain_testkit::generators::{block_from_params, BlockParams};
//!
//! proptest! {
//!     #[test]
//!     fn block_hash_is_deterministic(params: BlockParams) {
//!         let b1 = block_from_params(&params);
//!         let b2 = block_from_params(&params);
//!         prop_assert_eq!(b1.hash, b2.hash);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use permchain_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::with_seed([7; 32]);
//! let chain = fixture.make_chain("fleet", 3, 2);
//! assert_eq!(chain.len(), 4);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, robot_fleet, TestFixture};
pub use generators::{block_from_params, tx_from_params, BlockParams, TxParams};
pub use vectors::{all_vectors, block_from_vector, verify_all_vectors, GoldenVector, VectorTx};
