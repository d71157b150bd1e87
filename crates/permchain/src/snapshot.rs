//! Codec-neutral chain export.
//!
//! A [`ChainSnapshot`] is plain serde data. CBOR helpers are provided since
//! that is the compact form used on disk and over the wire; any other serde
//! format (JSON for debugging) works directly on the struct.

use permchain_auth::AuthenticatorSnapshot;
use permchain_core::{Block, HashAlgorithm};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};

/// Full chain state: blocks plus authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot<P> {
    pub uuid: String,
    pub hash_algorithm: HashAlgorithm,
    pub blocks: Vec<Block<P>>,
    pub authenticator: AuthenticatorSnapshot,
}

impl<P: Serialize> ChainSnapshot<P> {
    /// Encode to CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| ChainError::Snapshot(e.to_string()))?;
        Ok(buf)
    }
}

impl<P: DeserializeOwned> ChainSnapshot<P> {
    /// Decode from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| ChainError::Snapshot(e.to_string()))
    }
}
