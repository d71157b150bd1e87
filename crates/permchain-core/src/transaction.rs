//! TransactionRecord: one signed, timestamped unit of intent.
//!
//! A record is created once and signed once. Re-signing overwrites the
//! signature. After the record is committed inside a block it is never mutated.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_bytes, signing_message, Canonical};
use crate::crypto::{Signer, Verifier};
use crate::error::CoreError;
use crate::types::{Timestamp, DEFAULT_PRIORITY};
use crate::validation::validate_transaction_structure;

/// A signed transaction carrying a caller-defined payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord<P> {
    /// Chain-unique identifier; also the replay-protection key.
    pub uuid: String,

    /// Scheduling priority. The full `u8` range is valid.
    pub priority: u8,

    /// Caller payload.
    pub payload: P,

    /// Creation time.
    pub timestamp: Timestamp,

    /// Signature over the signing message. Empty until signed.
    pub signature: Bytes,
}

impl<P: Canonical> TransactionRecord<P> {
    /// Create an unsigned record with the default priority, stamped now.
    pub fn new(uuid: impl Into<String>, payload: P) -> Self {
        Self::with_priority(uuid, payload, DEFAULT_PRIORITY)
    }

    /// Create an unsigned record with an explicit priority, stamped now.
    pub fn with_priority(uuid: impl Into<String>, payload: P, priority: u8) -> Self {
        Self::with_timestamp(uuid, payload, priority, Timestamp::now())
    }

    /// Create an unsigned record from a wide priority value.
    ///
    /// Fails with [`CoreError::PriorityOutOfRange`] outside `0..=255`.
    pub fn try_new(uuid: impl Into<String>, payload: P, priority: i64) -> Result<Self, CoreError> {
        let priority = u8::try_from(priority).map_err(|_| CoreError::PriorityOutOfRange(priority))?;
        Ok(Self::with_priority(uuid, payload, priority))
    }

    /// Create an unsigned record with a fixed timestamp.
    pub fn with_timestamp(
        uuid: impl Into<String>,
        payload: P,
        priority: u8,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            priority,
            payload,
            timestamp,
            signature: Bytes::new(),
        }
    }

    /// The deterministic encoding fed to the Merkle leaf hash.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_bytes(self)
    }

    /// The unambiguous, domain-separated message the signature covers.
    pub fn signing_message(&self) -> Vec<u8> {
        signing_message(self)
    }

    /// Sign the signing message, replacing any previous signature.
    pub fn sign<S: Signer + ?Sized>(&mut self, signer: &S) {
        let signature = signer.sign(&self.signing_message());
        self.signature = Bytes::from(signature);
    }

    /// Builder-style [`sign`](Self::sign).
    pub fn signed<S: Signer + ?Sized>(mut self, signer: &S) -> Self {
        self.sign(signer);
        self
    }

    /// Returns true if a signature is present.
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    /// Structural check only: non-empty uuid, payload and signature.
    ///
    /// This does NOT verify the signature cryptographically. Use
    /// [`verify_signature`](Self::verify_signature) for that.
    pub fn is_structurally_valid(&self) -> bool {
        validate_transaction_structure(self).is_ok()
    }

    /// Verify the signature against the signing message.
    pub fn verify_signature<V: Verifier + ?Sized>(&self, verifier: &V) -> bool {
        self.is_signed() && verifier.verify(&self.signing_message(), &self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::types::Timestamp;

    fn keypair() -> Keypair {
        Keypair::from_seed(&[0x42; 32])
    }

    #[test]
    fn test_new_is_unsigned_with_default_priority() {
        let tx = TransactionRecord::new("tx-1", "payload".to_string());
        assert_eq!(tx.priority, DEFAULT_PRIORITY);
        assert!(!tx.is_signed());
        assert!(!tx.is_structurally_valid());
    }

    #[test]
    fn test_sign_then_valid() {
        let kp = keypair();
        let tx = TransactionRecord::new("tx-1", "payload".to_string()).signed(&kp);
        assert!(tx.is_signed());
        assert!(tx.is_structurally_valid());
        assert!(tx.verify_signature(&kp.public_key()));
    }

    #[test]
    fn test_resign_is_idempotent() {
        let kp = keypair();
        let mut tx = TransactionRecord::new("tx-1", "payload".to_string());
        tx.sign(&kp);
        let first = tx.signature.clone();
        tx.sign(&kp);
        assert_eq!(first, tx.signature);
    }

    #[test]
    fn test_tampered_payload_fails_verification() {
        let kp = keypair();
        let mut tx = TransactionRecord::new("tx-1", "payload".to_string()).signed(&kp);
        tx.payload = "payloaD".to_string();
        // Still structurally fine, but no longer authentic.
        assert!(tx.is_structurally_valid());
        assert!(!tx.verify_signature(&kp.public_key()));
    }

    #[test]
    fn test_signature_does_not_transfer_between_leaf_twins() {
        let kp = keypair();
        let ts = Timestamp::new(1_736_870_400, 0).unwrap();
        let original = TransactionRecord::with_timestamp("pay-1", "0 to bob".to_string(), 100, ts)
            .signed(&kp);

        let mut twin = TransactionRecord::with_timestamp("pay-10", " to bob".to_string(), 100, ts);
        twin.signature = original.signature.clone();

        assert_eq!(original.canonical_bytes(), twin.canonical_bytes());
        assert!(original.verify_signature(&kp.public_key()));
        assert!(!twin.verify_signature(&kp.public_key()));
    }

    #[test]
    fn test_structural_failures() {
        let kp = keypair();

        let empty_uuid = TransactionRecord::new("", "payload".to_string()).signed(&kp);
        assert!(!empty_uuid.is_structurally_valid());

        let empty_payload = TransactionRecord::new("tx", String::new()).signed(&kp);
        assert!(!empty_payload.is_structurally_valid());
    }

    #[test]
    fn test_priority_bounds() {
        let kp = keypair();
        let min = TransactionRecord::with_priority("min", "x".to_string(), 0).signed(&kp);
        let max = TransactionRecord::with_priority("max", "x".to_string(), 255).signed(&kp);
        assert!(min.is_structurally_valid());
        assert!(max.is_structurally_valid());

        assert!(TransactionRecord::try_new("ok", "x".to_string(), 255).is_ok());
        assert!(matches!(
            TransactionRecord::try_new("neg", "x".to_string(), -1),
            Err(CoreError::PriorityOutOfRange(-1))
        ));
        assert!(matches!(
            TransactionRecord::try_new("big", "x".to_string(), 256),
            Err(CoreError::PriorityOutOfRange(256))
        ));
    }

    #[test]
    fn test_serde_json_roundtrip() {
        let tx = TransactionRecord::new("tx-1", "payload".to_string()).signed(&keypair());
        let json = serde_json::to_string(&tx).unwrap();
        let recovered: TransactionRecord<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, recovered);
    }
}
