//! Canonical encodings for transactions and payloads.
//!
//! Two encodings exist:
//!
//! - [`canonical_bytes`]: the Merkle leaf. ASCII decimal for numbers, no
//!   separators, byte-identical with existing deployments:
//!
//!   ```text
//!   timestamp.sec || timestamp.nanosec || priority || uuid || payload.canonical()
//!   ```
//!
//! - [`signing_message`]: the bytes fed to the signer. Fixed-width big-endian
//!   numbers and length-prefixed strings behind [`SIGN_DOMAIN`], so two
//!   distinct records never share a message. The leaf form is ambiguous
//!   (uuid "pay-1" + payload "0 x" equals uuid "pay-10" + payload " x") and
//!   must not be signed.
//!
//! ```text
//! SIGN_DOMAIN || sec (i32 BE) || nanosec (u32 BE) || priority (u8)
//!             || len(uuid) (u64 BE) || uuid || len(payload) (u64 BE) || payload
//! ```

use std::fmt::Write as _;

use crate::transaction::TransactionRecord;

/// A payload with a deterministic, byte-stable textual representation.
///
/// This is the only coupling between the ledger core and caller-supplied data.
pub trait Canonical {
    /// Return the canonical text of this value.
    ///
    /// Must be a pure function of the value: equal values yield equal text.
    fn canonical(&self) -> String;
}

impl Canonical for String {
    fn canonical(&self) -> String {
        self.clone()
    }
}

/// Raw bytes canonicalize to lowercase hex.
impl Canonical for Vec<u8> {
    fn canonical(&self) -> String {
        hex::encode(self)
    }
}

/// Encode a transaction to its canonical bytes.
pub fn canonical_bytes<P: Canonical>(tx: &TransactionRecord<P>) -> Vec<u8> {
    canonical_string(tx).into_bytes()
}

/// Domain separator prefixed to every signing message.
pub const SIGN_DOMAIN: &[u8] = b"permchain/tx-sig/v1";

/// Encode the message a transaction's signature covers.
pub fn signing_message<P: Canonical>(tx: &TransactionRecord<P>) -> Vec<u8> {
    let payload = tx.payload.canonical();
    let mut msg = Vec::with_capacity(SIGN_DOMAIN.len() + 25 + tx.uuid.len() + payload.len());
    msg.extend_from_slice(SIGN_DOMAIN);
    msg.extend_from_slice(&tx.timestamp.sec.to_be_bytes());
    msg.extend_from_slice(&tx.timestamp.nanosec.to_be_bytes());
    msg.push(tx.priority);
    push_len_prefixed(&mut msg, tx.uuid.as_bytes());
    push_len_prefixed(&mut msg, payload.as_bytes());
    msg
}

fn push_len_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    buf.extend_from_slice(bytes);
}

/// Encode a transaction to its canonical text.
pub fn canonical_string<P: Canonical>(tx: &TransactionRecord<P>) -> String {
    let payload = tx.payload.canonical();
    let mut out = String::with_capacity(32 + tx.uuid.len() + payload.len());
    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "{}{}{}{}{}",
        tx.timestamp.sec, tx.timestamp.nanosec, tx.priority, tx.uuid, payload
    );
    out
}
