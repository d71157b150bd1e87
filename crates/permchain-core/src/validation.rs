//! Transaction and block validation.
//!
//! Every check here is pure: nothing is mutated, so validators may be called
//! repeatedly. Linkage between blocks is checked by [`validate_linkage`];
//! whole-chain validation lives with the chain itself.

use crate::block::Block;
use crate::canonical::Canonical;
use crate::error::ValidationError;
use crate::transaction::TransactionRecord;

/// Structural transaction check.
///
/// Rejects a malformed timestamp, an empty uuid, an empty canonical payload,
/// or a missing signature.
/// Priority is a `u8`, so its range holds by construction. The signature is
/// NOT verified cryptographically here.
pub fn validate_transaction_structure<P: Canonical>(
    tx: &TransactionRecord<P>,
) -> Result<(), ValidationError> {
    if !tx.timestamp.is_well_formed() {
        return Err(ValidationError::InvalidTimestamp(tx.timestamp.nanosec));
    }
    if tx.uuid.is_empty() {
        return Err(ValidationError::EmptyUuid);
    }
    if tx.payload.canonical().is_empty() {
        return Err(ValidationError::EmptyPayload);
    }
    if tx.signature.is_empty() {
        return Err(ValidationError::MissingSignature(tx.uuid.clone()));
    }
    Ok(())
}

/// Self-consistency check for a single block.
///
/// In order:
/// 1. structure: well-formed timestamp, non-empty `previous_hash` and `hash`
/// 2. stored hash equals the recomputed hash
/// 3. stored Merkle root equals the root over the current transactions
/// 4. every transaction is structurally valid
pub fn validate_block<P: Canonical>(block: &Block<P>) -> Result<(), ValidationError> {
    if !block.timestamp.is_well_formed() {
        return Err(ValidationError::InvalidTimestamp(block.timestamp.nanosec));
    }
    if block.previous_hash.is_empty() {
        return Err(ValidationError::StructuralError(
            "previous_hash is empty".into(),
        ));
    }
    if block.hash.is_empty() {
        return Err(ValidationError::StructuralError("hash is empty".into()));
    }

    let computed = block.calculate_hash();
    if computed != block.hash {
        return Err(ValidationError::HashMismatch {
            stored: block.hash.clone(),
            computed,
        });
    }

    let computed_root = block.calculate_merkle_root();
    if computed_root != block.merkle_root {
        return Err(ValidationError::MerkleRootMismatch {
            stored: block.merkle_root.clone(),
            computed: computed_root,
        });
    }

    for (index, tx) in block.transactions.iter().enumerate() {
        validate_transaction_structure(tx).map_err(|reason| ValidationError::InvalidTransaction {
            index,
            reason: Box::new(reason),
        })?;
    }

    Ok(())
}

/// Check that `block` directly follows `previous`.
pub fn validate_linkage<P>(previous: &Block<P>, block: &Block<P>) -> Result<(), ValidationError> {
    let expected_index = previous
        .index
        .checked_add(1)
        .ok_or(ValidationError::IndexOverflow(previous.index))?;
    if block.index != expected_index {
        return Err(ValidationError::NonContiguousIndex {
            expected: expected_index,
            got: block.index,
        });
    }
    if block.previous_hash != previous.hash {
        return Err(ValidationError::LinkageError {
            index: block.index,
            expected: previous.hash.clone(),
            got: block.previous_hash.clone(),
        });
    }
    Ok(())
}
