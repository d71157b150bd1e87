//! The Authenticator: participant identity, capabilities and replay protection.
//!
//! An Authenticator is owned by exactly one chain and gates what may be
//! committed to it. Queries on unregistered ids answer "not authorized" or
//! [`UNKNOWN_STATE`]; they never fail.
//!
//! Mutations take `&mut self`, so the compound check-then-record in
//! [`Authenticator::validate_and_record`] runs under whatever exclusive access
//! the owner holds. The owning chain keeps it behind its write lock.

use std::collections::{BTreeMap, HashMap, HashSet};

use permchain_core::{Ed25519PublicKey, Verifier};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::participant::{ActionRecord, Participant, DEFAULT_STATE, UNKNOWN_STATE};

/// Participant registry, capability store and global used-id set.
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    /// Registered participants by id.
    participants: HashMap<String, Participant>,

    /// Every transaction or action id consumed so far.
    used_ids: HashSet<String>,

    /// Actions accepted through `validate_and_record`, in order.
    ///
    /// Append-only and never pruned: memory and snapshot size grow linearly
    /// with the number of recorded actions.
    actions: Vec<ActionRecord>,
}

impl Authenticator {
    /// Create an empty authenticator.
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Participants
    // ─────────────────────────────────────────────────────────────────────────

    /// Register `id` in the default state with no metadata.
    pub fn register(&mut self, id: impl Into<String>) {
        self.register_with(id, DEFAULT_STATE, BTreeMap::new());
    }

    /// Register `id` with an initial state and metadata.
    ///
    /// Re-registering an existing id overwrites its state and metadata and
    /// keeps its capabilities and public key.
    pub fn register_with(
        &mut self,
        id: impl Into<String>,
        initial_state: impl Into<String>,
        metadata: BTreeMap<String, String>,
    ) {
        let id = id.into();
        let state = initial_state.into();
        tracing::debug!(participant = %id, state = %state, "registering participant");

        let participant = self.participants.entry(id).or_default();
        participant.state = state;
        participant.metadata = metadata;
    }

    /// Check if `id` is a registered participant.
    pub fn is_authorized(&self, id: &str) -> bool {
        self.participants.contains_key(id)
    }

    /// Get a participant record.
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Registered participant ids, sorted.
    pub fn participants(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.participants.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered participants.
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Current state of `id`, or `"unknown"` if unregistered.
    pub fn state(&self, id: &str) -> &str {
        self.participants
            .get(id)
            .map_or(UNKNOWN_STATE, |p| p.state.as_str())
    }

    /// Update the state of a registered participant.
    ///
    /// Returns false, leaving everything unchanged, if `id` is unregistered.
    pub fn update_state(&mut self, id: &str, new_state: impl Into<String>) -> bool {
        match self.participants.get_mut(id) {
            Some(participant) => {
                participant.state = new_state.into();
                true
            }
            None => {
                tracing::warn!(participant = %id, "state update for unregistered participant");
                false
            }
        }
    }

    /// Metadata value for `key`, if both participant and key exist.
    pub fn metadata(&self, id: &str, key: &str) -> Option<&str> {
        self.participants
            .get(id)
            .and_then(|p| p.metadata.get(key))
            .map(String::as_str)
    }

    /// Set a metadata entry. No-op for unregistered ids.
    pub fn set_metadata(&mut self, id: &str, key: impl Into<String>, value: impl Into<String>) {
        if let Some(participant) = self.participants.get_mut(id) {
            participant.metadata.insert(key.into(), value.into());
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Capabilities
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant a capability. No-op for unregistered ids.
    pub fn grant(&mut self, id: &str, capability: impl Into<String>) {
        if let Some(participant) = self.participants.get_mut(id) {
            let capability = capability.into();
            tracing::debug!(participant = %id, capability = %capability, "granting capability");
            participant.capabilities.insert(capability);
        }
    }

    /// Revoke a capability. No-op for unregistered ids or missing capabilities.
    pub fn revoke(&mut self, id: &str, capability: &str) {
        if let Some(participant) = self.participants.get_mut(id) {
            if participant.capabilities.remove(capability) {
                tracing::debug!(participant = %id, capability = %capability, "revoked capability");
            }
        }
    }

    /// Check if `id` holds `capability`. False for unregistered ids.
    pub fn has_capability(&self, id: &str, capability: &str) -> bool {
        self.participants
            .get(id)
            .is_some_and(|p| p.has_capability(capability))
    }

    /// Capabilities held by `id`, sorted. Empty for unregistered ids.
    pub fn capabilities(&self, id: &str) -> Vec<&str> {
        self.participants
            .get(id)
            .map(|p| p.capabilities.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────────

    /// Attach a verification key. No-op for unregistered ids.
    pub fn set_public_key(&mut self, id: &str, key: Ed25519PublicKey) {
        if let Some(participant) = self.participants.get_mut(id) {
            participant.public_key = Some(key);
        }
    }

    /// The verification key attached to `id`, if any.
    pub fn public_key(&self, id: &str) -> Option<Ed25519PublicKey> {
        self.participants.get(id).and_then(|p| p.public_key)
    }

    /// Verify `signature` over `message` with the key attached to `id`.
    ///
    /// False when the participant or its key is missing.
    pub fn verify_signature(&self, id: &str, message: &[u8], signature: &[u8]) -> bool {
        self.public_key(id)
            .is_some_and(|key| key.verify(message, signature))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Replay protection
    // ─────────────────────────────────────────────────────────────────────────

    /// Check if `tx_id` has been consumed.
    pub fn is_used(&self, tx_id: &str) -> bool {
        self.used_ids.contains(tx_id)
    }

    /// Consume `tx_id`. Returns false if it was already used.
    ///
    /// Storage-level idempotent; callers that care about replay must go
    /// through [`validate_and_record`](Self::validate_and_record) or check
    /// [`is_used`](Self::is_used) under the same exclusive access.
    pub fn mark_used(&mut self, tx_id: impl Into<String>) -> bool {
        self.used_ids.insert(tx_id.into())
    }

    /// Number of consumed ids.
    pub fn used_count(&self) -> usize {
        self.used_ids.len()
    }

    /// Consumed ids, sorted.
    pub fn used_transaction_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.used_ids.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Actions accepted so far, in order.
    pub fn action_log(&self) -> &[ActionRecord] {
        &self.actions
    }

    /// The read-only part of [`validate_and_record`](Self::validate_and_record).
    ///
    /// A `required_capability` of `None` or `Some("")` imposes no requirement.
    pub fn check(&self, issuer: &str, tx_id: &str, required_capability: Option<&str>) -> Result<()> {
        if self.is_used(tx_id) {
            return Err(AuthError::DuplicateTransaction(tx_id.to_string()));
        }
        if !self.is_authorized(issuer) {
            return Err(AuthError::Unauthorized(issuer.to_string()));
        }
        if let Some(capability) = required_capability.filter(|c| !c.is_empty()) {
            if !self.has_capability(issuer, capability) {
                return Err(AuthError::MissingCapability {
                    participant: issuer.to_string(),
                    capability: capability.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validate an action and, only on full success, consume its id.
    ///
    /// Fails with `DuplicateTransaction`, `Unauthorized` or
    /// `MissingCapability`, checked in that order. On failure nothing changes.
    pub fn validate_and_record(
        &mut self,
        issuer: &str,
        description: &str,
        tx_id: &str,
        required_capability: Option<&str>,
    ) -> Result<()> {
        if let Err(e) = self.check(issuer, tx_id, required_capability) {
            tracing::warn!(issuer = %issuer, tx_id = %tx_id, error = %e, "action rejected");
            return Err(e);
        }

        self.used_ids.insert(tx_id.to_string());
        self.actions.push(ActionRecord {
            issuer: issuer.to_string(),
            description: description.to_string(),
            tx_id: tx_id.to_string(),
        });
        tracing::debug!(issuer = %issuer, tx_id = %tx_id, description = %description, "action recorded");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Snapshots
    // ─────────────────────────────────────────────────────────────────────────

    /// Export the full state in deterministic order.
    ///
    /// Copies the whole used-id set and action history, so the cost is
    /// linear in everything ever recorded.
    pub fn snapshot(&self) -> AuthenticatorSnapshot {
        AuthenticatorSnapshot {
            participants: self
                .participants
                .iter()
                .map(|(id, p)| (id.clone(), p.clone()))
                .collect(),
            used_ids: self
                .used_transaction_ids()
                .into_iter()
                .map(str::to_string)
                .collect(),
            actions: self.actions.clone(),
        }
    }

    /// Rebuild from a snapshot.
    pub fn from_snapshot(snapshot: AuthenticatorSnapshot) -> Self {
        Self {
            participants: snapshot.participants.into_iter().collect(),
            used_ids: snapshot.used_ids.into_iter().collect(),
            actions: snapshot.actions,
        }
    }
}

/// Codec-neutral export of an [`Authenticator`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthenticatorSnapshot {
    pub participants: BTreeMap<String, Participant>,
    pub used_ids: Vec<String>,
    pub actions: Vec<ActionRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use permchain_core::{Keypair, Signer};
    use proptest::prelude::*;

    fn robot_fleet() -> Authenticator {
        let mut auth = Authenticator::new();
        auth.register_with("robot-A", "active", BTreeMap::new());
        auth.grant("robot-A", "MOVE");
        auth
    }

    #[test]
    fn test_register_defaults() {
        let mut auth = Authenticator::new();
        auth.register("sensor-1");
        assert!(auth.is_authorized("sensor-1"));
        assert_eq!(auth.state("sensor-1"), DEFAULT_STATE);
        assert!(auth.capabilities("sensor-1").is_empty());
    }

    #[test]
    fn test_unknown_participant_queries() {
        let auth = Authenticator::new();
        assert!(!auth.is_authorized("ghost"));
        assert_eq!(auth.state("ghost"), UNKNOWN_STATE);
        assert!(!auth.has_capability("ghost", "MOVE"));
        assert!(auth.capabilities("ghost").is_empty());
        assert_eq!(auth.metadata("ghost", "model"), None);
    }

    #[test]
    fn test_reregistration_overwrites_state_and_metadata() {
        let mut auth = Authenticator::new();
        let first = BTreeMap::from([("role".to_string(), "first".to_string())]);
        let second = BTreeMap::from([("role".to_string(), "second".to_string())]);

        auth.register_with("dup", "active", first);
        auth.grant("dup", "SCAN");
        auth.register_with("dup", "idle", second);

        assert_eq!(auth.state("dup"), "idle");
        assert_eq!(auth.metadata("dup", "role"), Some("second"));
        assert!(auth.has_capability("dup", "SCAN"));
        assert_eq!(auth.participant_count(), 1);
    }

    #[test]
    fn test_update_state() {
        let mut auth = robot_fleet();
        assert!(auth.update_state("robot-A", "maintenance"));
        assert_eq!(auth.state("robot-A"), "maintenance");

        assert!(!auth.update_state("robot-B", "active"));
        assert_eq!(auth.state("robot-B"), UNKNOWN_STATE);
    }

    #[test]
    fn test_grant_and_revoke() {
        let mut auth = robot_fleet();
        auth.grant("robot-A", "MOVE");
        assert_eq!(auth.capabilities("robot-A"), vec!["MOVE"]);

        auth.revoke("robot-A", "MOVE");
        assert!(!auth.has_capability("robot-A", "MOVE"));

        // Unregistered ids are ignored.
        auth.grant("ghost", "MOVE");
        assert!(!auth.has_capability("ghost", "MOVE"));
        assert!(!auth.is_authorized("ghost"));
    }

    #[test]
    fn test_metadata() {
        let mut auth = robot_fleet();
        auth.set_metadata("robot-A", "location", "field-7");
        assert_eq!(auth.metadata("robot-A", "location"), Some("field-7"));

        auth.set_metadata("ghost", "location", "nowhere");
        assert_eq!(auth.metadata("ghost", "location"), None);
    }

    #[test]
    fn test_validate_and_record_success() {
        let mut auth = robot_fleet();
        assert!(auth
            .validate_and_record("robot-A", "move north", "cmd-1", Some("MOVE"))
            .is_ok());
        assert!(auth.is_used("cmd-1"));
        assert_eq!(auth.action_log().len(), 1);
        assert_eq!(auth.action_log()[0].description, "move north");
    }

    #[test]
    fn test_duplicate_rejected_and_state_unchanged() {
        let mut auth = robot_fleet();
        auth.validate_and_record("robot-A", "move north", "tx-1", Some("MOVE"))
            .unwrap();
        let before = auth.snapshot();

        let result = auth.validate_and_record("robot-A", "move north", "tx-1", Some("MOVE"));
        assert_eq!(result, Err(AuthError::DuplicateTransaction("tx-1".into())));
        assert_eq!(auth.snapshot(), before);
    }

    #[test]
    fn test_unauthorized_issuer() {
        let mut auth = robot_fleet();
        let result = auth.validate_and_record("robot-B", "move north", "cmd-2", Some("MOVE"));
        assert_eq!(result, Err(AuthError::Unauthorized("robot-B".into())));
        assert!(!auth.is_used("cmd-2"));
    }

    #[test]
    fn test_missing_capability() {
        let mut auth = robot_fleet();
        let result = auth.validate_and_record("robot-A", "spray", "cmd-3", Some("SPRAY"));
        assert!(matches!(result, Err(AuthError::MissingCapability { .. })));
        assert!(!auth.is_used("cmd-3"));
    }

    #[test]
    fn test_empty_capability_means_none_required() {
        let mut auth = robot_fleet();
        assert!(auth.validate_and_record("robot-A", "ping", "p-1", Some("")).is_ok());
        assert!(auth.validate_and_record("robot-A", "ping", "p-2", None).is_ok());
    }

    #[test]
    fn test_duplicate_checked_before_authorization() {
        let mut auth = robot_fleet();
        auth.mark_used("cmd-9");
        assert_eq!(
            auth.check("ghost", "cmd-9", Some("MOVE")),
            Err(AuthError::DuplicateTransaction("cmd-9".into()))
        );
    }

    #[test]
    fn test_mark_used_idempotent() {
        let mut auth = Authenticator::new();
        assert!(auth.mark_used("x"));
        assert!(!auth.mark_used("x"));
        assert_eq!(auth.used_count(), 1);
    }

    #[test]
    fn test_participant_signature() {
        let kp = Keypair::from_seed(&[0x05; 32]);
        let mut auth = robot_fleet();
        let sig = kp.sign(b"move north");

        assert!(!auth.verify_signature("robot-A", b"move north", &sig));
        auth.set_public_key("robot-A", kp.public_key());
        assert!(auth.verify_signature("robot-A", b"move north", &sig));
        assert!(!auth.verify_signature("robot-A", b"move south", &sig));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut auth = robot_fleet();
        auth.set_metadata("robot-A", "model", "X1");
        auth.validate_and_record("robot-A", "move", "cmd-1", Some("MOVE"))
            .unwrap();

        let restored = Authenticator::from_snapshot(auth.snapshot());
        assert_eq!(restored.snapshot(), auth.snapshot());
        assert!(restored.is_used("cmd-1"));
        assert!(restored.has_capability("robot-A", "MOVE"));
    }

    #[test]
    fn test_snapshot_keeps_full_action_history() {
        let mut auth = robot_fleet();
        for n in 0..50 {
            auth.validate_and_record("robot-A", "step", &format!("cmd-{n}"), Some("MOVE"))
                .unwrap();
        }

        let snapshot = auth.snapshot();
        assert_eq!(snapshot.actions.len(), 50);
        assert_eq!(snapshot.actions[0].tx_id, "cmd-0");
        assert_eq!(snapshot.actions[49].tx_id, "cmd-49");

        let restored = Authenticator::from_snapshot(snapshot);
        assert_eq!(restored.action_log(), auth.action_log());
    }

    proptest! {
        #[test]
        fn prop_failed_actions_change_nothing(
            issuer in "[a-c]",
            capability in prop::option::of("[A-C]"),
            tx_id in "[0-3]",
        ) {
            let mut auth = Authenticator::new();
            auth.register("a");
            auth.grant("a", "A");
            auth.mark_used("0");

            let before = auth.snapshot();
            if auth
                .validate_and_record(&issuer, "action", &tx_id, capability.as_deref())
                .is_err()
            {
                prop_assert_eq!(auth.snapshot(), before);
            } else {
                prop_assert!(auth.is_used(&tx_id));
                prop_assert_eq!(auth.used_count(), 2);
            }
        }
    }
}
