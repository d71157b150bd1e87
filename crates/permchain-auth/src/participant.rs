//! Participant records and recorded actions.

use std::collections::{BTreeMap, BTreeSet};

use permchain_core::Ed25519PublicKey;
use serde::{Deserialize, Serialize};

/// State assigned when registration does not name one.
pub const DEFAULT_STATE: &str = "inactive";

/// State reported for ids that were never registered.
pub const UNKNOWN_STATE: &str = "unknown";

/// A registered participant (robot, device, operator, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Participant {
    /// Free-form state, e.g. "active", "maintenance", "idle".
    pub state: String,

    /// Named permissions. Ordered and deduplicated.
    pub capabilities: BTreeSet<String>,

    /// Free-form key/value metadata, e.g. model or location.
    pub metadata: BTreeMap<String, String>,

    /// Key used to verify this participant's signatures, if known.
    pub public_key: Option<Ed25519PublicKey>,
}

impl Participant {
    /// Create a participant in `state` with `metadata` and no capabilities.
    pub fn new(state: impl Into<String>, metadata: BTreeMap<String, String>) -> Self {
        Self {
            state: state.into(),
            capabilities: BTreeSet::new(),
            metadata,
            public_key: None,
        }
    }

    /// Check if this participant holds `capability`.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}

/// An action accepted by [`Authenticator::validate_and_record`](crate::Authenticator::validate_and_record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Who issued the action.
    pub issuer: String,

    /// Human-readable description.
    pub description: String,

    /// The replay-protection id consumed by this action.
    pub tx_id: String,
}
