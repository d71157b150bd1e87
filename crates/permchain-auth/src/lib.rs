//! # Permchain Auth
//!
//! The policy layer gating what may be committed to a permchain ledger.
//!
//! ## Overview
//!
//! An [`Authenticator`] tracks three things for the chain that owns it:
//!
//! - **Participants**: named actors with a state, metadata and an optional key
//! - **Capabilities**: named permissions a participant must hold for an action
//! - **Used ids**: every transaction or action id ever consumed (replay guard)
//!
//! ## Usage
//!
//! ```rust
//! use permchain_auth::{AuthError, Authenticator};
//!
//! let mut auth = Authenticator::new();
//! auth.register("robot-A");
//! auth.grant("robot-A", "MOVE");
//!
//! auth.validate_and_record("robot-A", "move north", "cmd-1", Some("MOVE")).unwrap();
//!
//! // Replays are refused.
//! let replay = auth.validate_and_record("robot-A", "move north", "cmd-1", Some("MOVE"));
//! assert!(matches!(replay, Err(AuthError::DuplicateTransaction(_))));
//! ```

pub mod authenticator;
pub mod error;
pub mod participant;

pub use authenticator::{Authenticator, AuthenticatorSnapshot};
pub use error::{AuthError, Result};
pub use participant::{ActionRecord, Participant, DEFAULT_STATE, UNKNOWN_STATE};
