//! Shared value types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::CoreError;

/// Nanoseconds per second; `Timestamp::nanosec` is always below this.
pub const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Previous-hash sentinel carried by a genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "GENESIS";

/// Priority assigned when a caller does not pick one.
pub const DEFAULT_PRIORITY: u8 = 100;

/// Wall-clock time split into signed seconds and sub-second nanoseconds.
///
/// Deserialization goes through [`Timestamp::new`], so decoded timestamps
/// always satisfy `nanosec < NANOS_PER_SEC`. Values built by hand are caught
/// by block and transaction validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimestamp")]
pub struct Timestamp {
    pub sec: i32,
    pub nanosec: u32,
}

#[derive(Deserialize)]
struct RawTimestamp {
    sec: i32,
    nanosec: u32,
}

impl TryFrom<RawTimestamp> for Timestamp {
    type Error = CoreError;

    fn try_from(raw: RawTimestamp) -> Result<Self, Self::Error> {
        Timestamp::new(raw.sec, raw.nanosec)
    }
}

impl Timestamp {
    /// Create a timestamp, rejecting `nanosec >= 1_000_000_000`.
    pub fn new(sec: i32, nanosec: u32) -> Result<Self, CoreError> {
        if nanosec >= NANOS_PER_SEC {
            return Err(CoreError::InvalidTimestamp(nanosec));
        }
        Ok(Self { sec, nanosec })
    }

    /// Returns true if `nanosec` is below one second.
    pub fn is_well_formed(&self) -> bool {
        self.nanosec < NANOS_PER_SEC
    }

    /// The current system time.
    ///
    /// Seconds saturate at `i32::MAX`; a clock before the epoch reads as zero.
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            sec: i32::try_from(elapsed.as_secs()).unwrap_or(i32::MAX),
            nanosec: elapsed.subsec_nanos(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nanosec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_overflowing_nanos() {
        assert!(Timestamp::new(0, NANOS_PER_SEC - 1).is_ok());
        assert!(matches!(
            Timestamp::new(0, NANOS_PER_SEC),
            Err(CoreError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_now_is_well_formed() {
        let ts = Timestamp::now();
        assert!(ts.nanosec < NANOS_PER_SEC);
        assert!(ts.sec > 0);
    }

    #[test]
    fn test_deserialize_rejects_overflowing_nanos() {
        let ok: Timestamp = serde_json::from_str(r#"{"sec":5,"nanosec":999999999}"#).unwrap();
        assert!(ok.is_well_formed());

        let bad = serde_json::from_str::<Timestamp>(r#"{"sec":5,"nanosec":4000000000}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_hand_built_timestamp_reports_malformed() {
        let ts = Timestamp {
            sec: 0,
            nanosec: NANOS_PER_SEC,
        };
        assert!(!ts.is_well_formed());
    }

    #[test]
    fn test_display() {
        let ts = Timestamp::new(12, 5).unwrap();
        assert_eq!(ts.to_string(), "12.000000005");
    }
}
