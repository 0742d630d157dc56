use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of vault event emitted by the upstream indexer.
///
/// The indexer watches exactly two contract event signatures, so any other
/// value in the source table is a data error, not a new variant to absorb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    VaultUpdated,
    VaultLiquidated,
}

impl EventType {
    /// Returns the canonical string form stored in both event tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::VaultUpdated => "VaultUpdated",
            EventType::VaultLiquidated => "VaultLiquidated",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an event type string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEventTypeError(pub String);

impl fmt::Display for ParseEventTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type `{}`", self.0)
    }
}

impl std::error::Error for ParseEventTypeError {}

impl FromStr for EventType {
    type Err = ParseEventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VaultUpdated" => Ok(EventType::VaultUpdated),
            "VaultLiquidated" => Ok(EventType::VaultLiquidated),
            other => Err(ParseEventTypeError(other.to_string())),
        }
    }
}

/// One vault event record as produced by the upstream indexer.
///
/// Immutable once written on the source side. `timestamp` is the ordering key
/// for incremental extraction; it is not guaranteed globally unique, so
/// identity comes from `(transaction_hash, event_type, vault_id)`, which the
/// warehouse enforces with a uniqueness constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct VaultEvent {
    pub contract_address: String,
    pub event_type: EventType,
    pub transaction_hash: String,
    pub block_number: i64,
    pub timestamp: DateTime<Utc>,
    /// Raw log topics, ordered as emitted.
    pub topics: Vec<String>,
    /// Opaque hex payload of the log.
    pub data: String,
    /// Vault identifier, taken from the second topic when present.
    pub vault_id: Option<String>,
    /// When the indexer processed the log; may be absent on older rows.
    pub processed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_round_trips_through_string_form() {
        for event_type in [EventType::VaultUpdated, EventType::VaultLiquidated] {
            assert_eq!(
                event_type.as_str().parse::<EventType>().unwrap(),
                event_type
            );
        }
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let err = "VaultOpened".parse::<EventType>().unwrap_err();
        assert_eq!(err.0, "VaultOpened");
    }
}
