use chrono::{DateTime, Utc};

use crate::types::EventType;

/// A vault event shaped into the warehouse table's column layout.
///
/// Transient: created by the shaper, consumed by the loader, never persisted
/// standalone. `topics` is carried as a JSON-encoded string scalar because the
/// warehouse column ingests the topic list as a single semi-structured value.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub contract_address: String,
    pub event_type: EventType,
    pub transaction_hash: String,
    pub block_number: i64,
    pub timestamp: DateTime<Utc>,
    /// JSON-encoded topic list.
    pub topics: String,
    pub data: String,
    pub vault_id: Option<String>,
    /// Always populated after shaping; defaulted to load time when the source
    /// record carried none.
    pub processed_at: DateTime<Utc>,
}

impl EventRow {
    /// Returns the dedup identity of this row.
    ///
    /// Mirrors the warehouse uniqueness constraint; used by the in-memory
    /// warehouse to emulate duplicate-key behavior.
    pub fn unique_key(&self) -> (String, EventType, Option<String>) {
        (
            self.transaction_hash.clone(),
            self.event_type,
            self.vault_id.clone(),
        )
    }
}
