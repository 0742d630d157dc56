//! Shapes source event records into warehouse rows.

use chrono::Utc;

use crate::types::{EventRow, VaultEvent};

/// Shapes one source event into the warehouse row layout.
///
/// Pure and total: every syntactically valid [`VaultEvent`] produces a row.
/// The topic list is JSON-encoded into a single string scalar and
/// `processed_at` is defaulted to now when the source record carries none.
pub fn shape(event: VaultEvent) -> EventRow {
    // Serializing a Vec<String> cannot fail; the fallback keeps this total.
    let topics = serde_json::to_string(&event.topics).unwrap_or_else(|_| "[]".to_string());

    EventRow {
        contract_address: event.contract_address,
        event_type: event.event_type,
        transaction_hash: event.transaction_hash,
        block_number: event.block_number,
        timestamp: event.timestamp,
        topics,
        data: event.data,
        vault_id: event.vault_id,
        processed_at: event.processed_at.unwrap_or_else(Utc::now),
    }
}
