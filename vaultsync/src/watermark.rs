//! Resolves the lower bound for incremental extraction.

use chrono::{DateTime, Duration, Utc};

use crate::error::SyncResult;
use crate::warehouse::Warehouse;

/// Look-back horizon used when the warehouse holds no events yet.
pub const DEFAULT_BACKFILL_DAYS: i64 = 30;

/// Resolves the sync watermark from the warehouse.
///
/// Returns the maximum event timestamp already durably present, or
/// `now − 30 days` when the events table is empty. The watermark is never
/// persisted independently: it is recomputed from the warehouse at the start
/// of every run, so prior committed writes are the only state that matters.
///
/// A warehouse error here is fatal to the run and propagates to the caller:
/// extracting against an untrusted watermark could re-load or skip arbitrary
/// windows.
pub async fn resolve_watermark<W>(warehouse: &W) -> SyncResult<DateTime<Utc>>
where
    W: Warehouse,
{
    let max = warehouse.max_event_timestamp().await?;

    Ok(max.unwrap_or_else(|| Utc::now() - Duration::days(DEFAULT_BACKFILL_DAYS)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::shape;
    use crate::types::{EventType, VaultEvent};
    use crate::warehouse::memory::MemoryWarehouse;

    fn event_at(timestamp: &str) -> VaultEvent {
        VaultEvent {
            contract_address: "0xf9df".to_string(),
            event_type: EventType::VaultUpdated,
            transaction_hash: format!("0x{timestamp}"),
            block_number: 1,
            timestamp: timestamp.parse().unwrap(),
            topics: vec![],
            data: "0x".to_string(),
            vault_id: None,
            processed_at: None,
        }
    }

    #[tokio::test]
    async fn returns_max_timestamp_when_rows_exist() {
        let warehouse = MemoryWarehouse::new();
        let rows = [
            shape(event_at("2024-01-01T00:00:00Z")),
            shape(event_at("2024-01-03T00:00:00Z")),
            shape(event_at("2024-01-02T00:00:00Z")),
        ];
        warehouse.insert_events(&rows).await.unwrap();

        let watermark = resolve_watermark(&warehouse).await.unwrap();
        let expected: DateTime<Utc> = "2024-01-03T00:00:00Z".parse().unwrap();
        assert_eq!(watermark, expected);
    }

    #[tokio::test]
    async fn defaults_to_thirty_day_lookback_on_empty_store() {
        let warehouse = MemoryWarehouse::new();

        let watermark = resolve_watermark(&warehouse).await.unwrap();
        let expected = Utc::now() - Duration::days(DEFAULT_BACKFILL_DAYS);

        let drift = (watermark - expected).num_seconds().abs();
        assert!(drift < 5, "watermark drifted {drift}s from the horizon");
    }

    #[tokio::test]
    async fn propagates_warehouse_errors() {
        let warehouse = MemoryWarehouse::new();
        warehouse.fail_next_max_timestamp().await;

        assert!(resolve_watermark(&warehouse).await.is_err());
    }
}
