//! Loads shaped rows into the warehouse.

use tracing::{error, warn};

use crate::error::{ErrorKind, SyncResult};
use crate::types::EventRow;
use crate::warehouse::Warehouse;

/// Loads shaped rows into the warehouse and returns the committed count.
///
/// An empty batch short-circuits without touching the store. The primary path
/// is a single bulk write whose own duplicate tolerance skips re-delivered
/// rows. Only when the bulk call itself fails does the loader fall back to
/// row-by-row strict inserts: duplicates are skipped silently (expected under
/// re-delivery and overlapping runs), any other row error is logged and the
/// loop continues to the next row. The fallback maximizes rows landed; it is
/// not a transaction.
pub async fn load_events<W>(warehouse: &W, rows: &[EventRow]) -> SyncResult<u64>
where
    W: Warehouse,
{
    if rows.is_empty() {
        return Ok(0);
    }

    match warehouse.insert_events(rows).await {
        Ok(inserted) => Ok(inserted),
        Err(err) => {
            warn!(
                error = %err,
                rows = rows.len(),
                "bulk load failed, falling back to row-by-row inserts"
            );

            let mut inserted = 0u64;
            for row in rows {
                match warehouse.insert_event(row).await {
                    Ok(()) => inserted += 1,
                    Err(err) if err.kind() == ErrorKind::ConstraintViolation => {
                        // Expected duplicate re-delivery; skip without noise.
                    }
                    Err(err) => {
                        error!(
                            transaction_hash = %row.transaction_hash,
                            error = %err,
                            "failed to insert event row"
                        );
                    }
                }
            }

            Ok(inserted)
        }
    }
}
