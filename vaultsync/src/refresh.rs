//! Refreshes the derived analytics summary after a load.

use tracing::{info, warn};

use crate::warehouse::Warehouse;

/// Recreates the warehouse summary view and reports whether it succeeded.
///
/// A refresh failure is logged and swallowed: by the time this runs the event
/// rows are already durably committed, so a stale view must never fail the
/// run.
pub async fn refresh_summary<W>(warehouse: &W) -> bool
where
    W: Warehouse,
{
    match warehouse.refresh_summary().await {
        Ok(()) => {
            info!("analytics summary view refreshed");
            true
        }
        Err(err) => {
            warn!(error = %err, "failed to refresh analytics summary view");
            false
        }
    }
}
