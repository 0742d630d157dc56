use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::SyncResult;
use crate::types::VaultEvent;

/// Trait for stores the pipeline extracts vault events from.
///
/// Implementations return records whose ordering key is strictly greater than
/// the given bound, in ascending order, with no pagination ceiling: one call
/// yields the entire backlog since the watermark. Re-delivery protection for
/// records at exactly the bound is not this seam's job; the loader's
/// duplicate-skip path covers it.
pub trait EventSource {
    /// Fetches all events with `timestamp` strictly greater than `after`,
    /// ascending by timestamp.
    fn fetch_events_after(
        &self,
        after: DateTime<Utc>,
    ) -> impl Future<Output = SyncResult<Vec<VaultEvent>>> + Send;
}
