use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::SyncResult;
use crate::types::EventRow;

/// Trait for analytical stores that receive shaped event rows.
///
/// Implementations never create or alter schema: the events table and its
/// uniqueness constraint on `(transaction_hash, event_type, vault_id)` must
/// already exist. The pipeline's idempotence depends on that constraint, so
/// an implementation without it silently loses dedup protection.
pub trait Warehouse {
    /// Returns the maximum event timestamp already present in the events
    /// table, or [`None`] when the table is empty.
    fn max_event_timestamp(&self) -> impl Future<Output = SyncResult<Option<DateTime<Utc>>>> + Send;

    /// Bulk-writes shaped rows into the events table.
    ///
    /// The operation tolerates duplicate rows by skipping them rather than
    /// aborting the batch, and returns the number of rows actually committed.
    /// An error from this method means the bulk operation itself failed, not
    /// that individual rows were rejected.
    fn insert_events(&self, rows: &[EventRow]) -> impl Future<Output = SyncResult<u64>> + Send;

    /// Writes a single shaped row with a strict parameterized insert.
    ///
    /// A duplicate row surfaces as [`crate::error::ErrorKind::ConstraintViolation`];
    /// the caller decides whether that is an error or an expected skip.
    fn insert_event(&self, row: &EventRow) -> impl Future<Output = SyncResult<()>> + Send;

    /// Recreates the derived summary view over recent events.
    fn refresh_summary(&self) -> impl Future<Output = SyncResult<()>> + Send;
}
