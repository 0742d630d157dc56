use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::{ErrorKind, SyncResult};
use crate::sync_error;
use crate::types::{EventRow, EventType};

use crate::warehouse::base::Warehouse;

type UniqueKey = (String, EventType, Option<String>);

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<EventRow>,
    keys: HashSet<UniqueKey>,
    fail_next_bulk_insert: bool,
    fail_next_max_timestamp: bool,
    fail_next_refresh: bool,
    failing_transaction_hashes: HashSet<String>,
    refresh_calls: u32,
}

/// In-memory warehouse for testing and development purposes.
///
/// Emulates the uniqueness constraint on `(transaction_hash, event_type,
/// vault_id)` so both load paths behave like the Postgres-backed store: the
/// bulk path skips duplicates and reports the committed count, the strict
/// single-row path rejects them with
/// [`crate::error::ErrorKind::ConstraintViolation`]. One-shot failures can be
/// injected to force the bulk fallback, a watermark failure, or a refresh
/// failure.
#[derive(Debug, Clone, Default)]
pub struct MemoryWarehouse {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryWarehouse {
    /// Creates a new empty memory warehouse.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all committed rows.
    pub async fn rows(&self) -> Vec<EventRow> {
        let inner = self.inner.lock().await;
        inner.rows.clone()
    }

    /// Returns how many times the summary view has been refreshed.
    pub async fn refresh_calls(&self) -> u32 {
        let inner = self.inner.lock().await;
        inner.refresh_calls
    }

    /// Makes the next bulk insert fail outright, forcing the row-by-row fallback.
    pub async fn fail_next_bulk_insert(&self) {
        let mut inner = self.inner.lock().await;
        inner.fail_next_bulk_insert = true;
    }

    /// Makes the next watermark query fail.
    pub async fn fail_next_max_timestamp(&self) {
        let mut inner = self.inner.lock().await;
        inner.fail_next_max_timestamp = true;
    }

    /// Makes the next summary refresh fail.
    pub async fn fail_next_refresh(&self) {
        let mut inner = self.inner.lock().await;
        inner.fail_next_refresh = true;
    }

    /// Makes every strict single-row insert of the given transaction hash fail
    /// with a non-duplicate error.
    pub async fn fail_inserts_for(&self, transaction_hash: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner
            .failing_transaction_hashes
            .insert(transaction_hash.into());
    }
}

impl Warehouse for MemoryWarehouse {
    async fn max_event_timestamp(&self) -> SyncResult<Option<DateTime<Utc>>> {
        let mut inner = self.inner.lock().await;

        if inner.fail_next_max_timestamp {
            inner.fail_next_max_timestamp = false;
            return Err(sync_error!(
                ErrorKind::ConnectionFailed,
                "Injected watermark query failure"
            ));
        }

        Ok(inner.rows.iter().map(|row| row.timestamp).max())
    }

    async fn insert_events(&self, rows: &[EventRow]) -> SyncResult<u64> {
        let mut inner = self.inner.lock().await;

        if inner.fail_next_bulk_insert {
            inner.fail_next_bulk_insert = false;
            return Err(sync_error!(
                ErrorKind::ConnectionFailed,
                "Injected bulk insert failure"
            ));
        }

        let mut inserted = 0u64;
        for row in rows {
            if inner.keys.insert(row.unique_key()) {
                inner.rows.push(row.clone());
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    async fn insert_event(&self, row: &EventRow) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;

        if inner
            .failing_transaction_hashes
            .contains(&row.transaction_hash)
        {
            return Err(sync_error!(
                ErrorKind::QueryFailed,
                "Injected row insert failure",
                row.transaction_hash
            ));
        }

        if !inner.keys.insert(row.unique_key()) {
            return Err(sync_error!(
                ErrorKind::ConstraintViolation,
                "Unique constraint violated",
                row.transaction_hash
            ));
        }

        inner.rows.push(row.clone());

        Ok(())
    }

    async fn refresh_summary(&self) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;

        // Counts attempts, not successes, so gating tests see every call.
        inner.refresh_calls += 1;

        if inner.fail_next_refresh {
            inner.fail_next_refresh = false;
            return Err(sync_error!(
                ErrorKind::QueryFailed,
                "Injected refresh failure"
            ));
        }

        Ok(())
    }
}
