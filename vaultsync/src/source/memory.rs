use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::{ErrorKind, SyncResult};
use crate::source::base::EventSource;
use crate::sync_error;
use crate::types::VaultEvent;

#[derive(Debug, Default)]
struct Inner {
    events: Vec<VaultEvent>,
    fail_next_fetch: bool,
    fetch_calls: u32,
}

/// In-memory event source for testing and development purposes.
///
/// Holds a fixed set of events and serves them through the same contract as
/// the Postgres-backed source: strictly-greater-than filtering, ascending
/// order. A one-shot failure can be injected to exercise the pipeline's
/// degraded extraction path.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSource {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryEventSource {
    /// Creates a new empty memory source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends events to the store.
    pub async fn push_events(&self, events: impl IntoIterator<Item = VaultEvent>) {
        let mut inner = self.inner.lock().await;
        inner.events.extend(events);
    }

    /// Makes the next fetch fail with a connection error.
    pub async fn fail_next_fetch(&self) {
        let mut inner = self.inner.lock().await;
        inner.fail_next_fetch = true;
    }

    /// Returns how many times the source has been queried.
    pub async fn fetch_calls(&self) -> u32 {
        let inner = self.inner.lock().await;
        inner.fetch_calls
    }
}

impl EventSource for MemoryEventSource {
    async fn fetch_events_after(&self, after: DateTime<Utc>) -> SyncResult<Vec<VaultEvent>> {
        let mut inner = self.inner.lock().await;
        inner.fetch_calls += 1;

        if inner.fail_next_fetch {
            inner.fail_next_fetch = false;
            return Err(sync_error!(
                ErrorKind::ConnectionFailed,
                "Injected source fetch failure"
            ));
        }

        let mut events: Vec<VaultEvent> = inner
            .events
            .iter()
            .filter(|event| event.timestamp > after)
            .cloned()
            .collect();
        events.sort_by_key(|event| event.timestamp);

        Ok(events)
    }
}
