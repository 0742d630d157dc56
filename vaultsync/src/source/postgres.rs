use chrono::{DateTime, Utc};
use pg_escape::quote_identifier;
use sqlx::postgres::PgPoolOptions;
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use sqlx::PgPool;
use vaultsync_config::shared::{PgConnectionConfig, SOURCE_FETCH_OPTIONS};

use crate::error::{ErrorKind, SyncError, SyncResult};
use crate::source::base::EventSource;
use crate::sync_error;
use crate::types::VaultEvent;

const NUM_POOL_CONNECTIONS: u32 = 1;

/// A vault event row as stored in the source table.
#[derive(Debug, FromRow)]
struct StoredEventRow {
    contract_address: String,
    event_type: String,
    transaction_hash: String,
    block_number: i64,
    timestamp: DateTime<Utc>,
    topics: Json<Vec<String>>,
    data: String,
    vault_id: Option<String>,
    processed_at: Option<DateTime<Utc>>,
}

impl TryFrom<StoredEventRow> for VaultEvent {
    type Error = SyncError;

    fn try_from(row: StoredEventRow) -> Result<Self, Self::Error> {
        let event_type = row.event_type.parse().map_err(|err| {
            sync_error!(
                ErrorKind::ConversionError,
                "Unknown event type in source row",
                row.event_type,
                source: err
            )
        })?;

        Ok(VaultEvent {
            contract_address: row.contract_address,
            event_type,
            transaction_hash: row.transaction_hash,
            block_number: row.block_number,
            timestamp: row.timestamp,
            topics: row.topics.0,
            data: row.data,
            vault_id: row.vault_id,
            processed_at: row.processed_at,
        })
    }
}

/// Source store backed by the operational Postgres instance.
///
/// Uses a single lazy connection; the extraction query runs at most once per
/// sync pass, so pooling beyond that buys nothing.
#[derive(Debug, Clone)]
pub struct PostgresEventSource {
    pool: PgPool,
    events_table: String,
}

impl PostgresEventSource {
    /// Creates a source reader for the given connection config and events table.
    pub fn new(config: &PgConnectionConfig, events_table: impl Into<String>) -> Self {
        let options = config.with_db(Some(&SOURCE_FETCH_OPTIONS));
        let pool = PgPoolOptions::new()
            .max_connections(NUM_POOL_CONNECTIONS)
            .connect_lazy_with(options);

        Self {
            pool,
            events_table: events_table.into(),
        }
    }

    /// Verifies that the source store is reachable with the configured credentials.
    pub async fn check_connection(&self) -> SyncResult<()> {
        sqlx::query("select 1").execute(&self.pool).await?;
        Ok(())
    }
}

impl EventSource for PostgresEventSource {
    async fn fetch_events_after(&self, after: DateTime<Utc>) -> SyncResult<Vec<VaultEvent>> {
        let query = format!(
            r#"
            select contract_address, event_type, transaction_hash, block_number,
                   timestamp, topics, data, vault_id, processed_at
            from {}
            where timestamp > $1
            order by timestamp asc
            "#,
            quote_identifier(&self.events_table)
        );

        let rows = sqlx::query_as::<_, StoredEventRow>(&query)
            .bind(after)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(VaultEvent::try_from).collect()
    }
}
