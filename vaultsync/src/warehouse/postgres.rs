use chrono::{DateTime, Utc};
use pg_escape::quote_identifier;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use vaultsync_config::shared::{PgConnectionConfig, WAREHOUSE_LOAD_OPTIONS};

use crate::error::SyncResult;
use crate::types::EventRow;
use crate::warehouse::base::Warehouse;

const NUM_POOL_CONNECTIONS: u32 = 1;

/// Maximum rows per bulk insert statement.
///
/// Each row binds 9 parameters and Postgres caps a statement at 65535 binds,
/// so batches beyond this are split into multiple statements within the same
/// bulk attempt.
const MAX_ROWS_PER_INSERT: usize = 5000;

/// Column list of the warehouse events table, in insert order.
const EVENT_COLUMNS: &str = "contract_address, event_type, transaction_hash, block_number, \
     timestamp, topics, data, vault_id, processed_at";

/// Analytical store backed by a Postgres warehouse instance.
///
/// The events table and its uniqueness constraint must already exist; this
/// store only reads the watermark, writes rows, and maintains the summary
/// view.
#[derive(Debug, Clone)]
pub struct PostgresWarehouse {
    pool: PgPool,
    events_table: String,
}

impl PostgresWarehouse {
    /// Creates a warehouse handle for the given connection config and events table.
    pub fn new(config: &PgConnectionConfig, events_table: impl Into<String>) -> Self {
        let options = config.with_db(Some(&WAREHOUSE_LOAD_OPTIONS));
        let pool = PgPoolOptions::new()
            .max_connections(NUM_POOL_CONNECTIONS)
            .connect_lazy_with(options);

        Self {
            pool,
            events_table: events_table.into(),
        }
    }

    /// Verifies that the warehouse is reachable with the configured credentials.
    pub async fn check_connection(&self) -> SyncResult<()> {
        sqlx::query("select 1").execute(&self.pool).await?;
        Ok(())
    }
}

impl Warehouse for PostgresWarehouse {
    async fn max_event_timestamp(&self) -> SyncResult<Option<DateTime<Utc>>> {
        let query = format!(
            "select max(timestamp) from {}",
            quote_identifier(&self.events_table)
        );

        let max = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(&query)
            .fetch_one(&self.pool)
            .await?;

        Ok(max)
    }

    async fn insert_events(&self, rows: &[EventRow]) -> SyncResult<u64> {
        let mut inserted = 0u64;

        for chunk in rows.chunks(MAX_ROWS_PER_INSERT) {
            let mut builder = QueryBuilder::<Postgres>::new(format!(
                "insert into {} ({EVENT_COLUMNS}) ",
                quote_identifier(&self.events_table)
            ));

            builder.push_values(chunk, |mut values, row| {
                values
                    .push_bind(&row.contract_address)
                    .push_bind(row.event_type.as_str())
                    .push_bind(&row.transaction_hash)
                    .push_bind(row.block_number)
                    .push_bind(row.timestamp)
                    .push_bind(&row.topics)
                    .push_bind(&row.data)
                    .push_bind(row.vault_id.as_deref())
                    .push_bind(row.processed_at);
            });

            // Duplicate re-deliveries are skipped by the statement itself;
            // rows_affected only counts rows that actually landed.
            builder.push(" on conflict do nothing");

            let result = builder.build().execute(&self.pool).await?;
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    async fn insert_event(&self, row: &EventRow) -> SyncResult<()> {
        let query = format!(
            "insert into {} ({EVENT_COLUMNS}) values ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            quote_identifier(&self.events_table)
        );

        sqlx::query(&query)
            .bind(&row.contract_address)
            .bind(row.event_type.as_str())
            .bind(&row.transaction_hash)
            .bind(row.block_number)
            .bind(row.timestamp)
            .bind(&row.topics)
            .bind(&row.data)
            .bind(row.vault_id.as_deref())
            .bind(row.processed_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn refresh_summary(&self) -> SyncResult<()> {
        let query = format!(
            r#"
            create or replace view current_stats as
            select
                count(*) as total_events,
                count(distinct vault_id) as unique_vaults,
                count(*) filter (where event_type = 'VaultUpdated') as total_updates,
                count(*) filter (where event_type = 'VaultLiquidated') as total_liquidations,
                max(block_number) as latest_block,
                max(timestamp) as latest_event_time
            from {}
            where timestamp >= now() - interval '30 days'
            "#,
            quote_identifier(&self.events_table)
        );

        sqlx::query(&query).execute(&self.pool).await?;

        Ok(())
    }
}
