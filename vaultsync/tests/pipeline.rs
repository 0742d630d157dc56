use chrono::{DateTime, Duration, Utc};
use vaultsync::pipeline::SyncPipeline;
use vaultsync::shape::shape;
use vaultsync::source::memory::MemoryEventSource;
use vaultsync::types::{EventType, VaultEvent};
use vaultsync::warehouse::Warehouse;
use vaultsync::warehouse::memory::MemoryWarehouse;
use vaultsync::watermark::DEFAULT_BACKFILL_DAYS;
use vaultsync_telemetry::tracing::init_test_tracing;

fn event(
    transaction_hash: &str,
    event_type: EventType,
    vault_id: Option<&str>,
    timestamp: DateTime<Utc>,
) -> VaultEvent {
    VaultEvent {
        contract_address: "0xf9df6f8e809f6c8d26f3c0aab7a09bbbfb1e699a".to_string(),
        event_type,
        transaction_hash: transaction_hash.to_string(),
        block_number: 6_210_000,
        timestamp,
        topics: vec![
            "0x1682adcf84a5197a236a80c9ffe2e7233619140acb7839754c27cdc21799192c".to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000001".to_string(),
        ],
        data: "0x00".to_string(),
        vault_id: vault_id.map(|id| id.to_string()),
        processed_at: None,
    }
}

/// A timestamp inside the 30-day bootstrap window, so that runs against an
/// empty warehouse still extract it.
fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours)
}

async fn pipeline_with(
    events: Vec<VaultEvent>,
) -> (
    SyncPipeline<MemoryEventSource, MemoryWarehouse>,
    MemoryEventSource,
    MemoryWarehouse,
) {
    let source = MemoryEventSource::new();
    source.push_events(events).await;
    let warehouse = MemoryWarehouse::new();

    (
        SyncPipeline::new(source.clone(), warehouse.clone()),
        source,
        warehouse,
    )
}

#[tokio::test]
async fn second_run_without_new_events_commits_nothing() {
    init_test_tracing();

    let (pipeline, _source, warehouse) = pipeline_with(vec![
        event("0xa", EventType::VaultUpdated, Some("0x01"), hours_ago(2)),
        event("0xb", EventType::VaultUpdated, Some("0x02"), hours_ago(1)),
    ])
    .await;

    let first = pipeline.run().await.unwrap();
    assert_eq!(first.loaded, 2);

    let second = pipeline.run().await.unwrap();
    assert_eq!(second.loaded, 0);
    assert_eq!(warehouse.rows().await.len(), 2);
}

#[tokio::test]
async fn watermark_is_monotonic_across_runs() {
    init_test_tracing();

    let first_ts = hours_ago(3);
    let (pipeline, source, _warehouse) = pipeline_with(vec![event(
        "0xa",
        EventType::VaultUpdated,
        Some("0x01"),
        first_ts,
    )])
    .await;

    let first = pipeline.run().await.unwrap();
    assert_eq!(first.loaded, 1);

    source
        .push_events([event(
            "0xb",
            EventType::VaultUpdated,
            Some("0x02"),
            hours_ago(1),
        )])
        .await;

    let second = pipeline.run().await.unwrap();

    // The next watermark equals the max timestamp committed by the prior run.
    assert_eq!(second.watermark, first_ts);
    assert!(second.watermark >= first.watermark);
    assert_eq!(second.loaded, 1);
}

#[tokio::test]
async fn duplicate_delivery_does_not_create_a_second_row() {
    init_test_tracing();

    let (pipeline, source, warehouse) = pipeline_with(vec![event(
        "0xa",
        EventType::VaultUpdated,
        Some("0x01"),
        hours_ago(2),
    )])
    .await;

    pipeline.run().await.unwrap();

    // Re-deliver the same record identity with a later timestamp so the
    // extractor picks it up again.
    source
        .push_events([event(
            "0xa",
            EventType::VaultUpdated,
            Some("0x01"),
            hours_ago(1),
        )])
        .await;

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.extracted, 1);
    assert_eq!(report.loaded, 0);
    assert_eq!(warehouse.rows().await.len(), 1);
}

#[tokio::test]
async fn empty_store_bootstraps_with_thirty_day_lookback() {
    init_test_tracing();

    let (pipeline, _source, warehouse) = pipeline_with(vec![event(
        "0xa",
        EventType::VaultUpdated,
        Some("0x01"),
        hours_ago(24),
    )])
    .await;

    let report = pipeline.run().await.unwrap();

    let horizon = Utc::now() - Duration::days(DEFAULT_BACKFILL_DAYS);
    let drift = (report.watermark - horizon).num_seconds().abs();
    assert!(drift < 5, "bootstrap watermark drifted {drift}s");

    assert_eq!(report.loaded, 1);
    for row in warehouse.rows().await {
        assert!(row.timestamp >= report.watermark);
    }
}

#[tokio::test]
async fn forced_bulk_failure_lands_all_non_duplicate_rows() {
    init_test_tracing();

    let (pipeline, source, warehouse) = pipeline_with(vec![
        event("0xa", EventType::VaultUpdated, Some("0x01"), hours_ago(8)),
        event("0xb", EventType::VaultUpdated, Some("0x02"), hours_ago(7)),
    ])
    .await;

    pipeline.run().await.unwrap();

    // Batch of 4 where 2 duplicate already-committed rows, delivered while
    // the bulk path is down.
    source
        .push_events([
            event("0xa", EventType::VaultUpdated, Some("0x01"), hours_ago(4)),
            event("0xb", EventType::VaultUpdated, Some("0x02"), hours_ago(3)),
            event("0xc", EventType::VaultUpdated, Some("0x03"), hours_ago(2)),
            event("0xd", EventType::VaultLiquidated, Some("0x03"), hours_ago(1)),
        ])
        .await;
    warehouse.fail_next_bulk_insert().await;

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.extracted, 4);
    assert_eq!(report.loaded, 2);
    assert_eq!(warehouse.rows().await.len(), 4);
}

#[tokio::test]
async fn refresh_is_not_invoked_when_nothing_was_extracted() {
    init_test_tracing();

    let (pipeline, _source, warehouse) = pipeline_with(vec![]).await;

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.extracted, 0);
    assert!(!report.refreshed);
    assert_eq!(warehouse.refresh_calls().await, 0);
}

#[tokio::test]
async fn refresh_failure_does_not_fail_the_run() {
    init_test_tracing();

    let (pipeline, _source, warehouse) = pipeline_with(vec![event(
        "0xa",
        EventType::VaultUpdated,
        Some("0x01"),
        hours_ago(1),
    )])
    .await;
    warehouse.fail_next_refresh().await;

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.loaded, 1);
    assert!(!report.refreshed);
    assert_eq!(warehouse.refresh_calls().await, 1);
}

#[tokio::test]
async fn watermark_failure_aborts_before_touching_the_source() {
    init_test_tracing();

    let (pipeline, source, warehouse) = pipeline_with(vec![event(
        "0xa",
        EventType::VaultUpdated,
        Some("0x01"),
        hours_ago(1),
    )])
    .await;
    warehouse.fail_next_max_timestamp().await;

    assert!(pipeline.run().await.is_err());
    assert_eq!(source.fetch_calls().await, 0);
    assert!(warehouse.rows().await.is_empty());
}

#[tokio::test]
async fn source_failure_degrades_to_an_empty_run() {
    init_test_tracing();

    let (pipeline, source, warehouse) = pipeline_with(vec![event(
        "0xa",
        EventType::VaultUpdated,
        Some("0x01"),
        hours_ago(1),
    )])
    .await;
    source.fail_next_fetch().await;

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.extracted, 0);
    assert_eq!(report.loaded, 0);
    assert!(warehouse.rows().await.is_empty());
    assert_eq!(warehouse.refresh_calls().await, 0);

    // The backlog is picked up by the next scheduled run.
    let recovery = pipeline.run().await.unwrap();
    assert_eq!(recovery.loaded, 1);
}

/// The canonical re-delivery scenario: three records after the watermark
/// where the last two share transaction hash, event type, and vault id.
#[tokio::test]
async fn true_duplicate_pair_commits_two_rows_and_refreshes_once() {
    init_test_tracing();

    let base: DateTime<Utc> = "2024-01-01T00:00:00Z".parse().unwrap();
    let (pipeline, _source, warehouse) = pipeline_with(vec![
        event(
            "0xa",
            EventType::VaultUpdated,
            Some("0x01"),
            base + Duration::seconds(1),
        ),
        event(
            "0xb",
            EventType::VaultUpdated,
            Some("0x02"),
            base + Duration::seconds(2),
        ),
        event(
            "0xb",
            EventType::VaultUpdated,
            Some("0x02"),
            base + Duration::seconds(2),
        ),
    ])
    .await;

    // Seed one row at the watermark so the run extracts against `base`
    // instead of the empty-store bootstrap horizon.
    let seed = shape(event("0x0", EventType::VaultUpdated, Some("0x00"), base));
    warehouse.insert_events(&[seed]).await.unwrap();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.watermark, base);
    assert_eq!(report.extracted, 3);
    assert_eq!(report.loaded, 2);
    assert!(report.refreshed);
    assert_eq!(warehouse.refresh_calls().await, 1);
    assert_eq!(warehouse.rows().await.len(), 3);
}
