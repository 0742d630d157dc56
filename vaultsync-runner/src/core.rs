use tracing::{debug, info, warn};
use vaultsync::pipeline::SyncPipeline;
use vaultsync::source::postgres::PostgresEventSource;
use vaultsync::warehouse::postgres::PostgresWarehouse;
use vaultsync_config::shared::{PgConnectionConfig, RunnerConfig};

use crate::error::RunnerResult;

/// Starts one sync pass with the provided configuration.
///
/// Builds the Postgres-backed source and warehouse handles, verifies both
/// connections, runs the pipeline, and logs the run report. The pipeline
/// itself holds no retry loop; the external scheduler re-invokes the runner
/// on a fixed interval.
pub async fn start_runner_with_config(config: RunnerConfig) -> RunnerResult<()> {
    info!("starting vaultsync runner");

    log_config(&config);

    let source = PostgresEventSource::new(&config.pipeline.source, &config.pipeline.events_table);
    let warehouse =
        PostgresWarehouse::new(&config.pipeline.warehouse, &config.pipeline.events_table);

    // A dead warehouse would fail the watermark query anyway, so surfacing it
    // here is the same fatality with a clearer message. A dead source is not
    // fatal: extraction degrades to an empty run.
    warehouse.check_connection().await?;
    if let Err(err) = source.check_connection().await {
        warn!(error = %err, "source store preflight failed, this run will extract nothing");
    }

    let pipeline = SyncPipeline::new(source, warehouse);
    let report = pipeline.run().await?;

    info!(
        watermark = %report.watermark,
        extracted = report.extracted,
        loaded = report.loaded,
        refreshed = report.refreshed,
        "sync run finished"
    );

    Ok(())
}

fn log_config(config: &RunnerConfig) {
    debug!(
        events_table = config.pipeline.events_table,
        "pipeline config"
    );
    log_pg_connection_config("source", &config.pipeline.source);
    log_pg_connection_config("warehouse", &config.pipeline.warehouse);
}

fn log_pg_connection_config(role: &str, config: &PgConnectionConfig) {
    debug!(
        role,
        host = config.host,
        port = config.port,
        dbname = config.name,
        username = config.username,
        tls_enabled = config.tls.enabled,
        "postgres connection config",
    );
}
