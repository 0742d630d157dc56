//! Sync runner service binary.
//!
//! Performs one incremental replication pass from the operational store into
//! the analytical warehouse: resolve watermark, extract, shape, load,
//! refresh. Designed to be invoked on a fixed interval by an external
//! scheduler; the process exits non-zero only on fatal errors.

use tracing::error;
use vaultsync_config::shared::RunnerConfig;
use vaultsync_telemetry::tracing::init_tracing;

use crate::config::load_runner_config;
use crate::core::start_runner_with_config;
use crate::error::{RunnerError, RunnerResult};

mod config;
mod core;
mod error;

/// Entry point for the sync runner.
///
/// Loads configuration, initializes tracing, starts the async runtime, and
/// runs one sync pass.
fn main() -> RunnerResult<()> {
    let runner_config = load_runner_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME")).map_err(RunnerError::config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(runner_config))?;

    Ok(())
}

/// Main async entry point that runs the sync pass and reports failures.
async fn async_main(runner_config: RunnerConfig) -> RunnerResult<()> {
    if let Err(err) = start_runner_with_config(runner_config).await {
        error!("{err}");
        return Err(err);
    }

    Ok(())
}
