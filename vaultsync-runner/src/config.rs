use vaultsync_config::load_config;
use vaultsync_config::shared::RunnerConfig;

use crate::error::{RunnerError, RunnerResult};

/// Loads and validates the runner configuration.
///
/// Uses the standard hierarchical loading mechanism from [`vaultsync_config`]
/// and validates the resulting [`RunnerConfig`] before returning it.
pub fn load_runner_config() -> RunnerResult<RunnerConfig> {
    let config = load_config::<RunnerConfig>().map_err(RunnerError::config)?;
    config.validate().map_err(RunnerError::config)?;

    Ok(config)
}
