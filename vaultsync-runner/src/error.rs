use std::error::Error;

use thiserror::Error;
use vaultsync::error::SyncError;

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Error type for the sync runner service.
///
/// Wraps [`SyncError`] for pipeline errors and provides variants for
/// infrastructure errors. Only errors reaching `main` terminate the process
/// with a non-zero exit; every non-fatal failure class is already absorbed
/// inside the pipeline.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Pipeline or store-related error.
    #[error("{0}")]
    Sync(#[from] SyncError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[source] Box<dyn Error + Send + Sync>),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// Creates a configuration error from any boxed source.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        RunnerError::Config(Box::new(err))
    }
}
