use std::io;
use std::sync::Once;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};
use vaultsync_config::Environment;

/// Default filter directive applied when `RUST_LOG` is not set.
const DEFAULT_LOG_DIRECTIVES: &str = "info";

/// Errors that can occur while initializing tracing.
#[derive(Debug, Error)]
pub enum InitTracingError {
    /// Failed to determine the runtime environment.
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),

    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Keeps the non-blocking log writer alive.
///
/// Dropping this value flushes buffered log lines; hold it for the lifetime
/// of the process.
#[must_use = "dropping the flusher stops log writing"]
pub struct LogFlusher {
    _guard: WorkerGuard,
}

/// Initializes the global tracing subscriber for a service.
///
/// The filter comes from `RUST_LOG` (defaulting to `info`). Dev environments
/// get human-readable output; staging and prod emit one JSON object per line
/// for log ingestion. Returns a [`LogFlusher`] that must be kept alive until
/// the process exits.
pub fn init_tracing(service_name: &str) -> Result<LogFlusher, InitTracingError> {
    let environment = Environment::load()?;

    let (writer, guard) = tracing_appender::non_blocking(io::stdout());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVES));

    let registry = tracing_subscriber::registry().with(env_filter);

    if environment.is_dev() {
        registry
            .with(fmt::layer().with_writer(writer).with_target(true))
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_writer(writer),
            )
            .try_init()?;
    }

    tracing::info!(service = service_name, environment = %environment, "tracing initialized");

    Ok(LogFlusher { _guard: guard })
}

static INIT_TEST_TRACING: Once = Once::new();

/// Initializes tracing for tests.
///
/// Safe to call from every test; only the first call installs the subscriber.
/// Output goes through the libtest capture writer so passing tests stay quiet.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVES));

        fmt()
            .with_env_filter(env_filter)
            .with_test_writer()
            .init();
    });
}
