//! Shared configuration types for vaultsync services.

mod connection;
mod pipeline;
mod runner;

pub use connection::{
    PgConnectionConfig, PgConnectionOptions, SOURCE_FETCH_OPTIONS, TlsConfig, ValidationError,
    WAREHOUSE_LOAD_OPTIONS,
};
pub use pipeline::PipelineConfig;
pub use runner::RunnerConfig;
