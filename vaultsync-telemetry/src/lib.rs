//! Telemetry initialization for vaultsync services.

pub mod tracing;
