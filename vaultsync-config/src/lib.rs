//! Configuration loading and shared configuration types for vaultsync services.
//!
//! Services load their configuration hierarchically: a `base` file, an
//! environment-specific file, and finally `APP_`-prefixed environment variable
//! overrides. Secret-bearing types intentionally do not implement `Serialize`.

mod environment;
mod load;

pub mod shared;

pub use environment::Environment;
pub use load::{LoadConfigError, load_config};
