use std::fmt;
use std::io;
use std::str::FromStr;

/// Name of the environment variable holding the runtime environment.
const APP_ENVIRONMENT_ENV_NAME: &str = "APP_ENVIRONMENT";

/// Runtime environment the service is deployed in.
///
/// The environment selects which configuration file overlays `base` and which
/// log output format the telemetry layer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    /// Loads the environment from `APP_ENVIRONMENT`, defaulting to [`Environment::Dev`]
    /// when the variable is unset.
    pub fn load() -> Result<Environment, io::Error> {
        match std::env::var(APP_ENVIRONMENT_ENV_NAME) {
            Ok(value) => value
                .parse()
                .map_err(|err: ParseEnvironmentError| io::Error::other(err.to_string())),
            Err(std::env::VarError::NotPresent) => Ok(Environment::Dev),
            Err(err) => Err(io::Error::other(err.to_string())),
        }
    }

    /// Sets `APP_ENVIRONMENT` for the current process.
    ///
    /// Intended for examples and tests that want deterministic behavior without
    /// requiring the caller to export the variable.
    pub fn set(self) {
        unsafe {
            std::env::set_var(APP_ENVIRONMENT_ENV_NAME, self.to_string());
        }
    }

    /// Returns true when running in a local development environment.
    pub fn is_dev(&self) -> bool {
        matches!(self, Environment::Dev)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Dev => f.write_str("dev"),
            Environment::Staging => f.write_str("staging"),
            Environment::Prod => f.write_str("prod"),
        }
    }
}

/// Error returned when `APP_ENVIRONMENT` holds an unrecognized value.
#[derive(Debug, thiserror::Error)]
#[error("unknown environment `{0}`, expected one of: dev, staging, prod")]
pub struct ParseEnvironmentError(String);

impl FromStr for Environment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(ParseEnvironmentError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_environments() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Prod
        );
        assert_eq!(
            "Staging".parse::<Environment>().unwrap(),
            Environment::Staging
        );
    }

    #[test]
    fn rejects_unknown_environment() {
        assert!("qa".parse::<Environment>().is_err());
    }
}
