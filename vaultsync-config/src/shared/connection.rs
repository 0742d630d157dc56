use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::sync::LazyLock;
use thiserror::Error;

/// Common Postgres session settings shared by every vaultsync connection.
const COMMON_DATESTYLE: &str = "ISO";
const COMMON_CLIENT_ENCODING: &str = "UTF8";
const COMMON_TIMEZONE: &str = "UTC";

const APP_NAME_SOURCE_FETCH: &str = "vaultsync_source_fetch";
const APP_NAME_WAREHOUSE_LOAD: &str = "vaultsync_warehouse_load";

/// Session options for reading event backlogs from the source store.
///
/// Extraction is a single unbounded query, so the statement timeout is generous
/// but bounded: no call may hang forever.
pub static SOURCE_FETCH_OPTIONS: LazyLock<PgConnectionOptions> =
    LazyLock::new(|| PgConnectionOptions {
        datestyle: COMMON_DATESTYLE.to_string(),
        client_encoding: COMMON_CLIENT_ENCODING.to_string(),
        timezone: COMMON_TIMEZONE.to_string(),
        statement_timeout: 300_000,
        lock_timeout: 10_000,
        idle_in_transaction_session_timeout: 60_000,
        application_name: APP_NAME_SOURCE_FETCH.to_string(),
    });

/// Session options for watermark queries, loads, and view refreshes against the warehouse.
pub static WAREHOUSE_LOAD_OPTIONS: LazyLock<PgConnectionOptions> =
    LazyLock::new(|| PgConnectionOptions {
        datestyle: COMMON_DATESTYLE.to_string(),
        client_encoding: COMMON_CLIENT_ENCODING.to_string(),
        timezone: COMMON_TIMEZONE.to_string(),
        statement_timeout: 300_000,
        lock_timeout: 10_000,
        idle_in_transaction_session_timeout: 60_000,
        application_name: APP_NAME_WAREHOUSE_LOAD.to_string(),
    });

/// Postgres session options applied on top of a [`PgConnectionConfig`].
#[derive(Debug, Clone)]
pub struct PgConnectionOptions {
    pub datestyle: String,
    pub client_encoding: String,
    pub timezone: String,
    pub statement_timeout: u32,
    pub lock_timeout: u32,
    pub idle_in_transaction_session_timeout: u32,
    pub application_name: String,
}

impl PgConnectionOptions {
    pub fn to_key_value_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("datestyle".to_string(), self.datestyle.clone()),
            ("client_encoding".to_string(), self.client_encoding.clone()),
            ("timezone".to_string(), self.timezone.clone()),
            (
                "statement_timeout".to_string(),
                self.statement_timeout.to_string(),
            ),
            ("lock_timeout".to_string(), self.lock_timeout.to_string()),
            (
                "idle_in_transaction_session_timeout".to_string(),
                self.idle_in_transaction_session_timeout.to_string(),
            ),
            (
                "application_name".to_string(),
                self.application_name.clone(),
            ),
        ]
    }
}

/// Connection settings for a Postgres instance.
///
/// This intentionally does not implement `Serialize` to avoid accidentally
/// leaking the password into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct PgConnectionConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub username: String,
    pub password: Option<SecretString>,
    pub tls: TlsConfig,
}

impl PgConnectionConfig {
    /// Builds sqlx connect options for this configuration without selecting a database.
    pub fn without_db(&self, options: Option<&PgConnectionOptions>) -> PgConnectOptions {
        let ssl_mode = if self.tls.enabled {
            PgSslMode::VerifyFull
        } else {
            PgSslMode::Prefer
        };

        let mut connect_options = PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .username(&self.username)
            .port(self.port)
            .ssl_mode(ssl_mode)
            .ssl_root_cert_from_pem(self.tls.trusted_root_certs.clone().into_bytes());

        if let Some(password) = &self.password {
            connect_options = connect_options.password(password.expose_secret());
        }

        if let Some(opts) = options {
            connect_options = connect_options.options(opts.to_key_value_pairs());
        }

        connect_options
    }

    /// Builds sqlx connect options for this configuration with the database selected.
    pub fn with_db(&self, options: Option<&PgConnectionOptions>) -> PgConnectOptions {
        self.without_db(options).database(&self.name)
    }
}

/// TLS settings for a Postgres connection.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    pub trusted_root_certs: String,
    pub enabled: bool,
}

impl TlsConfig {
    pub fn disabled() -> Self {
        Self {
            trusted_root_certs: "".to_string(),
            enabled: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.trusted_root_certs.is_empty() {
            return Err(ValidationError::MissingTrustedRootCerts);
        }

        Ok(())
    }
}

/// Errors produced while validating configuration values.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("trusted root certificates must be provided when TLS is enabled")]
    MissingTrustedRootCerts,

    #[error("the events table name must not be empty")]
    EmptyEventsTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_options_are_bounded() {
        assert!(SOURCE_FETCH_OPTIONS.statement_timeout > 0);
        assert!(WAREHOUSE_LOAD_OPTIONS.statement_timeout > 0);
        assert_eq!(
            SOURCE_FETCH_OPTIONS.application_name,
            "vaultsync_source_fetch"
        );
    }

    #[test]
    fn tls_validation_requires_certs_when_enabled() {
        let tls = TlsConfig {
            trusted_root_certs: "".to_string(),
            enabled: true,
        };
        assert!(tls.validate().is_err());
        assert!(TlsConfig::disabled().validate().is_ok());
    }
}
