use serde::Deserialize;

use crate::shared::{PgConnectionConfig, ValidationError};

fn default_events_table() -> String {
    "vault_events".to_string()
}

/// Configuration for one sync pipeline.
///
/// Contains the connection settings for the operational source store and the
/// analytical warehouse, plus the name of the replicated events table. The
/// table is expected to exist on both sides with matching column sets; the
/// pipeline never creates or alters schema.
///
/// This intentionally does not implement `Serialize` to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// The operational Postgres instance events are extracted from.
    pub source: PgConnectionConfig,
    /// The analytical Postgres instance shaped rows are loaded into.
    pub warehouse: PgConnectionConfig,
    /// Name of the replicated events table on both sides.
    #[serde(default = "default_events_table")]
    pub events_table: String,
}

impl PipelineConfig {
    /// Validates pipeline configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.source.tls.validate()?;
        self.warehouse.tls.validate()?;

        if self.events_table.is_empty() {
            return Err(ValidationError::EmptyEventsTable);
        }

        Ok(())
    }
}
