use serde::Deserialize;

use crate::shared::{PipelineConfig, ValidationError};

/// Top-level configuration for the sync runner service.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    pub pipeline: PipelineConfig,
}

impl RunnerConfig {
    /// Validates the full runner configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pipeline.validate()
    }
}
