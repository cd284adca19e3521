use super::traits::ConfigSection;
use crate::error::{CoevoError, Result};
use serde::{Deserialize, Serialize};

/// Target expression sampled at `variable = seed + i` for `i in 0..range`,
/// unless `path` names a JSON file of pre-built pairings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecificationConfig {
    pub expression: String,
    pub variable: String,
    pub range: usize,
    pub seed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Default for SpecificationConfig {
    fn default() -> Self {
        Self {
            expression: "x*x+4".to_string(),
            variable: "x".to_string(),
            range: 10,
            seed: 0.0,
            path: None,
        }
    }
}

impl ConfigSection for SpecificationConfig {
    fn section_name() -> &'static str {
        "specification"
    }

    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if path.trim().is_empty() {
                return Err(CoevoError::InvalidConfiguration(
                    "Specification path must not be empty".to_string(),
                ));
            }
            return Ok(());
        }
        if self.expression.trim().is_empty() {
            return Err(CoevoError::InvalidConfiguration(
                "Specification expression must not be empty".to_string(),
            ));
        }
        if self.variable.trim().is_empty() {
            return Err(CoevoError::InvalidConfiguration(
                "Specification variable must not be empty".to_string(),
            ));
        }
        if self.range == 0 {
            return Err(CoevoError::InvalidConfiguration(
                "Specification range must be at least 1".to_string(),
            ));
        }
        if !self.seed.is_finite() {
            return Err(CoevoError::InvalidConfiguration(
                "Specification seed must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
