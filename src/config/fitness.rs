use super::traits::ConfigSection;
use crate::engines::evaluation::fitness::{DivideByZeroPolicy, FitnessStrategy};
use crate::error::{CoevoError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    pub strategy: FitnessStrategy,
    pub antagonist_threshold_multiplier: f64,
    pub protagonist_threshold_multiplier: f64,
    pub divide_by_zero: DivideByZeroPolicy,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            strategy: FitnessStrategy::ThresholdedRatio,
            antagonist_threshold_multiplier: 10.0,
            protagonist_threshold_multiplier: 1.5,
            divide_by_zero: DivideByZeroPolicy::Fail,
        }
    }
}

impl ConfigSection for FitnessConfig {
    fn section_name() -> &'static str {
        "fitness"
    }

    fn validate(&self) -> Result<()> {
        if !(self.antagonist_threshold_multiplier >= 1.0) {
            return Err(CoevoError::InvalidConfiguration(format!(
                "Antagonist threshold multiplier must be at least 1, got {}",
                self.antagonist_threshold_multiplier
            )));
        }
        if !(self.protagonist_threshold_multiplier >= 1.0) {
            return Err(CoevoError::InvalidConfiguration(format!(
                "Protagonist threshold multiplier must be at least 1, got {}",
                self.protagonist_threshold_multiplier
            )));
        }
        if let DivideByZeroPolicy::Penalize { fitness } = self.divide_by_zero {
            if !fitness.is_finite() {
                return Err(CoevoError::InvalidConfiguration(
                    "Penalty fitness must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_below_one_is_rejected() {
        let config = FitnessConfig {
            protagonist_threshold_multiplier: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(FitnessConfig::default().validate().is_ok());
    }
}
