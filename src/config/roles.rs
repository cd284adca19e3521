use super::traits::ConfigSection;
use crate::engines::generation::strategy::Strategy;
use crate::error::{CoevoError, Result};
use serde::{Deserialize, Serialize};

/// Population and operator pool of one side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    pub population_size: usize,
    /// Operators an individual's genome is drawn from.
    pub strategies: Vec<Strategy>,
    /// Genome length.
    pub strategy_count: usize,
}

impl RoleConfig {
    pub fn antagonist() -> Self {
        Self {
            population_size: 10,
            strategies: vec![
                Strategy::MutateTerminal,
                Strategy::MutateNonTerminal,
                Strategy::DeleteTerminal,
                Strategy::DeleteMalicious,
                Strategy::AddSubTree,
            ],
            strategy_count: 3,
        }
    }

    pub fn protagonist() -> Self {
        Self {
            population_size: 10,
            strategies: vec![
                Strategy::Skip,
                Strategy::MutateTerminal,
                Strategy::MutateNonTerminal,
                Strategy::DeleteNonTerminal,
                Strategy::ReplaceBranch,
                Strategy::AddToLeaf,
            ],
            strategy_count: 3,
        }
    }
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self::antagonist()
    }
}

impl ConfigSection for RoleConfig {
    fn section_name() -> &'static str {
        "role"
    }

    fn validate(&self) -> Result<()> {
        if self.population_size < 2 || self.population_size % 2 != 0 {
            return Err(CoevoError::InvalidConfiguration(format!(
                "Population size must be even and at least 2, got {}",
                self.population_size
            )));
        }
        if self.strategies.is_empty() {
            return Err(CoevoError::InvalidConfiguration(
                "Strategy pool must not be empty".to_string(),
            ));
        }
        if self.strategy_count == 0 {
            return Err(CoevoError::InvalidConfiguration(
                "Strategy count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odd_population_is_rejected() {
        let config = RoleConfig {
            population_size: 7,
            ..RoleConfig::protagonist()
        };
        assert!(matches!(
            config.validate(),
            Err(CoevoError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        let config = RoleConfig {
            strategies: vec![],
            ..RoleConfig::antagonist()
        };
        assert!(config.validate().is_err());
    }
}
