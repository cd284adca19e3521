use super::traits::ConfigSection;
use crate::error::{CoevoError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub generations: usize,
    pub crossover_probability: f64,
    pub mutation_probability: f64,
    pub parent_selection: ParentSelection,
    pub crossover: CrossoverStrategy,
    pub survivor_selection: SurvivorSelection,
    pub max_tree_depth: usize,
    pub seed: Option<u64>,
    pub early_termination: Option<EarlyTerminationConfig>,
    /// Run the epochs of a generation on the rayon pool.
    pub parallel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum ParentSelection {
    Tournament { size: usize },
    Elitism { fraction: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme")]
pub enum CrossoverStrategy {
    SinglePoint,
    /// Cut at `fraction` of the shorter genome.
    FixedPoint { fraction: f64 },
    KPoint { k: usize },
    Uniform { swap_probability: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurvivorSelection {
    FitnessBased,
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyTerminationConfig {
    /// Never stop before this many generations have completed.
    pub min_generations: usize,
    /// Number of recent generations averaged.
    pub window: usize,
    pub protagonist_fitness_target: f64,
    pub protagonist_delta_target: Option<f64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            generations: 50,
            crossover_probability: 0.7,
            mutation_probability: 0.1,
            parent_selection: ParentSelection::Tournament { size: 3 },
            crossover: CrossoverStrategy::SinglePoint,
            survivor_selection: SurvivorSelection::FitnessBased,
            max_tree_depth: 8,
            seed: None,
            early_termination: None,
            parallel: true,
        }
    }
}

fn probability(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CoevoError::InvalidConfiguration(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )));
    }
    Ok(())
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<()> {
        if self.generations == 0 {
            return Err(CoevoError::InvalidConfiguration(
                "Generation count must be at least 1".to_string(),
            ));
        }
        probability("Crossover probability", self.crossover_probability)?;
        probability("Mutation probability", self.mutation_probability)?;

        match self.parent_selection {
            ParentSelection::Tournament { size } if size == 0 => {
                return Err(CoevoError::InvalidConfiguration(
                    "Tournament size must be at least 1".to_string(),
                ));
            }
            ParentSelection::Elitism { fraction } if fraction <= 0.0 || fraction > 1.0 => {
                return Err(CoevoError::InvalidConfiguration(format!(
                    "Elitism fraction must be in (0, 1], got {}",
                    fraction
                )));
            }
            _ => {}
        }

        match self.crossover {
            CrossoverStrategy::FixedPoint { fraction } => probability("Crossover fraction", fraction)?,
            CrossoverStrategy::KPoint { k } if k == 0 => {
                return Err(CoevoError::InvalidConfiguration(
                    "K-point crossover needs at least one cut".to_string(),
                ));
            }
            CrossoverStrategy::Uniform { swap_probability } => {
                probability("Uniform swap probability", swap_probability)?
            }
            _ => {}
        }

        if let Some(early) = &self.early_termination {
            if early.window == 0 {
                return Err(CoevoError::InvalidConfiguration(
                    "Early termination window must be at least 1".to_string(),
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
    fn test_default_is_valid() {
        assert!(EvolutionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_probabilities() {
        let config = EvolutionConfig {
            mutation_probability: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_tournament() {
        let config = EvolutionConfig {
            parent_selection: ParentSelection::Tournament { size: 0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EvolutionConfig {
            parent_selection: ParentSelection::Elitism { fraction: 0.0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
