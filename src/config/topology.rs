use super::traits::ConfigSection;
use crate::error::{CoevoError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TopologyConfig {
    RoundRobin,
    SingleEliminationTournament,
    HallOfFame {
        /// Reinsert archived champions every this many generations.
        return_rounds: usize,
        sample_size: usize,
        archive_size: usize,
    },
    KRandom {
        k: usize,
    },
}

impl Default for TopologyConfig {
    fn default() -> Self {
        TopologyConfig::RoundRobin
    }
}

impl ConfigSection for TopologyConfig {
    fn section_name() -> &'static str {
        "topology"
    }

    fn validate(&self) -> Result<()> {
        match self {
            TopologyConfig::RoundRobin | TopologyConfig::SingleEliminationTournament => Ok(()),
            TopologyConfig::HallOfFame {
                return_rounds,
                sample_size,
                archive_size,
            } => {
                if *return_rounds == 0 || *sample_size == 0 || *archive_size == 0 {
                    return Err(CoevoError::InvalidConfiguration(
                        "Hall of fame rounds, sample and archive sizes must be at least 1"
                            .to_string(),
                    ));
                }
                Ok(())
            }
            TopologyConfig::KRandom { k } => {
                if *k == 0 {
                    return Err(CoevoError::InvalidConfiguration(
                        "KRandom needs k of at least 1".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}
