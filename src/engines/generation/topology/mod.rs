//! Competition topologies: who plays whom within a generation.

pub mod elimination;
pub mod hall_of_fame;
pub mod k_random;
pub mod round_robin;

pub use hall_of_fame::HallOfFameTopology;

use crate::config::TopologyConfig;
use crate::engines::evaluation::resolver::BestChildResolver;
use crate::engines::generation::epoch::CompetitionContext;
use crate::engines::generation::lifecycle::Generation;
use crate::error::Result;
use rand::Rng;

pub enum Topology {
    RoundRobin,
    SingleEliminationTournament,
    HallOfFame(HallOfFameTopology),
    KRandom { k: usize },
}

impl Topology {
    pub fn from_config(config: &TopologyConfig) -> Self {
        match config {
            TopologyConfig::RoundRobin => Topology::RoundRobin,
            TopologyConfig::SingleEliminationTournament => Topology::SingleEliminationTournament,
            TopologyConfig::HallOfFame {
                return_rounds,
                sample_size,
                archive_size,
            } => Topology::HallOfFame(HallOfFameTopology::new(
                *return_rounds,
                *sample_size,
                *archive_size,
            )),
            TopologyConfig::KRandom { k } => Topology::KRandom { k: *k },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Topology::RoundRobin => "RoundRobin",
            Topology::SingleEliminationTournament => "SingleEliminationTournament",
            Topology::HallOfFame(_) => "HallOfFame",
            Topology::KRandom { .. } => "KRandom",
        }
    }

    /// Runs the competition phase on `current` and returns the next generation,
    /// which carries the survivors and the summary of this competition.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        mut current: Generation,
        ctx: &CompetitionContext<'_>,
        rng: &mut R,
    ) -> Result<Generation> {
        let mut resolver = BestChildResolver::new();

        let outcomes = match self {
            Topology::RoundRobin => round_robin::compete(&mut current, ctx, &mut resolver, rng)?,
            Topology::SingleEliminationTournament => {
                elimination::compete(&mut current, ctx, &mut resolver, rng)?
            }
            Topology::HallOfFame(topology) => {
                topology.compete(&mut current, ctx, &mut resolver, rng)?
            }
            Topology::KRandom { k } => {
                k_random::compete(&mut current, *k, ctx, &mut resolver, rng)?
            }
        };

        let next = current.advance(&outcomes, &resolver, ctx, rng)?;

        if let Topology::HallOfFame(topology) = self {
            topology.record(&next);
        }
        Ok(next)
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    use crate::config::{AppConfig, SpecificationConfig};
    use crate::data::Specification;
    use crate::engines::evaluation::expression::ArithmeticEvaluator;
    use crate::engines::evaluation::program::Program;
    use crate::engines::generation::epoch::CompetitionContext;
    use crate::engines::generation::individual::Individual;
    use crate::engines::generation::lifecycle::Generation;
    use crate::engines::generation::strategy::{Strategy, Vocabulary};
    use crate::engines::generation::tree::DualTree;
    use crate::types::{Role, SymbolicExpression};

    /// Target `x` over x = 0..4, start program `x`, default vocabulary.
    pub struct Fixture {
        pub config: AppConfig,
        pub specification: Specification,
        pub evaluator: ArithmeticEvaluator,
        pub vocabulary: Vocabulary,
        pub start: Program,
    }

    impl Fixture {
        pub fn new() -> Self {
            let mut config = AppConfig::default();
            config.evolution.parallel = false;
            config.antagonist.population_size = 4;
            config.protagonist.population_size = 4;
            config.specification = SpecificationConfig {
                expression: "x".to_string(),
                variable: "x".to_string(),
                range: 5,
                seed: 0.0,
                path: None,
            };
            let evaluator = ArithmeticEvaluator::new();
            let specification =
                Specification::generate(&config.specification, &config.fitness, &evaluator).unwrap();
            let vocabulary = config
                .expressions
                .vocabulary(config.evolution.max_tree_depth)
                .unwrap();
            let start = Program::new(DualTree::leaf(SymbolicExpression::terminal("x")));
            Self {
                config,
                specification,
                evaluator,
                vocabulary,
                start,
            }
        }

        pub fn ctx(&self) -> CompetitionContext<'_> {
            CompetitionContext {
                config: &self.config,
                specification: &self.specification,
                evaluator: &self.evaluator,
                vocabulary: &self.vocabulary,
                start: &self.start,
            }
        }

        pub fn individual(&self, role: Role, strategies: &[Strategy]) -> Individual {
            Individual::new(role, self.start.clone(), strategies.to_vec(), 0)
        }

        pub fn generation(
            &self,
            id: usize,
            antagonists: &[&[Strategy]],
            protagonists: &[&[Strategy]],
        ) -> Generation {
            Generation::new(
                id,
                antagonists
                    .iter()
                    .map(|s| self.individual(Role::Antagonist, s))
                    .collect(),
                protagonists
                    .iter()
                    .map(|s| self.individual(Role::Protagonist, s))
                    .collect(),
            )
        }
    }
}
