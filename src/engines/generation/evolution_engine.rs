use crate::config::{AppConfig, EarlyTerminationConfig};
use crate::data::Specification;
use crate::engines::evaluation::expression::{self, ArithmeticEvaluator, Evaluator};
use crate::engines::evaluation::program::Program;
use crate::engines::generation::epoch::CompetitionContext;
use crate::engines::generation::individual::Individual;
use crate::engines::generation::lifecycle::{Generation, GenerationSummary};
use crate::engines::generation::strategy::Vocabulary;
use crate::engines::generation::topology::Topology;
use crate::engines::metrics::record::{GenerationRecord, StatisticsSink};
use crate::error::{CoevoError, Result};
use crate::types::{SymbolicExpression, TerminationReason};
use chrono::{DateTime, Utc};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_competition_complete(&mut self, generation: usize, epochs: usize);
    fn on_generation_complete(&mut self, record: &GenerationRecord);
}

impl<T: ProgressCallback + ?Sized> ProgressCallback for &mut T {
    fn on_generation_start(&mut self, generation: usize) {
        (**self).on_generation_start(generation);
    }

    fn on_competition_complete(&mut self, generation: usize, epochs: usize) {
        (**self).on_competition_complete(generation, epochs);
    }

    fn on_generation_complete(&mut self, record: &GenerationRecord) {
        (**self).on_generation_complete(record);
    }
}

pub struct EvolutionEngine {
    config: AppConfig,
    specification: Specification,
    evaluator: Box<dyn Evaluator>,
    vocabulary: Vocabulary,
    start: Program,
    topology: Topology,
    rng: StdRng,
    best_antagonist: Option<Individual>,
    best_protagonist: Option<Individual>,
}

/// Outcome of [`EvolutionEngine::run`].
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    pub records: Vec<GenerationRecord>,
    /// Survivors after the last completed generation.
    pub final_generation: Generation,
    pub best_antagonist: Option<Individual>,
    pub best_protagonist: Option<Individual>,
    pub termination: TerminationReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Serializable digest of an [`EvolutionResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub topology: String,
    pub generations_run: usize,
    pub termination: TerminationReason,
    pub best_antagonist_equation: Option<String>,
    pub best_antagonist_fitness: Option<f64>,
    pub best_protagonist_equation: Option<String>,
    pub best_protagonist_fitness: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl EvolutionResult {
    pub fn generations_run(&self) -> usize {
        self.records.len()
    }

    pub fn report(&self, topology: &str) -> RunReport {
        let equation = |individual: &Option<Individual>| {
            individual
                .as_ref()
                .and_then(|i| i.program.expression().ok())
        };
        RunReport {
            topology: topology.to_string(),
            generations_run: self.generations_run(),
            termination: self.termination,
            best_antagonist_equation: equation(&self.best_antagonist),
            best_antagonist_fitness: self.best_antagonist.as_ref().map(|i| i.best_fitness),
            best_protagonist_equation: equation(&self.best_protagonist),
            best_protagonist_fitness: self.best_protagonist.as_ref().map(|i| i.best_fitness),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

impl EvolutionEngine {
    /// Validates the configuration and prepares the start program. Nothing
    /// runs until [`EvolutionEngine::run`].
    pub fn new(
        config: AppConfig,
        specification: Specification,
        evaluator: Box<dyn Evaluator>,
    ) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.evolution.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let vocabulary = config
            .expressions
            .vocabulary(config.evolution.max_tree_depth)?;
        let start = config.expressions.start_program(&vocabulary, &mut rng)?;
        start.tree.validate()?;
        let start_depth = start.tree.depth()?;
        if start_depth > config.evolution.max_tree_depth {
            return Err(CoevoError::InvalidConfiguration(format!(
                "Start program depth {} exceeds max tree depth {}",
                start_depth, config.evolution.max_tree_depth
            )));
        }

        let start_symbols = start
            .tree
            .preorder()
            .into_iter()
            .filter_map(|id| start.tree.node(id))
            .map(|node| &node.expression);
        check_symbols(
            vocabulary
                .terminals
                .iter()
                .chain(&vocabulary.non_terminals)
                .chain(start_symbols),
            &specification,
        )?;

        let topology = Topology::from_config(&config.topology);

        Ok(Self {
            config,
            specification,
            evaluator,
            vocabulary,
            start,
            topology,
            rng,
            best_antagonist: None,
            best_protagonist: None,
        })
    }

    /// Builds or loads the specification from the configuration with the
    /// default evaluator.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let evaluator = ArithmeticEvaluator::new();
        let specification =
            Specification::from_config(&config.specification, &config.fitness, &evaluator)?;
        Self::new(config, specification, Box::new(evaluator))
    }

    pub fn start_program(&self) -> &Program {
        &self.start
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Run the evolution process
    pub fn run<C: ProgressCallback, S: StatisticsSink + ?Sized>(
        &mut self,
        mut callback: C,
        sink: &mut S,
    ) -> Result<EvolutionResult> {
        let started_at = Utc::now();
        info!(
            "Starting {} run: {} generations, {} antagonists, {} protagonists",
            self.topology.name(),
            self.config.evolution.generations,
            self.config.antagonist.population_size,
            self.config.protagonist.population_size
        );

        let mut generation = Generation::initial(&self.config, &self.start, &mut self.rng)?;
        let mut records: Vec<GenerationRecord> = Vec::new();
        let mut termination = TerminationReason::MaxGenerations;

        for _ in 0..self.config.evolution.generations {
            callback.on_generation_start(generation.id);
            generation.cleanse(&self.start);

            let ctx = CompetitionContext {
                config: &self.config,
                specification: &self.specification,
                evaluator: self.evaluator.as_ref(),
                vocabulary: &self.vocabulary,
                start: &self.start,
            };
            let next = self.topology.run(generation, &ctx, &mut self.rng)?;

            let summary = next.summary.as_ref().ok_or_else(|| {
                CoevoError::SelectionFailure("topology produced no summary".to_string())
            })?;
            callback.on_competition_complete(summary.generation, summary.epochs);
            Self::track_best(&mut self.best_antagonist, &mut self.best_protagonist, summary);

            let record = GenerationRecord::from_summary(summary)?;
            sink.write(&record)?;
            info!(
                "Generation {}: antagonist {:.4} / delta {:.4}, protagonist {:.4} / delta {:.4}",
                record.generation,
                record.antagonist.average_fitness,
                summary.antagonist_delta,
                record.protagonist.average_fitness,
                summary.protagonist_delta
            );
            callback.on_generation_complete(&record);
            records.push(record);
            generation = next;

            if let Some(early) = &self.config.evolution.early_termination {
                if early_termination_reached(early, &records) {
                    info!("Early termination after {} generations", records.len());
                    termination = TerminationReason::EarlyTermination;
                    break;
                }
            }
        }

        sink.flush()?;

        Ok(EvolutionResult {
            records,
            final_generation: generation,
            best_antagonist: self.best_antagonist.clone(),
            best_protagonist: self.best_protagonist.clone(),
            termination,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn track_best(
        best_antagonist: &mut Option<Individual>,
        best_protagonist: &mut Option<Individual>,
        summary: &GenerationSummary,
    ) {
        for (best, candidate) in [
            (best_antagonist, &summary.best_antagonist),
            (best_protagonist, &summary.best_protagonist),
        ] {
            let replace = match best {
                None => true,
                Some(current) => candidate.best_fitness > current.best_fitness,
            };
            if replace {
                *best = Some(candidate.clone());
            }
        }
    }
}

/// True once more than `min_generations` have completed and the mean
/// protagonist fitness over the last `window` generations reaches the target,
/// along with the mean protagonist delta when a delta target is set.
pub fn early_termination_reached(config: &EarlyTerminationConfig, records: &[GenerationRecord]) -> bool {
    if records.len() <= config.min_generations || config.window == 0 || records.len() < config.window {
        return false;
    }

    let recent = &records[records.len() - config.window..];
    let count = recent.len() as f64;
    let mean_fitness = recent
        .iter()
        .map(|r| r.protagonist.average_fitness)
        .sum::<f64>()
        / count;
    if mean_fitness < config.protagonist_fitness_target {
        return false;
    }

    match config.protagonist_delta_target {
        Some(target) => {
            let mean_delta = recent
                .iter()
                .map(|r| r.protagonist.average_delta)
                .sum::<f64>()
                / count;
            mean_delta <= target
        }
        None => true,
    }
}

/// Every operator must be one the evaluator applies at its arity, and every
/// variable must be bound in every pairing.
fn check_symbols<'a>(
    symbols: impl IntoIterator<Item = &'a SymbolicExpression>,
    specification: &Specification,
) -> Result<()> {
    for symbol in symbols {
        if !symbol.is_terminal() {
            if !expression::supports(&symbol.value, symbol.arity) {
                return Err(CoevoError::InvalidConfiguration(format!(
                    "Unsupported operator {} with arity {}",
                    symbol.value, symbol.arity
                )));
            }
        } else if !symbol.is_constant()
            && !specification
                .pairings()
                .iter()
                .all(|pairing| pairing.bindings.contains_key(&symbol.value))
        {
            return Err(CoevoError::InvalidConfiguration(format!(
                "Variable {} is not bound by the specification",
                symbol.value
            )));
        }
    }
    Ok(())
}
