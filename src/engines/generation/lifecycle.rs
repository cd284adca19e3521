use crate::config::AppConfig;
use crate::engines::evaluation::program::Program;
use crate::engines::evaluation::resolver::BestChildResolver;
use crate::engines::generation::epoch::{CompetitionContext, EpochOutcome};
use crate::engines::generation::individual::Individual;
use crate::engines::generation::reproduction::reproduce;
use crate::engines::metrics::statistics::{correlation, covariance, Statistics};
use crate::error::{CoevoError, Result};
use crate::types::Role;
use rand::Rng;

/// What a generation's competition produced, captured before reproduction.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub generation: usize,
    pub epochs: usize,
    /// Snapshots taken after the best child trees were installed.
    pub best_antagonist: Individual,
    pub best_protagonist: Individual,
    /// Moments of the average fitness of every individual that competed.
    pub antagonist_fitness: Statistics,
    pub protagonist_fitness: Statistics,
    /// Mean over the finite epoch deltas.
    pub antagonist_delta: f64,
    pub protagonist_delta: f64,
    /// Between antagonist and protagonist fitness of the same epoch.
    pub covariance: f64,
    pub correlation: f64,
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub id: usize,
    pub antagonists: Vec<Individual>,
    pub protagonists: Vec<Individual>,
    /// Summary of the competition that produced this generation.
    pub summary: Option<GenerationSummary>,
}

fn mean_finite(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::INFINITY
    } else {
        sum / count as f64
    }
}

impl Generation {
    pub fn new(id: usize, antagonists: Vec<Individual>, protagonists: Vec<Individual>) -> Self {
        Self {
            id,
            antagonists,
            protagonists,
            summary: None,
        }
    }

    /// Generation 0: random genomes drawn from each role's pool.
    pub fn initial<R: Rng + ?Sized>(config: &AppConfig, start: &Program, rng: &mut R) -> Result<Self> {
        let populate = |role: Role, rng: &mut R| -> Result<Vec<Individual>> {
            let params = match role {
                Role::Antagonist => &config.antagonist,
                Role::Protagonist => &config.protagonist,
            };
            (0..params.population_size)
                .map(|_| {
                    Individual::random(
                        role,
                        start,
                        &params.strategies,
                        params.strategy_count,
                        0,
                        rng,
                    )
                })
                .collect()
        };

        let antagonists = populate(Role::Antagonist, rng)?;
        let protagonists = populate(Role::Protagonist, rng)?;
        Ok(Self::new(0, antagonists, protagonists))
    }

    pub fn population(&self, role: Role) -> &[Individual] {
        match role {
            Role::Antagonist => &self.antagonists,
            Role::Protagonist => &self.protagonists,
        }
    }

    pub fn population_mut(&mut self, role: Role) -> &mut Vec<Individual> {
        match role {
            Role::Antagonist => &mut self.antagonists,
            Role::Protagonist => &mut self.protagonists,
        }
    }

    /// Resets every tree to the start program; genomes and histories survive.
    pub fn cleanse(&mut self, start: &Program) {
        for individual in self.antagonists.iter_mut().chain(self.protagonists.iter_mut()) {
            individual.cleanse(start);
        }
    }

    /// Highest average fitness, lower average delta on ties, first on full ties.
    /// Only individuals that competed are considered when any did.
    pub fn best(&self, role: Role) -> Option<&Individual> {
        let population = self.population(role);
        let competed: Vec<&Individual> = population.iter().filter(|i| i.has_competed()).collect();
        let candidates = if competed.is_empty() {
            population.iter().collect()
        } else {
            competed
        };

        let mut best: Option<&Individual> = None;
        for candidate in candidates {
            best = match best {
                None => Some(candidate),
                Some(current) => {
                    let fitter = candidate.average_fitness() > current.average_fitness();
                    let tie_breaks = candidate.average_fitness() == current.average_fitness()
                        && candidate.average_delta() < current.average_delta();
                    if fitter || tie_breaks {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best
    }

    /// Aggregates the competition; the four independent aggregates run on the rayon pool.
    pub fn summarize(&self, outcomes: &[EpochOutcome]) -> Result<GenerationSummary> {
        let best_antagonist = self
            .best(Role::Antagonist)
            .ok_or_else(|| CoevoError::SelectionFailure("no antagonists".to_string()))?
            .clone();
        let best_protagonist = self
            .best(Role::Protagonist)
            .ok_or_else(|| CoevoError::SelectionFailure("no protagonists".to_string()))?
            .clone();

        let averages = |population: &[Individual]| -> Vec<f64> {
            population
                .iter()
                .filter(|i| i.has_competed())
                .map(|i| i.average_fitness())
                .collect()
        };
        let antagonist_averages = averages(&self.antagonists);
        let protagonist_averages = averages(&self.protagonists);
        let antagonist_epochs: Vec<f64> =
            outcomes.iter().map(|o| o.fitness.antagonist_fitness).collect();
        let protagonist_epochs: Vec<f64> =
            outcomes.iter().map(|o| o.fitness.protagonist_fitness).collect();

        let ((antagonist_fitness, protagonist_fitness), ((antagonist_delta, protagonist_delta), (cov, corr))) =
            rayon::join(
                || {
                    rayon::join(
                        || Statistics::calculate(&antagonist_averages),
                        || Statistics::calculate(&protagonist_averages),
                    )
                },
                || {
                    rayon::join(
                        || {
                            (
                                mean_finite(outcomes.iter().map(|o| o.fitness.antagonist_delta)),
                                mean_finite(outcomes.iter().map(|o| o.fitness.protagonist_delta)),
                            )
                        },
                        || {
                            (
                                covariance(&antagonist_epochs, &protagonist_epochs),
                                correlation(&antagonist_epochs, &protagonist_epochs),
                            )
                        },
                    )
                },
            );

        Ok(GenerationSummary {
            generation: self.id,
            epochs: outcomes.len(),
            best_antagonist,
            best_protagonist,
            antagonist_fitness,
            protagonist_fitness,
            antagonist_delta,
            protagonist_delta,
            covariance: cov,
            correlation: corr,
        })
    }

    /// Installs the best child trees, summarizes, and reproduces both sides
    /// into generation `id + 1`.
    pub fn advance<R: Rng + ?Sized>(
        mut self,
        outcomes: &[EpochOutcome],
        resolver: &BestChildResolver,
        ctx: &CompetitionContext<'_>,
        rng: &mut R,
    ) -> Result<Generation> {
        resolver.install(&mut self.antagonists);
        resolver.install(&mut self.protagonists);

        let summary = self.summarize(outcomes)?;

        let config = ctx.config;
        let antagonists = reproduce(
            &self.antagonists,
            &config.antagonist,
            &config.evolution,
            ctx.vocabulary,
            self.id,
            rng,
        )?;
        let protagonists = reproduce(
            &self.protagonists,
            &config.protagonist,
            &config.evolution,
            ctx.vocabulary,
            self.id,
            rng,
        )?;

        let mut next = Generation::new(self.id + 1, antagonists, protagonists);
        next.summary = Some(summary);
        Ok(next)
    }
}
