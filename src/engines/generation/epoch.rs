use crate::config::AppConfig;
use crate::data::Specification;
use crate::engines::evaluation::expression::Evaluator;
use crate::engines::evaluation::fitness::FitnessOutcome;
use crate::engines::evaluation::program::Program;
use crate::engines::evaluation::resolver::BestChildResolver;
use crate::engines::generation::lifecycle::Generation;
use crate::engines::generation::individual::Individual;
use crate::engines::generation::strategy::{apply_all, Vocabulary};
use crate::engines::generation::tree::DualTree;
use crate::error::{CoevoError, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Everything an epoch reads; shared by reference across worker threads.
pub struct CompetitionContext<'a> {
    pub config: &'a AppConfig,
    pub specification: &'a Specification,
    pub evaluator: &'a dyn Evaluator,
    pub vocabulary: &'a Vocabulary,
    /// Program every epoch starts from.
    pub start: &'a Program,
}

/// One scored competition between an antagonist and a protagonist.
pub struct Epoch<'a> {
    pub antagonist: &'a Individual,
    pub protagonist: &'a Individual,
    /// Fixed corrupted tree; when set the antagonist's strategies are not replayed.
    pub adversary: Option<&'a DualTree>,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct EpochOutcome {
    /// Index into the generation's antagonists.
    pub antagonist: usize,
    /// Index into the generation's protagonists.
    pub protagonist: usize,
    pub antagonist_id: u64,
    pub protagonist_id: u64,
    pub fitness: FitnessOutcome,
    pub antagonist_tree: DualTree,
    pub protagonist_tree: DualTree,
}

impl<'a> Epoch<'a> {
    /// The antagonist's strategies corrupt a copy of the start program (or the
    /// adversary tree is taken as is); the protagonist's strategies then act
    /// on the corrupted tree. Both trees are scored against the specification.
    ///
    /// Any failure to apply a strategy is returned, aborting the generation.
    pub fn play(&self, ctx: &CompetitionContext<'_>) -> Result<(FitnessOutcome, DualTree, DualTree)> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut tree = match self.adversary {
            Some(adversary) => adversary.clone(),
            None => {
                let mut tree = ctx.start.tree.clone();
                apply_all(&self.antagonist.strategies, &mut tree, ctx.vocabulary, &mut rng)?;
                tree
            }
        };
        let antagonist_tree = tree.clone();

        apply_all(&self.protagonist.strategies, &mut tree, ctx.vocabulary, &mut rng)?;
        let protagonist_tree = tree;

        let fitness = ctx.config.fitness.strategy.evaluate(
            ctx.specification.pairings(),
            &Program::new(antagonist_tree.clone()),
            &Program::new(protagonist_tree.clone()),
            ctx.evaluator,
            ctx.config.fitness.divide_by_zero,
        )?;

        Ok((fitness, antagonist_tree, protagonist_tree))
    }
}

/// Plays every `(antagonist, protagonist)` index pair.
///
/// Seeds are drawn from `rng` up front, so the outcome does not depend on
/// whether the epochs run on the rayon pool or sequentially. Outcomes come
/// back in `pairs` order.
pub fn play_epochs<R: Rng + ?Sized>(
    generation: &Generation,
    pairs: &[(usize, usize)],
    ctx: &CompetitionContext<'_>,
    rng: &mut R,
) -> Result<Vec<EpochOutcome>> {
    play_epochs_against(generation, pairs, None, ctx, rng)
}

/// [`play_epochs`] with every epoch starting from `adversary` when one is given.
pub fn play_epochs_against<R: Rng + ?Sized>(
    generation: &Generation,
    pairs: &[(usize, usize)],
    adversary: Option<&DualTree>,
    ctx: &CompetitionContext<'_>,
    rng: &mut R,
) -> Result<Vec<EpochOutcome>> {
    for &(a, p) in pairs {
        if a >= generation.antagonists.len() || p >= generation.protagonists.len() {
            return Err(CoevoError::SelectionFailure(format!(
                "pairing ({}, {}) is outside the populations",
                a, p
            )));
        }
    }

    let seeds: Vec<u64> = pairs.iter().map(|_| rng.gen()).collect();

    let run = |(&(a, p), &seed): (&(usize, usize), &u64)| -> Result<EpochOutcome> {
        let antagonist = &generation.antagonists[a];
        let protagonist = &generation.protagonists[p];
        let (fitness, antagonist_tree, protagonist_tree) = Epoch {
            antagonist,
            protagonist,
            adversary,
            seed,
        }
        .play(ctx)?;
        Ok(EpochOutcome {
            antagonist: a,
            protagonist: p,
            antagonist_id: antagonist.id,
            protagonist_id: protagonist.id,
            fitness,
            antagonist_tree,
            protagonist_tree,
        })
    };

    let outcomes = if ctx.config.evolution.parallel {
        pairs.par_iter().zip(seeds.par_iter()).map(run).collect::<Result<Vec<_>>>()?
    } else {
        pairs.iter().zip(seeds.iter()).map(run).collect::<Result<Vec<_>>>()?
    };

    debug!("generation {}: played {} epochs", generation.id, outcomes.len());
    Ok(outcomes)
}

/// Appends epoch results to both participants and offers their trees to the resolver.
pub fn record_outcomes(
    generation: &mut Generation,
    outcomes: &[EpochOutcome],
    resolver: &mut BestChildResolver,
) {
    for outcome in outcomes {
        let fitness = &outcome.fitness;
        generation.antagonists[outcome.antagonist]
            .record(fitness.antagonist_fitness, fitness.antagonist_delta);
        generation.protagonists[outcome.protagonist]
            .record(fitness.protagonist_fitness, fitness.protagonist_delta);

        resolver.offer(
            outcome.antagonist_id,
            &outcome.antagonist_tree,
            fitness.antagonist_fitness,
            fitness.antagonist_delta,
        );
        resolver.offer(
            outcome.protagonist_id,
            &outcome.protagonist_tree,
            fitness.protagonist_fitness,
            fitness.protagonist_delta,
        );
    }
}
