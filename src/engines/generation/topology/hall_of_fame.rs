use super::elimination;
use crate::engines::evaluation::resolver::BestChildResolver;
use crate::engines::generation::epoch::{CompetitionContext, EpochOutcome};
use crate::engines::generation::hall_of_fame::HallOfFame;
use crate::engines::generation::lifecycle::Generation;
use crate::error::Result;
use crate::types::Role;
use log::info;
use rand::seq::index::sample;
use rand::Rng;

/// Single elimination with periodic recall of archived champions.
pub struct HallOfFameTopology {
    pub return_rounds: usize,
    pub sample_size: usize,
    antagonists: HallOfFame,
    protagonists: HallOfFame,
}

impl HallOfFameTopology {
    pub fn new(return_rounds: usize, sample_size: usize, archive_size: usize) -> Self {
        Self {
            return_rounds,
            sample_size,
            antagonists: HallOfFame::new(archive_size),
            protagonists: HallOfFame::new(archive_size),
        }
    }

    pub fn archive(&self, role: Role) -> &HallOfFame {
        match role {
            Role::Antagonist => &self.antagonists,
            Role::Protagonist => &self.protagonists,
        }
    }

    /// Reinserts champions when the generation is due, then runs the brackets.
    pub fn compete<R: Rng + ?Sized>(
        &mut self,
        generation: &mut Generation,
        ctx: &CompetitionContext<'_>,
        resolver: &mut BestChildResolver,
        rng: &mut R,
    ) -> Result<Vec<EpochOutcome>> {
        if generation.id > 0 && generation.id % self.return_rounds == 0 {
            for role in [Role::Antagonist, Role::Protagonist] {
                let recalled = self.reinsert(generation, role, ctx, rng);
                if recalled > 0 {
                    info!(
                        "generation {}: recalled {} archived {}s",
                        generation.id, recalled, role
                    );
                }
            }
        }
        elimination::compete(generation, ctx, resolver, rng)
    }

    /// Archives the champions recorded in the summary of `next`.
    pub fn record(&mut self, next: &Generation) {
        if let Some(summary) = &next.summary {
            self.antagonists
                .try_add(&summary.best_antagonist, summary.generation);
            self.protagonists
                .try_add(&summary.best_protagonist, summary.generation);
        }
    }

    /// Replaces distinct random members of `role` with archived champions.
    fn reinsert<R: Rng + ?Sized>(
        &self,
        generation: &mut Generation,
        role: Role,
        ctx: &CompetitionContext<'_>,
        rng: &mut R,
    ) -> usize {
        let population = generation.population_mut(role);
        let amount = self.sample_size.min(population.len());
        let champions = self.archive(role).sample(amount, rng);
        let slots = sample(rng, population.len(), champions.len());

        for (slot, champion) in slots.into_iter().zip(&champions) {
            let mut recalled = champion.individual.duplicate();
            recalled.cleanse(ctx.start);
            population[slot] = recalled;
        }
        champions.len()
    }
}
