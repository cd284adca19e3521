use crate::engines::evaluation::resolver::BestChildResolver;
use crate::engines::generation::epoch::{play_epochs, record_outcomes, CompetitionContext, EpochOutcome};
use crate::engines::generation::lifecycle::Generation;
use crate::error::Result;
use rand::Rng;

/// Every antagonist against every protagonist.
pub fn compete<R: Rng + ?Sized>(
    generation: &mut Generation,
    ctx: &CompetitionContext<'_>,
    resolver: &mut BestChildResolver,
    rng: &mut R,
) -> Result<Vec<EpochOutcome>> {
    let pairs: Vec<(usize, usize)> = (0..generation.antagonists.len())
        .flat_map(|a| (0..generation.protagonists.len()).map(move |p| (a, p)))
        .collect();

    let outcomes = play_epochs(generation, &pairs, ctx, rng)?;
    record_outcomes(generation, &outcomes, resolver);
    Ok(outcomes)
}
