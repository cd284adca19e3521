use crate::engines::evaluation::resolver::BestChildResolver;
use crate::engines::generation::epoch::{play_epochs, record_outcomes, CompetitionContext, EpochOutcome};
use crate::engines::generation::lifecycle::Generation;
use crate::error::{CoevoError, Result};
use rand::seq::index::sample;
use rand::Rng;

/// Each protagonist faces `min(k, antagonists)` distinct antagonists.
///
/// Antagonists that are never drawn keep their previous history.
pub fn compete<R: Rng + ?Sized>(
    generation: &mut Generation,
    k: usize,
    ctx: &CompetitionContext<'_>,
    resolver: &mut BestChildResolver,
    rng: &mut R,
) -> Result<Vec<EpochOutcome>> {
    let antagonists = generation.antagonists.len();
    if antagonists == 0 || k == 0 {
        return Err(CoevoError::SelectionFailure(format!(
            "cannot draw {} opponents from {} antagonists",
            k, antagonists
        )));
    }
    let amount = k.min(antagonists);

    let mut pairs = Vec::with_capacity(generation.protagonists.len() * amount);
    for p in 0..generation.protagonists.len() {
        pairs.extend(sample(rng, antagonists, amount).into_iter().map(|a| (a, p)));
    }

    let outcomes = play_epochs(generation, &pairs, ctx, rng)?;
    record_outcomes(generation, &outcomes, resolver);
    Ok(outcomes)
}
