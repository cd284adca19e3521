//! Single-elimination brackets.
//!
//! The antagonist bracket runs first: each match pits two antagonists against
//! the same randomly drawn protagonist, and the one with the higher epoch
//! fitness advances (the first slot on ties, a lone last contender gets a
//! bye). The protagonist bracket then runs the same way against the winning
//! antagonist, whose best tree from its bracket is fixed as the adversary for
//! every protagonist epoch.

use crate::engines::evaluation::resolver::BestChildResolver;
use crate::engines::generation::epoch::{
    play_epochs_against, record_outcomes, CompetitionContext, EpochOutcome,
};
use crate::engines::generation::lifecycle::Generation;
use crate::engines::generation::tree::DualTree;
use crate::error::{CoevoError, Result};
use crate::types::Role;
use log::debug;
use rand::Rng;

/// Who a bracket's contenders play against.
#[derive(Debug, Clone, Copy)]
enum Opponent<'t> {
    /// A fresh random member of the other population for every match.
    Random,
    Fixed { index: usize, tree: &'t DualTree },
}

pub fn compete<R: Rng + ?Sized>(
    generation: &mut Generation,
    ctx: &CompetitionContext<'_>,
    resolver: &mut BestChildResolver,
    rng: &mut R,
) -> Result<Vec<EpochOutcome>> {
    let mut outcomes = Vec::new();
    let antagonist = bracket(
        generation,
        Role::Antagonist,
        Opponent::Random,
        ctx,
        resolver,
        rng,
        &mut outcomes,
    )?;
    let adversary = generation
        .antagonists
        .get(antagonist)
        .and_then(|winner| resolver.get(winner.id))
        .map(|child| child.tree.clone())
        .ok_or_else(|| {
            CoevoError::SelectionFailure("antagonist bracket winner has no tree".to_string())
        })?;
    let protagonist = bracket(
        generation,
        Role::Protagonist,
        Opponent::Fixed {
            index: antagonist,
            tree: &adversary,
        },
        ctx,
        resolver,
        rng,
        &mut outcomes,
    )?;
    debug!(
        "generation {}: bracket winners antagonist #{} protagonist #{}",
        generation.id, antagonist, protagonist
    );
    Ok(outcomes)
}

/// Runs one bracket to completion and returns the winner's index.
fn bracket<R: Rng + ?Sized>(
    generation: &mut Generation,
    role: Role,
    opponent: Opponent<'_>,
    ctx: &CompetitionContext<'_>,
    resolver: &mut BestChildResolver,
    rng: &mut R,
    outcomes: &mut Vec<EpochOutcome>,
) -> Result<usize> {
    let opponents = match role {
        Role::Antagonist => generation.protagonists.len(),
        Role::Protagonist => generation.antagonists.len(),
    };
    let mut contenders: Vec<usize> = (0..generation.population(role).len()).collect();
    if contenders.len() < 2 || opponents == 0 {
        return Err(CoevoError::SelectionFailure(format!(
            "{} bracket needs two contenders and an opponent, got {} and {}",
            role,
            contenders.len(),
            opponents
        )));
    }

    let mut round = 0;
    while contenders.len() > 1 {
        let mut pairs = Vec::with_capacity(contenders.len());
        for fixture in contenders.chunks(2) {
            if let [first, second] = fixture {
                let against = match opponent {
                    Opponent::Random => rng.gen_range(0..opponents),
                    Opponent::Fixed { index, .. } => index,
                };
                pairs.push(pairing(role, *first, against));
                pairs.push(pairing(role, *second, against));
            }
        }

        let adversary = match opponent {
            Opponent::Random => None,
            Opponent::Fixed { tree, .. } => Some(tree),
        };
        let played = play_epochs_against(generation, &pairs, adversary, ctx, rng)?;
        record_outcomes(generation, &played, resolver);

        let mut advancing = Vec::with_capacity(contenders.len() / 2 + 1);
        for (fixture, results) in contenders.chunks(2).zip(played.chunks(2)) {
            if let ([first, second], [first_result, second_result]) = (fixture, results) {
                let first_fitness = fitness_of(role, first_result);
                let second_fitness = fitness_of(role, second_result);
                advancing.push(if second_fitness > first_fitness {
                    *second
                } else {
                    *first
                });
            }
        }
        if contenders.len() % 2 == 1 {
            if let Some(&bye) = contenders.last() {
                advancing.push(bye);
            }
        }

        debug!(
            "{} bracket round {}: {} -> {} contenders",
            role,
            round,
            contenders.len(),
            advancing.len()
        );
        outcomes.extend(played);
        contenders = advancing;
        round += 1;
    }

    contenders
        .first()
        .copied()
        .ok_or_else(|| CoevoError::SelectionFailure(format!("{} bracket has no winner", role)))
}

fn pairing(role: Role, contender: usize, opponent: usize) -> (usize, usize) {
    match role {
        Role::Antagonist => (contender, opponent),
        Role::Protagonist => (opponent, contender),
    }
}

fn fitness_of(role: Role, outcome: &EpochOutcome) -> f64 {
    match role {
        Role::Antagonist => outcome.fitness.antagonist_fitness,
        Role::Protagonist => outcome.fitness.protagonist_fitness,
    }
}
