use crate::config::{CrossoverStrategy, SurvivorSelection};
use crate::engines::generation::genome::Genome;
use crate::engines::generation::individual::Individual;
use crate::engines::generation::strategy::{Strategy, Vocabulary};
use crate::engines::generation::tree::DualTree;
use crate::error::{CoevoError, Result};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;

fn by_fitness_desc(a: &Individual, b: &Individual) -> Ordering {
    b.average_fitness()
        .partial_cmp(&a.average_fitness())
        .unwrap_or(Ordering::Equal)
}

/// Tournament selection: each output slot keeps the best of `tournament_size`
/// candidates drawn with replacement. Returns indices into `population`,
/// one per member, so the result has the population's length.
pub fn tournament_selection<R: Rng + ?Sized>(
    population: &[Individual],
    tournament_size: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if tournament_size == 0 {
        return Err(CoevoError::SelectionFailure(
            "tournament size must be at least 1".to_string(),
        ));
    }
    if population.len() < tournament_size {
        return Err(CoevoError::SelectionFailure(format!(
            "population of {} is smaller than tournament size {}",
            population.len(),
            tournament_size
        )));
    }

    let selected = (0..population.len())
        .map(|_| {
            let mut best_idx = rng.gen_range(0..population.len());
            let mut best_fitness = population[best_idx].average_fitness();

            for _ in 1..tournament_size {
                let idx = rng.gen_range(0..population.len());
                let fitness = population[idx].average_fitness();
                if fitness > best_fitness {
                    best_idx = idx;
                    best_fitness = fitness;
                }
            }
            best_idx
        })
        .collect();

    Ok(selected)
}

/// Elitism: the top `ceil(fraction * N)` members (at least one), cycled to fill N slots.
pub fn elitism_selection(population: &[Individual], fraction: f64) -> Result<Vec<usize>> {
    if population.is_empty() {
        return Err(CoevoError::SelectionFailure(
            "cannot select from an empty population".to_string(),
        ));
    }

    let mut ranked: Vec<usize> = (0..population.len()).collect();
    ranked.sort_by(|&a, &b| by_fitness_desc(&population[a], &population[b]));

    let elite_count = ((population.len() as f64 * fraction).ceil() as usize)
        .clamp(1, population.len());
    let elite = &ranked[..elite_count];

    Ok(elite.iter().copied().cycle().take(population.len()).collect())
}

/// Recombines two genomes with the configured scheme.
pub fn crossover<R: Rng + ?Sized>(
    parent1: &Genome,
    parent2: &Genome,
    scheme: CrossoverStrategy,
    rng: &mut R,
) -> (Genome, Genome) {
    let len = parent1.len().min(parent2.len());
    let mut child1 = parent1.clone();
    let mut child2 = parent2.clone();

    let swap_range = |child1: &mut Genome, child2: &mut Genome, from: usize, to: usize| {
        for i in from..to {
            std::mem::swap(&mut child1[i], &mut child2[i]);
        }
    };

    match scheme {
        CrossoverStrategy::SinglePoint => {
            if len <= 1 {
                return (child1, child2);
            }
            let point = rng.gen_range(1..len);
            swap_range(&mut child1, &mut child2, point, len);
        }
        CrossoverStrategy::FixedPoint { fraction } => {
            let point = ((len as f64) * fraction).round() as usize;
            swap_range(&mut child1, &mut child2, point.min(len), len);
        }
        CrossoverStrategy::KPoint { k } => {
            if len <= 1 {
                return (child1, child2);
            }
            let mut cuts: Vec<usize> = rand::seq::index::sample(rng, len - 1, k.min(len - 1))
                .into_iter()
                .map(|cut| cut + 1)
                .collect();
            cuts.sort_unstable();
            cuts.push(len);

            // Alternate segments: swap between every other pair of cuts.
            for (segment, window) in cuts.windows(2).enumerate() {
                if segment % 2 == 0 {
                    swap_range(&mut child1, &mut child2, window[0], window[1]);
                }
            }
        }
        CrossoverStrategy::Uniform { swap_probability } => {
            for i in 0..len {
                if rng.gen::<f64>() < swap_probability {
                    std::mem::swap(&mut child1[i], &mut child2[i]);
                }
            }
        }
    }

    (child1, child2)
}

/// Swaps subtrees rooted at the same, randomly chosen depth.
///
/// The depth is uniform in `[0, min(depth_a, depth_b)]`. Results deeper than
/// `max_depth` fall back to unchanged copies.
pub fn crossover_trees<R: Rng + ?Sized>(
    first: &DualTree,
    second: &DualTree,
    max_depth: usize,
    rng: &mut R,
) -> Result<(DualTree, DualTree)> {
    let mut child1 = first.clone();
    let mut child2 = second.clone();

    let depth = rng.gen_range(0..=first.depth()?.min(second.depth()?));
    let first_nodes = child1.nodes_at_depth(depth);
    let second_nodes = child2.nodes_at_depth(depth);
    let (Some(&node1), Some(&node2)) = (first_nodes.choose(rng), second_nodes.choose(rng)) else {
        return Ok((child1, child2));
    };

    DualTree::swap_subtrees(&mut child1, node1, &mut child2, node2)?;
    child1.validate()?;
    child2.validate()?;

    if child1.depth()? > max_depth || child2.depth()? > max_depth {
        debug!("tree crossover at depth {} exceeded cap {}, keeping parents", depth, max_depth);
        return Ok((first.clone(), second.clone()));
    }
    Ok((child1, child2))
}

/// With `probability`, writes one operator from `pool` into a random genome
/// slot and applies it to the individual's tree. Returns whether it fired.
pub fn mutate<R: Rng + ?Sized>(
    individual: &mut Individual,
    pool: &[Strategy],
    vocabulary: &Vocabulary,
    probability: f64,
    rng: &mut R,
) -> Result<bool> {
    if rng.gen::<f64>() >= probability {
        return Ok(false);
    }
    let Some(&strategy) = pool.choose(rng) else {
        return Err(CoevoError::InvalidConfiguration(format!(
            "{} strategy pool is empty",
            individual.role
        )));
    };

    if individual.strategies.is_empty() {
        individual.strategies.push(strategy);
    } else {
        let slot = rng.gen_range(0..individual.strategies.len());
        individual.strategies[slot] = strategy;
    }
    strategy.apply(&mut individual.program.tree, vocabulary, rng)?;
    Ok(true)
}

/// Pairs parent and child by slot and keeps one of each pair.
///
/// `FitnessBased` keeps the child only when its (inherited) fitness is strictly
/// higher; `Random` flips a coin.
pub fn select_survivors<R: Rng + ?Sized>(
    parents: Vec<Individual>,
    children: Vec<Individual>,
    scheme: SurvivorSelection,
    rng: &mut R,
) -> Result<Vec<Individual>> {
    if parents.len() != children.len() {
        return Err(CoevoError::SelectionFailure(format!(
            "{} parents but {} children",
            parents.len(),
            children.len()
        )));
    }

    Ok(parents
        .into_iter()
        .zip(children)
        .map(|(parent, child)| {
            let keep_child = match scheme {
                SurvivorSelection::FitnessBased => {
                    child.average_fitness() > parent.average_fitness()
                }
                SurvivorSelection::Random => rng.gen_bool(0.5),
            };
            if keep_child {
                child
            } else {
                parent
            }
        })
        .collect())
}
