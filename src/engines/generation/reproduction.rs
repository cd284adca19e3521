//! Parent selection, crossover, mutation and survivor selection for one side.

use crate::config::{EvolutionConfig, ParentSelection, RoleConfig};
use crate::engines::generation::individual::Individual;
use crate::engines::generation::operators::{
    crossover, crossover_trees, elitism_selection, mutate, select_survivors, tournament_selection,
};
use crate::engines::evaluation::program::Program;
use crate::engines::generation::strategy::Vocabulary;
use crate::error::Result;
use log::debug;
use rand::Rng;
use std::collections::HashSet;

/// Produces the next population of one role, the same size as `population`.
///
/// Selected parents are copied (a parent picked twice gets a new id for the
/// second copy), paired `(0, 1), (2, 3), ...`, and each pair yields two
/// children by crossover with `crossover_probability` or by cloning. Parents
/// and children then mutate independently, parents age by one, and survivor
/// selection keeps one member per slot.
pub fn reproduce<R: Rng + ?Sized>(
    population: &[Individual],
    role: &RoleConfig,
    evolution: &EvolutionConfig,
    vocabulary: &Vocabulary,
    generation: usize,
    rng: &mut R,
) -> Result<Vec<Individual>> {
    let selected = match evolution.parent_selection {
        ParentSelection::Tournament { size } => tournament_selection(population, size, rng)?,
        ParentSelection::Elitism { fraction } => elitism_selection(population, fraction)?,
    };

    let mut seen = HashSet::with_capacity(selected.len());
    let mut parents: Vec<Individual> = selected
        .into_iter()
        .map(|idx| {
            let source = &population[idx];
            if seen.insert(source.id) {
                source.clone()
            } else {
                source.duplicate()
            }
        })
        .collect();

    let mut children = Vec::with_capacity(parents.len());
    for pair in parents.chunks(2) {
        match pair {
            [first, second] if rng.gen::<f64>() < evolution.crossover_probability => {
                let inherited = (first.average_fitness() + second.average_fitness()) / 2.0;
                let (genome1, genome2) =
                    crossover(&first.strategies, &second.strategies, evolution.crossover, rng);
                let (tree1, tree2) = crossover_trees(
                    &first.program.tree,
                    &second.program.tree,
                    vocabulary.max_depth,
                    rng,
                )?;
                children.push(first.offspring(genome1, Program::new(tree1), generation, inherited));
                children.push(second.offspring(genome2, Program::new(tree2), generation, inherited));
            }
            _ => {
                for parent in pair {
                    children.push(parent.offspring(
                        parent.strategies.clone(),
                        parent.program.clone(),
                        generation,
                        parent.average_fitness(),
                    ));
                }
            }
        }
    }

    let mut mutations = 0;
    for individual in parents.iter_mut().chain(children.iter_mut()) {
        if mutate(
            individual,
            &role.strategies,
            vocabulary,
            evolution.mutation_probability,
            rng,
        )? {
            mutations += 1;
        }
    }
    for parent in parents.iter_mut() {
        parent.age += 1;
    }
    debug!(
        "generation {}: {} children, {} mutations",
        generation,
        children.len(),
        mutations
    );

    select_survivors(parents, children, evolution.survivor_selection, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrossoverStrategy, SurvivorSelection};
    use crate::engines::generation::strategy::Strategy;
    use crate::engines::generation::tree::DualTree;
    use crate::types::{Role, SymbolicExpression};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn vocabulary() -> Vocabulary {
        Vocabulary::new(
            vec![SymbolicExpression::terminal("x"), SymbolicExpression::terminal("1")],
            vec![SymbolicExpression::non_terminal("+", 2)],
            1,
            6,
        )
        .unwrap()
    }

    fn population(size: usize) -> Vec<Individual> {
        (0..size)
            .map(|i| {
                let mut individual = Individual::new(
                    Role::Antagonist,
                    Program::new(DualTree::leaf(SymbolicExpression::terminal("x"))),
                    vec![Strategy::MutateTerminal, Strategy::AddToLeaf],
                    0,
                );
                individual.record(i as f64 / size as f64, 1.0);
                individual
            })
            .collect()
    }

    #[test]
    fn test_reproduce_preserves_size_and_unique_ids() {
        let mut rng = StdRng::seed_from_u64(17);
        let evolution = EvolutionConfig {
            crossover_probability: 1.0,
            mutation_probability: 0.5,
            crossover: CrossoverStrategy::Uniform {
                swap_probability: 0.5,
            },
            survivor_selection: SurvivorSelection::Random,
            ..Default::default()
        };
        let role = RoleConfig::antagonist();
        let population = population(8);

        let next = reproduce(&population, &role, &evolution, &vocabulary(), 1, &mut rng).unwrap();
        assert_eq!(next.len(), 8);

        let ids: HashSet<u64> = next.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 8);
        for individual in &next {
            individual.program.tree.validate().unwrap();
            assert_eq!(individual.strategies.len(), 2);
        }
    }

    #[test]
    fn test_children_carry_birth_generation() {
        let mut rng = StdRng::seed_from_u64(2);
        let evolution = EvolutionConfig {
            crossover_probability: 1.0,
            mutation_probability: 0.0,
            parent_selection: ParentSelection::Elitism { fraction: 0.25 },
            survivor_selection: SurvivorSelection::Random,
            ..Default::default()
        };
        let population = population(4);
        let next = reproduce(
            &population,
            &RoleConfig::antagonist(),
            &evolution,
            &vocabulary(),
            5,
            &mut rng,
        )
        .unwrap();

        for individual in &next {
            if individual.has_competed() {
                assert_eq!(individual.age, 1);
            } else {
                assert_eq!(individual.birth_generation, 5);
                assert_eq!(individual.age, 0);
                assert_eq!(individual.average_fitness(), 0.75);
            }
        }
    }
}
