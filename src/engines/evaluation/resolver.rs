use crate::engines::evaluation::program::Program;
use crate::engines::generation::individual::Individual;
use crate::engines::generation::tree::DualTree;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ResolvedChild {
    pub tree: DualTree,
    pub fitness: f64,
    pub delta: f64,
}

/// Best tree each individual produced across its epochs in one generation.
///
/// Epochs run in parallel and return their outcomes; the resolver is filled
/// afterwards by a sequential merge, so it needs no lock.
#[derive(Debug, Default)]
pub struct BestChildResolver {
    best: HashMap<u64, ResolvedChild>,
}

impl BestChildResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps `tree` if it beats the current entry: higher fitness, then lower delta.
    pub fn offer(&mut self, individual_id: u64, tree: &DualTree, fitness: f64, delta: f64) {
        let better = match self.best.get(&individual_id) {
            None => true,
            Some(current) => {
                fitness > current.fitness || (fitness == current.fitness && delta < current.delta)
            }
        };
        if better {
            self.best.insert(
                individual_id,
                ResolvedChild {
                    tree: tree.clone(),
                    fitness,
                    delta,
                },
            );
        }
    }

    pub fn get(&self, individual_id: u64) -> Option<&ResolvedChild> {
        self.best.get(&individual_id)
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// Installs the winning tree onto each individual that competed.
    pub fn install(&self, individuals: &mut [Individual]) {
        for individual in individuals.iter_mut() {
            if let Some(resolved) = self.best.get(&individual.id) {
                individual.program = Program::new(resolved.tree.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, SymbolicExpression};

    fn leaf(value: &str) -> DualTree {
        DualTree::leaf(SymbolicExpression::terminal(value))
    }

    #[test]
    fn test_offer_keeps_best() {
        let mut resolver = BestChildResolver::new();
        resolver.offer(1, &leaf("1"), 0.1, 5.0);
        resolver.offer(1, &leaf("2"), 0.4, 3.0);
        resolver.offer(1, &leaf("3"), 0.4, 4.0);
        resolver.offer(1, &leaf("4"), -0.2, 0.0);

        let best = resolver.get(1).unwrap();
        assert_eq!(best.fitness, 0.4);
        assert_eq!(best.tree.to_mathematical_string().unwrap(), "2");
    }

    #[test]
    fn test_install() {
        let mut resolver = BestChildResolver::new();
        let mut individuals = vec![
            Individual::new(Role::Antagonist, Program::new(leaf("x")), vec![], 0),
            Individual::new(Role::Antagonist, Program::new(leaf("x")), vec![], 0),
        ];
        resolver.offer(individuals[1].id, &leaf("7"), 0.3, 1.0);
        resolver.install(&mut individuals);

        assert_eq!(individuals[0].program.expression().unwrap(), "x");
        assert_eq!(individuals[1].program.expression().unwrap(), "7");
    }
}
