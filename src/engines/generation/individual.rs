use crate::engines::evaluation::program::Program;
use crate::engines::generation::genome::Genome;
use crate::engines::generation::strategy::Strategy;
use crate::error::{CoevoError, Result};
use crate::types::Role;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INDIVIDUAL_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_INDIVIDUAL_ID.fetch_add(1, Ordering::Relaxed)
}

/// A competitor: a genome of strategies, the tree it last produced, and its
/// fitness bookkeeping.
///
/// `Clone` produces a snapshot that keeps the id (used for archives and
/// best-of-kind records); [`Individual::offspring`] creates a new identity.
#[derive(Debug, Clone)]
pub struct Individual {
    pub id: u64,
    pub role: Role,
    pub program: Program,
    pub strategies: Genome,
    /// One entry per epoch played, over the individual's whole life.
    pub fitness: Vec<f64>,
    pub deltas: Vec<f64>,
    pub best_fitness: f64,
    /// Delta recorded alongside `best_fitness`.
    pub best_delta: f64,
    pub age: usize,
    pub birth_generation: usize,
    /// Fitness estimate given at birth, used until the first epoch is played.
    pub inherited_fitness: Option<f64>,
}

impl Individual {
    pub fn new(role: Role, program: Program, strategies: Genome, birth_generation: usize) -> Self {
        Self {
            id: next_id(),
            role,
            program,
            strategies,
            fitness: Vec::new(),
            deltas: Vec::new(),
            best_fitness: f64::NEG_INFINITY,
            best_delta: f64::INFINITY,
            age: 0,
            birth_generation,
            inherited_fitness: None,
        }
    }

    /// Fresh individual with `strategy_count` strategies drawn from `pool`.
    pub fn random<R: Rng + ?Sized>(
        role: Role,
        start: &Program,
        pool: &[Strategy],
        strategy_count: usize,
        birth_generation: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if pool.is_empty() {
            return Err(CoevoError::InvalidConfiguration(format!(
                "{} strategy pool is empty",
                role
            )));
        }
        let strategies: Genome = (0..strategy_count)
            .filter_map(|_| pool.choose(rng).copied())
            .collect();
        Ok(Self::new(role, start.clone(), strategies, birth_generation))
    }

    /// Child with a new identity, `age = 0` and no fitness history.
    pub fn offspring(
        &self,
        strategies: Genome,
        program: Program,
        birth_generation: usize,
        inherited_fitness: f64,
    ) -> Self {
        let mut child = Self::new(self.role, program, strategies, birth_generation);
        child.inherited_fitness = Some(inherited_fitness);
        child
    }

    /// Copy with a new identity that keeps genome, history and age.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = next_id();
        copy
    }

    /// Appends one epoch result.
    pub fn record(&mut self, fitness: f64, delta: f64) {
        self.fitness.push(fitness);
        self.deltas.push(delta);
        if fitness > self.best_fitness {
            self.best_fitness = fitness;
            self.best_delta = delta;
        }
    }

    pub fn has_competed(&self) -> bool {
        !self.fitness.is_empty()
    }

    /// Mean of the fitness history, falling back to the inherited estimate.
    pub fn average_fitness(&self) -> f64 {
        if self.fitness.is_empty() {
            return self.inherited_fitness.unwrap_or(0.0);
        }
        self.fitness.iter().sum::<f64>() / self.fitness.len() as f64
    }

    /// Mean of the finite deltas; infinite when none were recorded.
    pub fn average_delta(&self) -> f64 {
        let finite: Vec<f64> = self.deltas.iter().copied().filter(|d| d.is_finite()).collect();
        if finite.is_empty() {
            return f64::INFINITY;
        }
        finite.iter().sum::<f64>() / finite.len() as f64
    }

    /// Resets the tree to the shared starting program, keeping genome and history.
    pub fn cleanse(&mut self, start: &Program) {
        self.program = start.clone();
    }

    /// Most frequent strategy; ties go to the one appearing first.
    pub fn dominant_strategy(&self) -> Option<Strategy> {
        let mut best: Option<(Strategy, usize)> = None;
        for strategy in &self.strategies {
            let count = self.strategies.iter().filter(|s| *s == strategy).count();
            match best {
                Some((_, best_count)) if best_count >= count => {}
                _ => best = Some((*strategy, count)),
            }
        }
        best.map(|(strategy, _)| strategy)
    }

    /// Stable signature used to deduplicate archived champions.
    pub fn signature(&self) -> String {
        let strategies: Vec<String> = self.strategies.iter().map(|s| s.to_string()).collect();
        let equation = self
            .program
            .expression()
            .unwrap_or_else(|_| "<invalid>".to_string());
        format!("{:?}|{}|{}", self.role, strategies.join(","), equation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::tree::DualTree;
    use crate::types::SymbolicExpression;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn start() -> Program {
        Program::new(DualTree::leaf(SymbolicExpression::terminal("x")))
    }

    #[test]
    fn test_random_individual() {
        let mut rng = StdRng::seed_from_u64(1);
        let individual = Individual::random(
            Role::Antagonist,
            &start(),
            &[Strategy::MutateTerminal, Strategy::DeleteTerminal],
            4,
            0,
            &mut rng,
        )
        .unwrap();
        assert_eq!(individual.strategies.len(), 4);
        assert!(!individual.has_competed());
        assert_eq!(individual.average_fitness(), 0.0);
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = Individual::random(Role::Protagonist, &start(), &[], 3, 0, &mut rng);
        assert!(matches!(result, Err(CoevoError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_record_tracks_best() {
        let mut individual = Individual::new(Role::Protagonist, start(), vec![], 0);
        individual.record(0.2, 3.0);
        individual.record(0.6, 1.0);
        individual.record(-0.4, 9.0);
        assert_eq!(individual.best_fitness, 0.6);
        assert_eq!(individual.best_delta, 1.0);
        assert!((individual.average_fitness() - 0.4 / 3.0).abs() < 1e-12);
        assert!((individual.average_delta() - 13.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_offspring_gets_new_identity() {
        let parent = Individual::new(Role::Antagonist, start(), vec![Strategy::Skip], 0);
        let child = parent.offspring(vec![Strategy::FellTree], start(), 3, 0.25);
        assert_ne!(parent.id, child.id);
        assert_eq!(child.birth_generation, 3);
        assert_eq!(child.age, 0);
        assert_eq!(child.average_fitness(), 0.25);
    }

    #[test]
    fn test_dominant_strategy() {
        let individual = Individual::new(
            Role::Antagonist,
            start(),
            vec![
                Strategy::Skip,
                Strategy::FellTree,
                Strategy::FellTree,
                Strategy::Skip,
                Strategy::AddToLeaf,
            ],
            0,
        );
        assert_eq!(individual.dominant_strategy(), Some(Strategy::Skip));
    }
}
