use crate::engines::generation::individual::Individual;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

#[derive(Clone, Debug)]
pub struct Champion {
    pub individual: Individual,
    pub fitness: f64,
    pub generation: usize,
    pub canonical_string: String, // For deduplication
}

/// Archive of past generation champions, best first.
pub struct HallOfFame {
    champions: Vec<Champion>,
    max_size: usize,
    seen_signatures: HashSet<String>,
}

impl HallOfFame {
    pub fn new(max_size: usize) -> Self {
        Self {
            champions: Vec::new(),
            max_size,
            seen_signatures: HashSet::new(),
        }
    }

    /// Archives a snapshot of `individual` unless an identical champion is already kept.
    pub fn try_add(&mut self, individual: &Individual, generation: usize) -> bool {
        let canonical_string = individual.signature();
        if self.seen_signatures.contains(&canonical_string) {
            return false;
        }

        self.seen_signatures.insert(canonical_string.clone());
        self.champions.push(Champion {
            individual: individual.clone(),
            fitness: individual.average_fitness(),
            generation,
            canonical_string,
        });
        self.sort_and_trim();
        true
    }

    fn sort_and_trim(&mut self) {
        self.champions.sort_by(|a, b| {
            b.fitness
                .partial_cmp(&a.fitness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        while self.champions.len() > self.max_size {
            if let Some(removed) = self.champions.pop() {
                self.seen_signatures.remove(&removed.canonical_string);
            }
        }
    }

    pub fn get_all(&self) -> &[Champion] {
        &self.champions
    }

    pub fn get_top_n(&self, n: usize) -> &[Champion] {
        &self.champions[..n.min(self.champions.len())]
    }

    /// `min(n, len)` distinct champions drawn uniformly.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<&Champion> {
        self.champions
            .choose_multiple(rng, n.min(self.champions.len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.champions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.champions.is_empty()
    }
}
