use crate::engines::generation::tree::DualTree;
use crate::error::{CoevoError, Result};
use crate::types::SymbolicExpression;
use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named genetic operator an individual can apply to a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strategy {
    Skip,
    MutateTerminal,
    MutateNonTerminal,
    DeleteTerminal,
    DeleteNonTerminal,
    DeleteMalicious,
    FellTree,
    ReplaceBranch,
    AddToLeaf,
    AddSubTree,
}

impl Strategy {
    pub const ALL: [Strategy; 10] = [
        Strategy::Skip,
        Strategy::MutateTerminal,
        Strategy::MutateNonTerminal,
        Strategy::DeleteTerminal,
        Strategy::DeleteNonTerminal,
        Strategy::DeleteMalicious,
        Strategy::FellTree,
        Strategy::ReplaceBranch,
        Strategy::AddToLeaf,
        Strategy::AddSubTree,
    ];

    /// Strategies that splice a donor into the tree and can push it past the depth cap.
    pub fn grows_tree(&self) -> bool {
        matches!(
            self,
            Strategy::ReplaceBranch | Strategy::AddToLeaf | Strategy::AddSubTree
        )
    }

    /// Applies the operator in place and re-checks the arity invariant.
    ///
    /// A growing operator whose result is deeper than `vocabulary.max_depth`
    /// is reverted.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        tree: &mut DualTree,
        vocabulary: &Vocabulary,
        rng: &mut R,
    ) -> Result<()> {
        let backup = self.grows_tree().then(|| tree.clone());

        match self {
            Strategy::Skip => {}
            Strategy::MutateTerminal => {
                tree.mutate_terminal(&vocabulary.terminals, rng)?;
            }
            Strategy::MutateNonTerminal => {
                tree.mutate_non_terminal(&vocabulary.non_terminals, rng)?;
            }
            Strategy::DeleteTerminal => tree.delete_terminal(rng)?,
            Strategy::DeleteNonTerminal => tree.delete_non_terminal(rng)?,
            Strategy::DeleteMalicious => tree.delete_malicious(rng)?,
            Strategy::FellTree => tree.fell_tree(),
            Strategy::ReplaceBranch => {
                let donor = vocabulary.donor(rng)?;
                tree.replace_branch(&donor, rng)?;
            }
            Strategy::AddToLeaf => {
                let donor = vocabulary.donor(rng)?;
                tree.add_to_leaf(&donor, rng)?;
            }
            Strategy::AddSubTree => {
                let donor = vocabulary.donor(rng)?;
                tree.add_sub_tree(&donor, rng)?;
            }
        }

        tree.validate()?;

        if let Some(backup) = backup {
            let depth = tree.depth()?;
            if depth > vocabulary.max_depth {
                warn!(
                    "{} grew tree to depth {} (cap {}), reverting",
                    self, depth, vocabulary.max_depth
                );
                *tree = backup;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Applies every strategy of a genome in order.
pub fn apply_all<R: Rng + ?Sized>(
    strategies: &[Strategy],
    tree: &mut DualTree,
    vocabulary: &Vocabulary,
    rng: &mut R,
) -> Result<()> {
    for strategy in strategies {
        strategy.apply(tree, vocabulary, rng)?;
    }
    Ok(())
}

/// Terminal and non-terminal pools plus the bounds operators work within.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub terminals: Vec<SymbolicExpression>,
    pub non_terminals: Vec<SymbolicExpression>,
    /// Maximum depth of randomly generated donor subtrees.
    pub donor_depth: usize,
    /// Trees deeper than this are never produced by a growing operator.
    pub max_depth: usize,
}

impl Vocabulary {
    pub fn new(
        terminals: Vec<SymbolicExpression>,
        non_terminals: Vec<SymbolicExpression>,
        donor_depth: usize,
        max_depth: usize,
    ) -> Result<Self> {
        if terminals.is_empty() {
            return Err(CoevoError::InvalidConfiguration(
                "terminal pool is empty".to_string(),
            ));
        }
        if let Some(bad) = terminals
            .iter()
            .chain(&non_terminals)
            .find(|e| !e.is_well_formed())
        {
            return Err(CoevoError::InvalidConfiguration(format!(
                "malformed expression '{}' with arity {}",
                bad.value, bad.arity
            )));
        }
        if donor_depth > 0 && non_terminals.is_empty() {
            return Err(CoevoError::InvalidConfiguration(
                "donor subtrees deeper than 0 need non-terminals".to_string(),
            ));
        }
        if donor_depth > 1 && !non_terminals.iter().any(|e| e.arity == 2) {
            return Err(CoevoError::InvalidConfiguration(
                "donor subtrees deeper than 1 need a binary operator".to_string(),
            ));
        }

        Ok(Self {
            terminals,
            non_terminals,
            donor_depth,
            max_depth,
        })
    }

    /// Random donor subtree with a depth in `0..=donor_depth`.
    pub fn donor<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<DualTree> {
        let depth = rng.gen_range(0..=self.donor_depth);
        DualTree::random(depth, &self.terminals, &self.non_terminals, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn vocabulary(max_depth: usize) -> Vocabulary {
        Vocabulary::new(
            vec![
                SymbolicExpression::terminal("x"),
                SymbolicExpression::terminal("1"),
                SymbolicExpression::terminal("2"),
            ],
            vec![
                SymbolicExpression::non_terminal("+", 2),
                SymbolicExpression::non_terminal("*", 2),
                SymbolicExpression::non_terminal("sin", 1),
            ],
            2,
            max_depth,
        )
        .unwrap()
    }

    #[test]
    fn test_every_strategy_keeps_tree_valid() {
        let vocabulary = vocabulary(8);
        let mut rng = StdRng::seed_from_u64(21);

        for strategy in Strategy::ALL {
            for _ in 0..25 {
                let mut tree =
                    DualTree::random(2, &vocabulary.terminals, &vocabulary.non_terminals, &mut rng)
                        .unwrap();
                strategy.apply(&mut tree, &vocabulary, &mut rng).unwrap();
                tree.validate().unwrap();
            }
        }
    }

    #[test]
    fn test_depth_cap_reverts_growth() {
        let vocabulary = vocabulary(1);
        let mut rng = StdRng::seed_from_u64(4);
        let mut tree = DualTree::leaf(SymbolicExpression::terminal("x"));

        for _ in 0..20 {
            Strategy::AddSubTree
                .apply(&mut tree, &vocabulary, &mut rng)
                .unwrap();
            assert!(tree.depth().unwrap() <= 1);
        }
    }

    #[test]
    fn test_vocabulary_rejects_unusable_pools() {
        assert!(Vocabulary::new(vec![], vec![], 0, 4).is_err());
        assert!(Vocabulary::new(
            vec![SymbolicExpression::terminal("x")],
            vec![SymbolicExpression::non_terminal("sin", 1)],
            2,
            4
        )
        .is_err());
        assert!(Vocabulary::new(
            vec![SymbolicExpression::terminal("x")],
            vec![SymbolicExpression::non_terminal("+", 3)],
            1,
            4
        )
        .is_err());
    }

    #[test]
    fn test_apply_all_runs_in_order() {
        let vocabulary = vocabulary(8);
        let mut rng = StdRng::seed_from_u64(8);
        let mut tree = DualTree::leaf(SymbolicExpression::terminal("x"));
        apply_all(
            &[Strategy::AddSubTree, Strategy::FellTree],
            &mut tree,
            &vocabulary,
            &mut rng,
        )
        .unwrap();
        assert_eq!(tree.to_mathematical_string().unwrap(), "0");
    }
}
