use crate::engines::evaluation::expression::Evaluator;
use crate::engines::generation::tree::DualTree;
use crate::error::Result;
use crate::types::{Bindings, EquationPairing};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

/// An expression tree with an identity.
#[derive(Debug)]
pub struct Program {
    pub id: u64,
    pub tree: DualTree,
}

impl Clone for Program {
    /// Deep copy under a new id; programs never share trees.
    fn clone(&self) -> Self {
        Self::new(self.tree.clone())
    }
}

impl Program {
    pub fn new(tree: DualTree) -> Self {
        Self {
            id: NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed),
            tree,
        }
    }

    pub fn expression(&self) -> Result<String> {
        self.tree.to_mathematical_string()
    }

    /// Renders the tree and hands it to the evaluator with `bindings`.
    pub fn evaluate(&self, evaluator: &dyn Evaluator, bindings: &Bindings) -> Result<f64> {
        let expression = self.tree.to_mathematical_string()?;
        Ok(evaluator.evaluate(&expression, bindings)?)
    }

    /// Output of the program for every pairing of a specification, in order.
    pub fn evaluate_all(
        &self,
        evaluator: &dyn Evaluator,
        pairings: &[EquationPairing],
    ) -> Result<Vec<f64>> {
        let expression = self.tree.to_mathematical_string()?;
        pairings
            .iter()
            .map(|pairing| Ok(evaluator.evaluate(&expression, &pairing.bindings)?))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::expression::ArithmeticEvaluator;
    use crate::error::{CoevoError, EvaluationError};
    use crate::types::SymbolicExpression;

    fn pairing(x: f64) -> EquationPairing {
        let mut bindings = Bindings::new();
        bindings.insert("x".to_string(), x);
        EquationPairing {
            bindings,
            dependent: 0.0,
            antagonist_threshold: 1.0,
            protagonist_threshold: 1.0,
        }
    }

    #[test]
    fn test_clone_gets_new_identity() {
        let program = Program::new(DualTree::leaf(SymbolicExpression::terminal("x")));
        let copy = program.clone();
        assert_ne!(program.id, copy.id);
        assert_eq!(program.expression().unwrap(), copy.expression().unwrap());
    }

    #[test]
    fn test_evaluate_all() {
        let tree = DualTree::from_sequence(
            &[
                SymbolicExpression::terminal("x"),
                SymbolicExpression::terminal("x"),
            ],
            &[SymbolicExpression::non_terminal("*", 2)],
        )
        .unwrap();
        let program = Program::new(tree);
        let outputs = program
            .evaluate_all(&ArithmeticEvaluator::new(), &[pairing(1.0), pairing(3.0)])
            .unwrap();
        assert_eq!(outputs, vec![1.0, 9.0]);
    }

    #[test]
    fn test_evaluation_error_propagates() {
        let tree = DualTree::from_sequence(
            &[
                SymbolicExpression::terminal("1"),
                SymbolicExpression::terminal("x"),
            ],
            &[SymbolicExpression::non_terminal("/", 2)],
        )
        .unwrap();
        let program = Program::new(tree);
        let result = program.evaluate(&ArithmeticEvaluator::new(), &pairing(0.0).bindings);
        assert!(matches!(
            result,
            Err(CoevoError::Evaluation(EvaluationError::DivideByZero))
        ));
    }
}
