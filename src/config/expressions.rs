use super::traits::ConfigSection;
use crate::engines::evaluation::program::Program;
use crate::engines::generation::strategy::Vocabulary;
use crate::engines::generation::tree::DualTree;
use crate::error::{CoevoError, Result};
use crate::types::SymbolicExpression;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorConfig {
    pub value: String,
    pub arity: u8,
}

impl OperatorConfig {
    pub fn new(value: &str, arity: u8) -> Self {
        Self {
            value: value.to_string(),
            arity,
        }
    }
}

/// Shape every program is reset to at the start of a generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StartProgram {
    Random { depth: usize },
    Sequence {
        terminals: Vec<String>,
        non_terminals: Vec<OperatorConfig>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionConfig {
    /// Numeric literals become constants, anything else a variable.
    pub terminals: Vec<String>,
    pub non_terminals: Vec<OperatorConfig>,
    pub donor_depth: usize,
    pub start: StartProgram,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            terminals: vec![
                "x".to_string(),
                "1".to_string(),
                "2".to_string(),
                "3".to_string(),
            ],
            non_terminals: vec![
                OperatorConfig::new("+", 2),
                OperatorConfig::new("-", 2),
                OperatorConfig::new("*", 2),
            ],
            donor_depth: 2,
            start: StartProgram::Sequence {
                terminals: vec!["x".to_string()],
                non_terminals: vec![],
            },
        }
    }
}

fn terminals(values: &[String]) -> Vec<SymbolicExpression> {
    values.iter().map(SymbolicExpression::terminal).collect()
}

fn operators(values: &[OperatorConfig]) -> Vec<SymbolicExpression> {
    values
        .iter()
        .map(|op| SymbolicExpression::non_terminal(op.value.as_str(), op.arity))
        .collect()
}

impl ExpressionConfig {
    pub fn vocabulary(&self, max_depth: usize) -> Result<Vocabulary> {
        Vocabulary::new(
            terminals(&self.terminals),
            operators(&self.non_terminals),
            self.donor_depth,
            max_depth,
        )
    }

    /// Builds the starting program; random shapes draw from the vocabulary pools.
    pub fn start_program<R: Rng + ?Sized>(
        &self,
        vocabulary: &Vocabulary,
        rng: &mut R,
    ) -> Result<Program> {
        let tree = match &self.start {
            StartProgram::Random { depth } => DualTree::random(
                *depth,
                &vocabulary.terminals,
                &vocabulary.non_terminals,
                rng,
            )?,
            StartProgram::Sequence {
                terminals: leaves,
                non_terminals,
            } => DualTree::from_sequence(&terminals(leaves), &operators(non_terminals))?,
        };
        Ok(Program::new(tree))
    }
}

impl ConfigSection for ExpressionConfig {
    fn section_name() -> &'static str {
        "expressions"
    }

    fn validate(&self) -> Result<()> {
        if self.terminals.is_empty() {
            return Err(CoevoError::InvalidConfiguration(
                "Terminal pool must not be empty".to_string(),
            ));
        }
        if let Some(op) = self
            .non_terminals
            .iter()
            .find(|op| op.arity != 1 && op.arity != 2)
        {
            return Err(CoevoError::InvalidConfiguration(format!(
                "Operator '{}' has arity {}, expected 1 or 2",
                op.value, op.arity
            )));
        }
        if let StartProgram::Sequence { terminals, .. } = &self.start {
            if terminals.is_empty() {
                return Err(CoevoError::InvalidConfiguration(
                    "Start program needs at least one terminal".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_start_program() {
        let config = ExpressionConfig::default();
        let vocabulary = config.vocabulary(8).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let program = config.start_program(&vocabulary, &mut rng).unwrap();
        assert_eq!(program.expression().unwrap(), "x");
    }

    #[test]
    fn test_random_start_program() {
        let config = ExpressionConfig {
            start: StartProgram::Random { depth: 2 },
            ..Default::default()
        };
        let vocabulary = config.vocabulary(8).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let program = config.start_program(&vocabulary, &mut rng).unwrap();
        assert_eq!(program.tree.depth().unwrap(), 2);
    }

    #[test]
    fn test_rejects_ternary_operator() {
        let config = ExpressionConfig {
            non_terminals: vec![OperatorConfig::new("?", 3)],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
