use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Variable bindings handed to the evaluator, keyed by variable name.
pub type Bindings = BTreeMap<String, f64>;

/// Whether a vocabulary item is a leaf or an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpressionKind {
    Terminal,
    NonTerminal,
}

/// Atomic vocabulary item of an expression tree.
///
/// Terminals are constants or variables and always carry arity 0. Non-terminals
/// are operators that require exactly `arity` children (1 or 2).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolicExpression {
    pub value: String,
    pub arity: u8,
    pub kind: ExpressionKind,
}

impl SymbolicExpression {
    pub fn terminal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            arity: 0,
            kind: ExpressionKind::Terminal,
        }
    }

    pub fn non_terminal(value: impl Into<String>, arity: u8) -> Self {
        Self {
            value: value.into(),
            arity,
            kind: ExpressionKind::NonTerminal,
        }
    }

    /// The `0` terminal used by every deletion operator.
    pub fn zero() -> Self {
        Self::terminal("0")
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == ExpressionKind::Terminal
    }

    /// A terminal whose value parses as a finite number.
    pub fn is_constant(&self) -> bool {
        self.is_terminal() && self.constant_value().is_some()
    }

    /// Numeric value of a constant terminal. Spellings such as `inf` or `NaN`
    /// are not constants; they resolve like any other variable name.
    pub fn constant_value(&self) -> Option<f64> {
        self.value.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Checks the arity/kind pairing of the item itself.
    pub fn is_well_formed(&self) -> bool {
        match self.kind {
            ExpressionKind::Terminal => self.arity == 0 && !self.value.is_empty(),
            ExpressionKind::NonTerminal => {
                (self.arity == 1 || self.arity == 2) && !self.value.is_empty()
            }
        }
    }
}

impl fmt::Display for SymbolicExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Role of a competitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Antagonist,
    Protagonist,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Antagonist => write!(f, "antagonist"),
            Role::Protagonist => write!(f, "protagonist"),
        }
    }
}

/// Single ground-truth row of a specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationPairing {
    pub bindings: Bindings,
    pub dependent: f64,
    pub antagonist_threshold: f64,
    pub protagonist_threshold: f64,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    MaxGenerations,
    EarlyTermination,
}
