use crate::config::{FitnessConfig, SpecificationConfig};
use crate::engines::evaluation::expression::Evaluator;
use crate::error::{CoevoError, Result};
use crate::types::{Bindings, EquationPairing};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ordered ground truth the protagonists track and the antagonists disrupt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pairings: Vec<EquationPairing>,
}

impl Specification {
    pub fn new(pairings: Vec<EquationPairing>) -> Result<Self> {
        let specification = Self { pairings };
        specification.validate()?;
        Ok(specification)
    }

    /// Loads `params.path` when set, otherwise samples the target expression.
    pub fn from_config(
        params: &SpecificationConfig,
        fitness: &FitnessConfig,
        evaluator: &dyn Evaluator,
    ) -> Result<Self> {
        match &params.path {
            Some(path) => Self::load_json(path),
            None => Self::generate(params, fitness, evaluator),
        }
    }

    /// Samples the target expression at `seed + i` for `i in 0..range`.
    ///
    /// Each threshold is its role's multiplier times `max(|y|, 1)`, so a zero
    /// target value still yields a usable threshold.
    pub fn generate(
        params: &SpecificationConfig,
        fitness: &FitnessConfig,
        evaluator: &dyn Evaluator,
    ) -> Result<Self> {
        if params.range == 0 {
            return Err(CoevoError::InvalidConfiguration(
                "Specification range must be at least 1".to_string(),
            ));
        }

        let pairings = (0..params.range)
            .map(|i| {
                let mut bindings = Bindings::new();
                bindings.insert(params.variable.clone(), params.seed + i as f64);
                let dependent = evaluator.evaluate(&params.expression, &bindings)?;
                let scale = dependent.abs().max(1.0);
                Ok(EquationPairing {
                    bindings,
                    dependent,
                    antagonist_threshold: fitness.antagonist_threshold_multiplier * scale,
                    protagonist_threshold: fitness.protagonist_threshold_multiplier * scale,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(pairings)
    }

    /// Reads a JSON array of pairings.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let pairings: Vec<EquationPairing> = serde_json::from_str(&contents)?;
        Self::new(pairings)
    }

    pub fn pairings(&self) -> &[EquationPairing] {
        &self.pairings
    }

    pub fn len(&self) -> usize {
        self.pairings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairings.is_empty()
    }

    fn validate(&self) -> Result<()> {
        if self.pairings.is_empty() {
            return Err(CoevoError::InvalidConfiguration(
                "Specification has no pairings".to_string(),
            ));
        }
        for (i, pairing) in self.pairings.iter().enumerate() {
            let values = [
                pairing.dependent,
                pairing.antagonist_threshold,
                pairing.protagonist_threshold,
            ];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(CoevoError::InvalidConfiguration(format!(
                    "Pairing {} has a non-finite value",
                    i
                )));
            }
        }
        Ok(())
    }
}
