//! Fitness strategies for an antagonist/protagonist pair.
//!
//! Both sides are scored against the same specification. An antagonist is
//! rewarded for pushing its program's error *past* its threshold, a protagonist
//! for keeping its error *within* its threshold. When delta equals threshold
//! the fitness is exactly 0, which also covers the `0 == 0` case, so no branch
//! ever divides by zero.

use crate::engines::evaluation::expression::Evaluator;
use crate::engines::evaluation::program::Program;
use crate::error::{CoevoError, EvaluationError, Result};
use crate::types::EquationPairing;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitnessStrategy {
    /// Separate antagonist and protagonist thresholds.
    ThresholdedRatio,
    /// Both sides judged against the antagonist threshold.
    MonoThreshold,
}

/// What to do when a program cannot be evaluated (division by zero, non-finite results).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy")]
pub enum DivideByZeroPolicy {
    /// Abort the run with the evaluation error.
    Fail,
    /// Score the failing side with `fitness` and an infinite delta.
    Penalize { fitness: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessOutcome {
    pub antagonist_fitness: f64,
    pub protagonist_fitness: f64,
    pub antagonist_delta: f64,
    pub protagonist_delta: f64,
}

/// `(delta - t)/delta` at or beyond the threshold, `-(t - delta)/t` below it.
pub fn antagonist_ratio(delta: f64, threshold: f64) -> f64 {
    if delta == threshold {
        0.0
    } else if delta > threshold {
        (delta - threshold) / delta
    } else {
        -(threshold - delta) / threshold
    }
}

/// `(t - delta)/t` within the threshold, `-(delta - t)/delta` beyond it.
pub fn protagonist_ratio(delta: f64, threshold: f64) -> f64 {
    if delta == threshold {
        0.0
    } else if delta < threshold {
        (threshold - delta) / threshold
    } else {
        -(delta - threshold) / delta
    }
}

/// Mean absolute error of a program over the specification.
pub fn mean_absolute_delta(
    program: &Program,
    pairings: &[EquationPairing],
    evaluator: &dyn Evaluator,
) -> Result<f64> {
    if pairings.is_empty() {
        return Err(CoevoError::InvalidConfiguration(
            "specification has no pairings".to_string(),
        ));
    }
    let outputs = program.evaluate_all(evaluator, pairings)?;
    let total: f64 = outputs
        .iter()
        .zip(pairings)
        .map(|(predicted, pairing)| (predicted - pairing.dependent).abs())
        .sum();
    Ok(total / pairings.len() as f64)
}

impl FitnessStrategy {
    /// Scores an antagonist/protagonist pair.
    ///
    /// Structural errors always propagate. Evaluation errors propagate under
    /// [`DivideByZeroPolicy::Fail`] and are turned into the penalty fitness
    /// for the failing side otherwise.
    pub fn evaluate(
        &self,
        pairings: &[EquationPairing],
        antagonist: &Program,
        protagonist: &Program,
        evaluator: &dyn Evaluator,
        policy: DivideByZeroPolicy,
    ) -> Result<FitnessOutcome> {
        if pairings.is_empty() {
            return Err(CoevoError::InvalidConfiguration(
                "specification has no pairings".to_string(),
            ));
        }

        let count = pairings.len() as f64;
        let antagonist_threshold =
            pairings.iter().map(|p| p.antagonist_threshold.abs()).sum::<f64>() / count;
        let protagonist_threshold = match self {
            FitnessStrategy::ThresholdedRatio => {
                pairings.iter().map(|p| p.protagonist_threshold.abs()).sum::<f64>() / count
            }
            FitnessStrategy::MonoThreshold => antagonist_threshold,
        };

        let (antagonist_fitness, antagonist_delta) = score(
            mean_absolute_delta(antagonist, pairings, evaluator),
            policy,
            |delta| antagonist_ratio(delta, antagonist_threshold),
        )?;
        let (protagonist_fitness, protagonist_delta) = score(
            mean_absolute_delta(protagonist, pairings, evaluator),
            policy,
            |delta| protagonist_ratio(delta, protagonist_threshold),
        )?;

        Ok(FitnessOutcome {
            antagonist_fitness,
            protagonist_fitness,
            antagonist_delta,
            protagonist_delta,
        })
    }
}

fn score(
    delta: Result<f64>,
    policy: DivideByZeroPolicy,
    ratio: impl Fn(f64) -> f64,
) -> Result<(f64, f64)> {
    match (delta, policy) {
        (Ok(delta), _) => Ok((ratio(delta), delta)),
        (
            Err(CoevoError::Evaluation(
                error @ (EvaluationError::DivideByZero | EvaluationError::NonFinite(_)),
            )),
            DivideByZeroPolicy::Penalize { fitness },
        ) => {
            debug!("evaluation failed ({}), assigning penalty {}", error, fitness);
            Ok((fitness, f64::INFINITY))
        }
        (Err(error), _) => Err(error),
    }
}
