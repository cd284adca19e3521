pub mod expression;
pub mod fitness;
pub mod program;
pub mod resolver;

pub use expression::{ArithmeticEvaluator, Evaluator};
pub use fitness::{DivideByZeroPolicy, FitnessOutcome, FitnessStrategy};
pub use program::Program;
pub use resolver::BestChildResolver;
