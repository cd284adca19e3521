//! Competitive coevolution of symbolic expressions.
//!
//! Antagonists learn edit strategies that push a start program away from a
//! target specification; protagonists learn strategies that repair the damage.

pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod types;

pub use error::{CoevoError, Result};
