pub mod tree;
pub mod genome;
pub mod strategy;
pub mod individual;
pub mod operators;
pub mod reproduction;
pub mod epoch;
pub mod lifecycle;
pub mod hall_of_fame;
pub mod topology;
pub mod evolution_engine;
pub mod progress;

pub use tree::DualTree;
pub use genome::Genome;
pub use strategy::{Strategy, Vocabulary};
pub use individual::Individual;
pub use lifecycle::{Generation, GenerationSummary};
pub use hall_of_fame::{Champion, HallOfFame};
pub use topology::Topology;
pub use evolution_engine::{EvolutionEngine, EvolutionResult, ProgressCallback, RunReport};
pub use progress::{
    ChannelProgressCallback, LogProgressCallback, ProgressMessage, SilentProgressCallback,
};
