pub mod traits;
pub mod evolution;
pub mod roles;
pub mod expressions;
pub mod fitness;
pub mod topology;
pub mod specification;
pub mod manager;

pub use manager::{AppConfig, ConfigManager};
pub use evolution::{
    CrossoverStrategy, EarlyTerminationConfig, EvolutionConfig, ParentSelection, SurvivorSelection,
};
pub use roles::RoleConfig;
pub use expressions::{ExpressionConfig, OperatorConfig, StartProgram};
pub use fitness::FitnessConfig;
pub use topology::TopologyConfig;
pub use specification::SpecificationConfig;
pub use traits::ConfigSection;
