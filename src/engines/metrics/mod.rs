pub mod record;
pub mod statistics;

pub use record::{GenerationRecord, JsonLinesSink, MemorySink, RoleRecord, StatisticsSink};
pub use statistics::Statistics;
