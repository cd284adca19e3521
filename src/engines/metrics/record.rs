use crate::engines::generation::individual::Individual;
use crate::engines::generation::lifecycle::GenerationSummary;
use crate::engines::generation::strategy::Strategy;
use crate::engines::metrics::statistics::Statistics;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Per-role slice of a [`GenerationRecord`], describing the generation's best individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: u64,
    pub best_fitness: f64,
    pub best_delta: f64,
    pub average_fitness: f64,
    pub average_delta: f64,
    pub equation: String,
    pub dominant_strategy: Option<Strategy>,
    pub strategies: Vec<Strategy>,
    pub birth_generation: usize,
    pub age: usize,
    /// Population-wide moments and epoch delta.
    pub fitness: Statistics,
    pub mean_delta: f64,
}

impl RoleRecord {
    fn new(best: &Individual, fitness: Statistics, mean_delta: f64) -> Result<Self> {
        Ok(Self {
            id: best.id,
            best_fitness: best.best_fitness,
            best_delta: best.best_delta,
            average_fitness: best.average_fitness(),
            average_delta: best.average_delta(),
            equation: best.program.expression()?,
            dominant_strategy: best.dominant_strategy(),
            strategies: best.strategies.clone(),
            birth_generation: best.birth_generation,
            age: best.age,
            fitness,
            mean_delta,
        })
    }
}

/// Flat per-generation record handed to a [`StatisticsSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub epochs: usize,
    pub antagonist: RoleRecord,
    pub protagonist: RoleRecord,
    pub covariance: f64,
    pub correlation: f64,
}

impl GenerationRecord {
    pub fn from_summary(summary: &GenerationSummary) -> Result<Self> {
        Ok(Self {
            generation: summary.generation,
            epochs: summary.epochs,
            antagonist: RoleRecord::new(
                &summary.best_antagonist,
                summary.antagonist_fitness,
                summary.antagonist_delta,
            )?,
            protagonist: RoleRecord::new(
                &summary.best_protagonist,
                summary.protagonist_fitness,
                summary.protagonist_delta,
            )?,
            covariance: summary.covariance,
            correlation: summary.correlation,
        })
    }
}

pub trait StatisticsSink {
    fn write(&mut self, record: &GenerationRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One JSON object per line. Non-finite numbers are written as `null`.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StatisticsSink for JsonLinesSink<W> {
    fn write(&mut self, record: &GenerationRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<GenerationRecord>,
}

impl StatisticsSink for MemorySink {
    fn write(&mut self, record: &GenerationRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::program::Program;
    use crate::engines::generation::tree::DualTree;
    use crate::types::{Role, SymbolicExpression};

    fn summary() -> GenerationSummary {
        let mut antagonist = Individual::new(
            Role::Antagonist,
            Program::new(DualTree::leaf(SymbolicExpression::terminal("3"))),
            vec![Strategy::MutateTerminal, Strategy::MutateTerminal, Strategy::Skip],
            0,
        );
        antagonist.record(0.4, 3.0);
        let mut protagonist = Individual::new(
            Role::Protagonist,
            Program::new(DualTree::leaf(SymbolicExpression::terminal("x"))),
            vec![Strategy::Skip],
            0,
        );
        protagonist.record(-0.2, f64::INFINITY);

        GenerationSummary {
            generation: 2,
            epochs: 1,
            best_antagonist: antagonist,
            best_protagonist: protagonist,
            antagonist_fitness: Statistics::calculate(&[0.4]),
            protagonist_fitness: Statistics::calculate(&[-0.2]),
            antagonist_delta: 3.0,
            protagonist_delta: f64::INFINITY,
            covariance: 0.0,
            correlation: 0.0,
        }
    }

    #[test]
    fn test_record_from_summary() {
        let record = GenerationRecord::from_summary(&summary()).unwrap();
        assert_eq!(record.generation, 2);
        assert_eq!(record.antagonist.equation, "3");
        assert_eq!(record.antagonist.dominant_strategy, Some(Strategy::MutateTerminal));
        assert_eq!(record.protagonist.best_fitness, -0.2);
    }

    #[test]
    fn test_json_lines_sink() {
        let record = GenerationRecord::from_summary(&summary()).unwrap();
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.write(&record).unwrap();
        sink.write(&record).unwrap();
        sink.flush().unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["antagonist"]["equation"], "3");
        assert!(value["protagonist"]["best_delta"].is_null());
    }
}
