use super::evolution_engine::ProgressCallback;
use crate::engines::metrics::record::GenerationRecord;
use log::info;

/// Reports progress through the `log` facade.
pub struct LogProgressCallback;

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        info!("Generation {} starting...", generation);
    }

    fn on_competition_complete(&mut self, generation: usize, epochs: usize) {
        info!("  Generation {}: {} epochs played", generation, epochs);
    }

    fn on_generation_complete(&mut self, record: &GenerationRecord) {
        info!(
            "Generation {} complete. Antagonist {:.4} ({}), protagonist {:.4} ({})",
            record.generation,
            record.antagonist.average_fitness,
            record.antagonist.equation,
            record.protagonist.average_fitness,
            record.protagonist.equation,
        );
    }
}

/// Discards every event.
pub struct SilentProgressCallback;

impl ProgressCallback for SilentProgressCallback {
    fn on_generation_start(&mut self, _generation: usize) {}

    fn on_competition_complete(&mut self, _generation: usize, _epochs: usize) {}

    fn on_generation_complete(&mut self, _record: &GenerationRecord) {}
}

// For embedding hosts that watch a run from another thread
pub struct ChannelProgressCallback {
    sender: std::sync::mpsc::Sender<ProgressMessage>,
}

#[derive(Debug, Clone)]
pub enum ProgressMessage {
    GenerationStart(usize),
    CompetitionComplete { generation: usize, epochs: usize },
    GenerationComplete(Box<GenerationRecord>),
}

impl ChannelProgressCallback {
    pub fn new(sender: std::sync::mpsc::Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_competition_complete(&mut self, generation: usize, epochs: usize) {
        let _ = self
            .sender
            .send(ProgressMessage::CompetitionComplete { generation, epochs });
    }

    fn on_generation_complete(&mut self, record: &GenerationRecord) {
        let _ = self
            .sender
            .send(ProgressMessage::GenerationComplete(Box::new(record.clone())));
    }
}
