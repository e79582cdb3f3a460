use super::evolution_engine::{GenerationStats, ProgressCallback};

/// Reports through the `log` facade.
pub struct LogProgressCallback {
    label: String,
}

impl LogProgressCallback {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        log::trace!("[{}] generation {} starting", self.label, generation);
    }

    fn on_generation_complete(&mut self, stats: &GenerationStats) {
        log::debug!(
            "[{}] generation {}: best fitness {:.6} (raw {:.6}, {} nodes) mean {:.6} :: {}",
            self.label,
            stats.generation,
            stats.best_fitness,
            stats.best_raw_fitness,
            stats.best_complexity,
            stats.mean_fitness,
            stats.best_formula
        );
    }
}

pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_generation_start(&mut self, _generation: usize) {}
    fn on_generation_complete(&mut self, _stats: &GenerationStats) {}
}

// For hosts that run discovery on a worker thread
pub struct ChannelProgressCallback {
    sender: std::sync::mpsc::Sender<ProgressMessage>,
}

#[derive(Debug, Clone)]
pub enum ProgressMessage {
    GenerationStart(usize),
    GenerationComplete(GenerationStats),
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

    fn on_generation_complete(&mut self, stats: &GenerationStats) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete(stats.clone()));
    }
}
